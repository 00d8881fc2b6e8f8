pub mod attendance;
pub mod employee;
pub mod liquidation;
pub mod payroll;
pub mod role;
