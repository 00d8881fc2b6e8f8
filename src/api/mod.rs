pub mod error;
pub mod liquidation;
pub mod payroll;
