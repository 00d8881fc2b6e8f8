//! Workflows that combine the calculation core with a `PayrollStore`.

pub mod liquidation_service;
pub mod payroll_batch;
pub mod payroll_service;
