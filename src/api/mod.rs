pub mod attendance;
pub mod dashboard;
pub mod employee;
pub mod expense;
pub mod payroll;
pub mod raw_material;
