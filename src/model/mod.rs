pub mod attendance;
pub mod employee;
pub mod expense;
pub mod payroll_config;
pub mod raw_material;
