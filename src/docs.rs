use crate::api::dashboard::DashboardKpis;
use crate::api::employee::{AvailabilityResponse, CreateEmployee, UpdateEmployee};
use crate::api::expense::{CreateExpense, ExpenseReport, UpdateExpense};
use crate::api::payroll::{PayrollSummary, SalarySlip};
use crate::api::raw_material::{CreateRawMaterial, UpdateRawMaterial};
use crate::api::attendance::{CreateAttendance, UpdateAttendance};
use crate::calc::list_query::{
    AttendancePage, EmployeePage, ExpensePage, RawMaterialPage, SortDirection,
};
use crate::calc::report::{CategoryReport, CategoryTotal, MonthTotal, PayrollTotals};
use crate::calc::salary::{Allowance, ContributionRates, Deduction, SalaryBreakdown, SalaryInput};
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::{Employee, EmployeeStatus};
use crate::model::expense::{Expense, ExpenseStatus};
use crate::model::payroll_config::PayrollConfig;
use crate::model::raw_material::RawMaterial;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Business Dashboard API",
        version = "0.1.0",
        description = r#"
## Business Dashboard

Backend for the finance, HR and inventory dashboards of a milk-collection business.

### Key Features
- **Employees**: profiles, status tracking and NIC/email availability checks
- **Attendance**: monthly working days and overtime hours per employee
- **Payroll**: salary slips, a stateless salary calculator, monthly payroll summaries
  and the global EPF/ETF and overtime settings
- **Expenses**: expense records and category/month reports
- **Inventory**: raw materials with reorder levels
- **Dashboard**: cached headline KPIs

### Response Format
- JSON in and out; errors are `{"message": "..."}`
- List endpoints return `{data, page, per_page, total}`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::check_availability,

        crate::api::attendance::create_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::get_attendance,
        crate::api::attendance::update_attendance,
        crate::api::attendance::delete_attendance,

        crate::api::payroll::salary_slip,
        crate::api::payroll::calculate_salary,
        crate::api::payroll::payroll_summary,
        crate::api::payroll::get_payroll_config,
        crate::api::payroll::update_payroll_config,

        crate::api::expense::create_expense,
        crate::api::expense::list_expenses,
        crate::api::expense::expense_report,
        crate::api::expense::get_expense,
        crate::api::expense::update_expense,
        crate::api::expense::delete_expense,

        crate::api::raw_material::create_raw_material,
        crate::api::raw_material::list_raw_materials,
        crate::api::raw_material::get_raw_material,
        crate::api::raw_material::update_raw_material,
        crate::api::raw_material::delete_raw_material,

        crate::api::dashboard::dashboard_kpis
    ),
    components(
        schemas(
            Employee,
            EmployeeStatus,
            EmployeePage,
            CreateEmployee,
            UpdateEmployee,
            AvailabilityResponse,
            AttendanceRecord,
            AttendancePage,
            CreateAttendance,
            UpdateAttendance,
            SalaryInput,
            SalaryBreakdown,
            Allowance,
            Deduction,
            ContributionRates,
            SalarySlip,
            PayrollSummary,
            PayrollTotals,
            PayrollConfig,
            CategoryReport,
            CategoryTotal,
            MonthTotal,
            Expense,
            ExpenseStatus,
            ExpensePage,
            CreateExpense,
            UpdateExpense,
            ExpenseReport,
            RawMaterial,
            RawMaterialPage,
            CreateRawMaterial,
            UpdateRawMaterial,
            DashboardKpis,
            SortDirection
        )
    ),
    tags(
        (name = "Employee", description = "Employee management APIs"),
        (name = "Attendance", description = "Monthly attendance APIs"),
        (name = "Payroll", description = "Salary slips, calculator and payroll settings"),
        (name = "Expense", description = "Expense records and reports"),
        (name = "Inventory", description = "Raw material stock APIs"),
        (name = "Dashboard", description = "Headline KPIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/api/employees",
            "/api/employees/availability",
            "/api/attendance/{attendance_id}",
            "/api/salary-slip/{employee_id}",
            "/api/payroll-config",
            "/api/expenses/report",
            "/api/raw-materials",
            "/api/dashboard/kpis",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }

        let schemas = &doc.components.expect("components").schemas;
        assert!(schemas.contains_key("EmployeePage"));
        assert!(schemas.contains_key("SalaryBreakdown"));
    }
}
