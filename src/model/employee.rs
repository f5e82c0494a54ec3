use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum EmployeeStatus {
    Active,
    Inactive,
    Resigned,
    Terminated,
    #[serde(rename = "On Probation")]
    #[strum(serialize = "On Probation")]
    OnProbation,
    #[serde(rename = "On Leave")]
    #[strum(serialize = "On Leave")]
    OnLeave,
}

impl EmployeeStatus {
    /// Still on the books and therefore included in a payroll run.
    pub fn is_payable(self) -> bool {
        matches!(
            self,
            EmployeeStatus::Active | EmployeeStatus::OnProbation | EmployeeStatus::OnLeave
        )
    }
}

impl TryFrom<String> for EmployeeStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "name": "Kasun Perera",
        "nic": "199012345678",
        "email": "kasun.perera@company.lk",
        "phone": "+94771234567",
        "role": "Collection Supervisor",
        "department": "Logistics",
        "status": "Active",
        "basic_salary": 50000.0,
        "join_date": "2022-04-01",
        "birth_date": "1990-05-14"
    })
)]
pub struct Employee {
    pub id: u64,
    pub employee_code: String,
    pub name: String,
    pub nic: String,
    pub email: String,
    #[schema(nullable = true)]
    pub phone: Option<String>,
    pub role: String,
    pub department: String,
    #[sqlx(try_from = "String")]
    pub status: EmployeeStatus,
    pub basic_salary: f64,
    #[schema(value_type = String, format = "date")]
    pub join_date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date", nullable = true)]
    pub birth_date: Option<NaiveDate>,
}
