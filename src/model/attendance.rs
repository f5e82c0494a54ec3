use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::calc::{CalcError, ensure_amount, period::parse_month};

pub const MAX_WORKING_DAYS: u32 = 31;

/// Monthly attendance summary, one row per employee and month.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "2025-06")]
    pub month: String,
    #[schema(example = 22)]
    pub working_days: u32,
    #[schema(example = 60.0)]
    pub ot_hours: f64,
}

/// Checks the fields shared by create and update payloads.
pub fn validate_attendance(
    month: Option<&str>,
    working_days: Option<u32>,
    ot_hours: Option<f64>,
) -> Result<(), CalcError> {
    if let Some(month) = month {
        parse_month(month)?;
    }
    if let Some(days) = working_days {
        if days > MAX_WORKING_DAYS {
            return Err(CalcError::InvalidAmount {
                field: "working_days".to_string(),
                value: days as f64,
            });
        }
    }
    if let Some(hours) = ot_hours {
        ensure_amount("ot_hours", hours)?;
    }
    Ok(())
}
