//! Pure payroll and reporting arithmetic shared by every endpoint.
//!
//! Nothing in here touches the database; handlers fetch rows and hand them
//! to these functions so that the salary and report figures have a single
//! source of truth.

pub mod format;
pub mod list_query;
pub mod period;
pub mod report;
pub mod salary;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    #[error("{field} must be a non-negative amount, got {value}")]
    InvalidAmount { field: String, value: f64 },

    #[error("{field} must be a rate between 0 and 1, got {value}")]
    InvalidRate { field: String, value: f64 },

    #[error("invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),

    #[error("{0}")]
    InvalidConfig(String),
}

/// Accepts finite, non-negative money values.
pub(crate) fn ensure_amount(field: impl Into<String>, value: f64) -> Result<f64, CalcError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CalcError::InvalidAmount {
            field: field.into(),
            value,
        })
    }
}

pub(crate) fn ensure_rate(field: impl Into<String>, value: f64) -> Result<f64, CalcError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(CalcError::InvalidRate {
            field: field.into(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_and_nan_amounts() {
        assert_eq!(ensure_amount("bonus", 10.0), Ok(10.0));
        assert!(ensure_amount("bonus", -0.01).is_err());
        assert!(ensure_amount("bonus", f64::NAN).is_err());
        assert!(ensure_amount("bonus", f64::INFINITY).is_err());
    }

    #[test]
    fn rate_bounds_are_inclusive() {
        assert_eq!(ensure_rate("epf", 0.0), Ok(0.0));
        assert_eq!(ensure_rate("epf", 1.0), Ok(1.0));
        assert_eq!(
            ensure_rate("epf", 8.0),
            Err(CalcError::InvalidRate {
                field: "epf".to_string(),
                value: 8.0
            })
        );
    }
}
