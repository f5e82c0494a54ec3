use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::calc::list_query::{Listable, SortValue};

/// Approval status. Any status may be set from any other.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum ExpenseStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl TryFrom<String> for ExpenseStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 3,
        "category": "Fuel",
        "description": "Collection lorry diesel, Kurunegala route",
        "date": "2025-06-12",
        "amount": 18500.0,
        "status": "Approved"
    })
)]
pub struct Expense {
    pub id: u64,
    pub category: String,
    pub description: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub amount: f64,
    #[sqlx(try_from = "String")]
    pub status: ExpenseStatus,
}

impl Listable for Expense {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.category.as_str(), self.description.as_str()]
    }

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "date" => Some(SortValue::Date(self.date)),
            "amount" => Some(SortValue::Number(self.amount)),
            "category" => Some(SortValue::Text(self.category.clone())),
            "description" => Some(SortValue::Text(self.description.clone())),
            "status" => Some(SortValue::Text(self.status.to_string())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::list_query::{ListQuery, SortDirection, apply};

    fn expense(id: u64, category: &str, description: &str, day: u32, amount: f64) -> Expense {
        Expense {
            id,
            category: category.to_string(),
            description: description.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            amount,
            status: ExpenseStatus::Pending,
        }
    }

    #[test]
    fn search_and_sort_expenses() {
        let expenses = vec![
            expense(1, "Fuel", "Lorry diesel", 3, 18500.0),
            expense(2, "Utilities", "Chilling centre electricity", 5, 42000.0),
            expense(3, "Fuel", "Generator diesel", 1, 7000.0),
        ];

        let query = ListQuery {
            search: Some("DIESEL".to_string()),
            sort_by: Some("date".to_string()),
            direction: SortDirection::Desc,
        };
        let ids: Vec<_> = apply(&expenses, &query).iter().map(|e| e.id).collect();
        assert_eq!(ids, [1, 3]);
    }

    #[test]
    fn status_defaults_to_pending() {
        assert_eq!(ExpenseStatus::default(), ExpenseStatus::Pending);
        assert_eq!("approved".parse::<ExpenseStatus>().unwrap(), ExpenseStatus::Approved);
    }
}
