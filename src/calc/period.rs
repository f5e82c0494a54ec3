use chrono::{Datelike, Local, Months, NaiveDate};

use super::CalcError;

/// Parses a `YYYY-MM` month key into the first day of that month.
pub fn parse_month(month: &str) -> Result<NaiveDate, CalcError> {
    let month = month.trim();
    if month.len() != 7 {
        return Err(CalcError::InvalidMonth(month.to_string()));
    }

    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map_err(|_| CalcError::InvalidMonth(month.to_string()))
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Half-open `[first, first_of_next)` range for the month containing `date`.
pub fn month_range(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = first_of_month(date);
    let next = first
        .checked_add_months(Months::new(1))
        .unwrap_or(NaiveDate::MAX);
    (first, next)
}

pub fn previous_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    first.checked_sub_months(Months::new(1)).unwrap_or(first)
}

pub fn current_month() -> NaiveDate {
    first_of_month(Local::now().date_naive())
}
