use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::model::{
    attendance::AttendanceRecord, employee::Employee, expense::Expense,
    raw_material::RawMaterial,
};

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl SortValue {
    /// Text compares case-insensitively. Mixed variants compare equal so a
    /// stable sort leaves them where they were.
    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Anything that can be shown in a searchable, sortable list.
pub trait Listable {
    /// Fields matched by the free-text search box.
    fn search_fields(&self) -> Vec<&str>;

    /// Value used when sorting by `field`; `None` for unknown or empty fields.
    fn sort_value(&self, field: &str) -> Option<SortValue>;
}

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub direction: SortDirection,
}

pub fn matches<T: Listable>(item: &T, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    item.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

pub fn filter_items<T: Listable + Clone>(items: &[T], search: Option<&str>) -> Vec<T> {
    match search {
        Some(needle) => items.iter().filter(|i| matches(*i, needle)).cloned().collect(),
        None => items.to_vec(),
    }
}

/// Stable sort. Items without a value for `field` go last in either direction.
pub fn sort_items<T: Listable>(items: &mut [T], field: &str, direction: SortDirection) {
    items.sort_by(|a, b| match (a.sort_value(field), b.sort_value(field)) {
        (Some(x), Some(y)) => {
            let ord = x.compare(&y);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

pub fn apply<T: Listable + Clone>(items: &[T], query: &ListQuery) -> Vec<T> {
    let mut out = filter_items(items, query.search.as_deref());
    if let Some(field) = query.sort_by.as_deref() {
        sort_items(&mut out, field, query.direction);
    }
    out
}

#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    EmployeePage = Page<Employee>,
    AttendancePage = Page<AttendanceRecord>,
    ExpensePage = Page<Expense>,
    RawMaterialPage = Page<RawMaterial>
)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

/// Clamps `page` to >= 1 and `per_page` to 1..=100, returning
/// `(page, per_page, offset)`.
pub fn page_window(page: Option<u32>, per_page: Option<u32>) -> (u32, u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    (page, per_page, (page - 1).saturating_mul(per_page))
}

pub fn paginate<T>(items: Vec<T>, page: Option<u32>, per_page: Option<u32>) -> Page<T> {
    let (page, per_page, offset) = page_window(page, per_page);
    let total = items.len() as i64;
    let data = items
        .into_iter()
        .skip(offset as usize)
        .take(per_page as usize)
        .collect();

    Page {
        data,
        page,
        per_page,
        total,
    }
}
