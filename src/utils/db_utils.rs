use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use sqlx::MySqlPool;

use crate::error::ApiError;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    F64(f64),
    Date(NaiveDate),
    Null,
}

/// Binds every value in order onto a `query`, `query_as` or `query_scalar`.
macro_rules! bind_values {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for value in $values.iter().cloned() {
            query = match value {
                $crate::utils::db_utils::SqlValue::String(v) => query.bind(v),
                $crate::utils::db_utils::SqlValue::U64(v) => query.bind(v),
                $crate::utils::db_utils::SqlValue::F64(v) => query.bind(v),
                $crate::utils::db_utils::SqlValue::Date(v) => query.bind(v),
                $crate::utils::db_utils::SqlValue::Null => query.bind(None::<String>),
            };
        }
        query
    }};
}
pub(crate) use bind_values;

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// `WHERE a = ? AND b = ?` built up from optional filters.
#[derive(Debug, Default)]
pub struct WhereBuilder {
    conditions: Vec<String>,
    pub values: Vec<SqlValue>,
}

impl WhereBuilder {
    pub fn push(&mut self, condition: &str, value: SqlValue) -> &mut Self {
        self.push_many(condition, vec![value])
    }

    /// For conditions with several placeholders, e.g. `(a LIKE ? OR b LIKE ?)`.
    pub fn push_many(&mut self, condition: &str, values: Vec<SqlValue>) -> &mut Self {
        self.conditions.push(condition.to_string());
        self.values.extend(values);
        self
    }

    pub fn push_if<T>(&mut self, condition: &str, value: Option<T>) -> &mut Self
    where
        T: Into<SqlValue>,
    {
        if let Some(value) = value {
            self.push(condition, value.into());
        }
        self
    }

    pub fn to_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(v.to_string())
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::U64(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::U64(v.into())
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

/// `%term%` with LIKE wildcards in `term` escaped.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.trim().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// `UPDATE ... SET a = ?, b = ?` built up from the fields a patch carries.
///
/// Columns are always code-supplied names, values are always bound.
#[derive(Debug, Default)]
pub struct UpdateBuilder {
    assignments: Vec<&'static str>,
    values: Vec<SqlValue>,
}

impl UpdateBuilder {
    pub fn set_if<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: Into<SqlValue>,
    {
        if let Some(value) = value {
            self.assignments.push(column);
            self.values.push(value.into());
        }
        self
    }

    /// `Some(None)` writes NULL; `None` leaves the column untouched.
    pub fn set_nullable<T>(&mut self, column: &'static str, value: Option<Option<T>>) -> &mut Self
    where
        T: Into<SqlValue>,
    {
        if let Some(value) = value {
            self.assignments.push(column);
            self.values.push(value.map_or(SqlValue::Null, Into::into));
        }
        self
    }

    pub fn build(self, table: &str, id_column: &str, id_value: u64) -> Result<SqlUpdate, ApiError> {
        if self.assignments.is_empty() {
            return Err(ApiError::BadRequest("No fields provided for update".into()));
        }

        let set_clause = self
            .assignments
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut values = self.values;
        values.push(SqlValue::U64(id_value));

        Ok(SqlUpdate {
            sql: format!("UPDATE {table} SET {set_clause} WHERE {id_column} = ?"),
            values,
        })
    }
}

/// For `Option<T>` patch fields on NOT NULL columns: absent stays `None`,
/// an explicit `null` is a deserialization error.
pub fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// For `Option<Option<T>>` patch fields on nullable columns: absent is
/// `None`, `null` is `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Parses a JSON patch body, reporting type errors and explicit nulls on
/// required fields as 400s.
pub fn parse_patch<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let query = bind_values!(sqlx::query(&update.sql), update.values);
    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Patch {
        #[serde(default, deserialize_with = "non_null")]
        name: Option<String>,
        #[serde(default, deserialize_with = "non_null")]
        quantity: Option<f64>,
        #[serde(default, deserialize_with = "nullable")]
        supplier: Option<Option<String>>,
    }

    fn update_for(patch: Patch) -> Result<SqlUpdate, ApiError> {
        let mut set = UpdateBuilder::default();
        set.set_if("name", patch.name)
            .set_if("quantity", patch.quantity)
            .set_nullable("supplier", patch.supplier);
        set.build("raw_materials", "id", 9)
    }

    #[test]
    fn test_update_builder() {
        let patch: Patch =
            parse_patch(json!({"name": "Rennet", "quantity": 12.5, "supplier": null})).unwrap();
        let update = update_for(patch).unwrap();

        assert_eq!(
            update.sql,
            "UPDATE raw_materials SET name = ?, quantity = ?, supplier = ? WHERE id = ?"
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::String("Rennet".into()),
                SqlValue::F64(12.5),
                SqlValue::Null,
                SqlValue::U64(9),
            ]
        );
    }

    #[test]
    fn test_absent_fields_are_skipped() {
        let patch: Patch = parse_patch(json!({"quantity": 3})).unwrap();
        let update = update_for(patch).unwrap();
        assert_eq!(update.sql, "UPDATE raw_materials SET quantity = ? WHERE id = ?");
        assert_eq!(update.values, vec![SqlValue::F64(3.0), SqlValue::U64(9)]);
    }

    #[test]
    fn test_null_on_required_field_is_rejected() {
        let err = parse_patch::<Patch>(json!({"quantity": null})).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = parse_patch::<Patch>(json!({"id": 1})).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_empty_patch_is_rejected() {
        let patch: Patch = parse_patch(json!({})).unwrap();
        assert!(matches!(update_for(patch), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" kasun "), "%kasun%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_where_builder() {
        let mut filters = WhereBuilder::default();
        assert_eq!(filters.to_sql(), "");

        filters
            .push_if("category = ?", Some("Fuel"))
            .push_if::<u64>("employee_id = ?", None)
            .push_if("amount >= ?", Some(100.0));
        assert_eq!(filters.to_sql(), " WHERE category = ? AND amount >= ?");
        assert_eq!(filters.values.len(), 2);

        filters.push_many(
            "(name LIKE ? OR nic LIKE ?)",
            vec![SqlValue::from("%ka%"), SqlValue::from("%ka%")],
        );
        assert!(filters.to_sql().ends_with(" AND (name LIKE ? OR nic LIKE ?)"));
        assert_eq!(filters.values.len(), 4);
    }
}
