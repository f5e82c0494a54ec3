use crate::{
    api::employee::fetch_employee,
    calc::{
        list_query::{Page, page_window},
        period::{month_key, parse_month},
    },
    error::ApiError,
    model::attendance::{AttendanceRecord, validate_attendance},
    utils::db_utils::{
        SqlUpdate, UpdateBuilder, WhereBuilder, bind_values, execute_update, non_null,
        parse_patch,
    },
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

const ATTENDANCE_COLUMNS: &str = "id, employee_id, month, working_days, ot_hours";

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateAttendance {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "2025-06")]
    pub month: String,
    #[schema(example = 22)]
    pub working_days: u32,
    #[schema(example = 60.0)]
    #[serde(default)]
    pub ot_hours: f64,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateAttendance {
    #[serde(default, deserialize_with = "non_null")]
    #[schema(example = "2025-06")]
    pub month: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    #[schema(example = 21)]
    pub working_days: Option<u32>,
    #[serde(default, deserialize_with = "non_null")]
    #[schema(example = 12.5)]
    pub ot_hours: Option<f64>,
}

impl UpdateAttendance {
    fn into_update(self, attendance_id: u64) -> Result<SqlUpdate, ApiError> {
        validate_attendance(self.month.as_deref(), self.working_days, self.ot_hours)?;

        let month = match self.month.as_deref() {
            Some(month) => Some(canonical_month(month)?),
            None => None,
        };

        let mut set = UpdateBuilder::default();
        set.set_if("month", month)
            .set_if("working_days", self.working_days)
            .set_if("ot_hours", self.ot_hours);
        set.build("attendance", "id", attendance_id)
    }
}

/// `" 2025-06 "` -> `"2025-06"`, the form payroll lookups use.
fn canonical_month(month: &str) -> Result<String, ApiError> {
    Ok(month_key(parse_month(month)?))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    #[param(example = 1)]
    pub employee_id: Option<u64>,
    #[param(example = "2025-06")]
    pub month: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Attendance summary of one employee for one month, if recorded.
pub(crate) async fn fetch_month_attendance(
    pool: &MySqlPool,
    employee_id: u64,
    month: &str,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    let sql =
        format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND month = ?");
    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(employee_id)
        .bind(month)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn fetch_attendance_for_month(
    pool: &MySqlPool,
    month: &str,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE month = ?");
    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(month)
        .fetch_all(pool)
        .await
}

#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = CreateAttendance,
    responses(
        (status = 201, description = "Attendance recorded", body = Object, example = json!({
            "message": "Attendance recorded",
            "id": 7
        })),
        (status = 400, description = "Invalid month, day count or OT hours"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Attendance already recorded for that month", body = Object, example = json!({
            "message": "Attendance already recorded for this employee and month"
        }))
    ),
    tag = "Attendance"
)]
pub async fn create_attendance(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAttendance>,
) -> Result<HttpResponse, ApiError> {
    validate_attendance(
        Some(payload.month.as_str()),
        Some(payload.working_days),
        Some(payload.ot_hours),
    )?;

    if fetch_employee(pool.get_ref(), payload.employee_id).await?.is_none() {
        return Err(ApiError::NotFound("Employee not found".into()));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (employee_id, month, working_days, ot_hours)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(canonical_month(&payload.month)?)
    .bind(payload.working_days)
    .bind(payload.ot_hours)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id = payload.employee_id, "Failed to record attendance");
        ApiError::from_write(e, "Attendance already recorded for this employee and month")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Attendance recorded",
        "id": result.last_insert_id()
    })))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendancePage),
        (status = 400, description = "Invalid month")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, ApiError> {
    validate_attendance(query.month.as_deref(), None, None)?;
    let (page, per_page, offset) = page_window(query.page, query.per_page);

    let mut filters = WhereBuilder::default();
    filters
        .push_if("employee_id = ?", query.employee_id)
        .push_if(
            "month = ?",
            query.month.as_deref().map(canonical_month).transpose()?,
        );
    let where_clause = filters.to_sql();

    let count_sql = format!("SELECT COUNT(*) FROM attendance{where_clause}");
    let total = bind_values!(sqlx::query_scalar::<_, i64>(&count_sql), filters.values)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to count attendance");
            ApiError::from(e)
        })?;

    let data_sql = format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance{where_clause} \
         ORDER BY month DESC, employee_id ASC LIMIT ? OFFSET ?"
    );
    let data = bind_values!(sqlx::query_as::<_, AttendanceRecord>(&data_sql), filters.values)
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch attendance list");
            ApiError::from(e)
        })?;

    Ok(HttpResponse::Ok().json(Page {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/attendance/{attendance_id}",
    params(
        ("attendance_id" = u64, Path, description = "Attendance record ID")
    ),
    responses(
        (status = 200, body = AttendanceRecord),
        (status = 404, description = "Attendance record not found")
    ),
    tag = "Attendance"
)]
pub async fn get_attendance(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let attendance_id = path.into_inner();

    let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?");
    let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(attendance_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, attendance_id, "Failed to fetch attendance");
            ApiError::from(e)
        })?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".into()))?;

    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    put,
    path = "/api/attendance/{attendance_id}",
    request_body = UpdateAttendance,
    params(
        ("attendance_id" = u64, Path, description = "Attendance record ID")
    ),
    responses(
        (status = 200, description = "Attendance updated"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Attendance record not found"),
        (status = 409, description = "Another record already covers that month")
    ),
    tag = "Attendance"
)]
pub async fn update_attendance(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let attendance_id = path.into_inner();

    let update = parse_patch::<UpdateAttendance>(body.into_inner())?.into_update(attendance_id)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, attendance_id, "Failed to update attendance");
        ApiError::from_write(e, "Attendance already recorded for this employee and month")
    })?;

    if affected == 0 {
        return Err(ApiError::NotFound("Attendance record not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance updated successfully"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/attendance/{attendance_id}",
    params(
        ("attendance_id" = u64, Path, description = "Attendance record ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Attendance record not found")
    ),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let attendance_id = path.into_inner();

    let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
        .bind(attendance_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, attendance_id, "Failed to delete attendance");
            ApiError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Attendance record not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}
