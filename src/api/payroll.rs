use std::collections::HashMap;

use crate::{
    api::{
        attendance::{fetch_attendance_for_month, fetch_month_attendance},
        dashboard::KpiCache,
        employee::{EMPLOYEE_COLUMNS, fetch_employee},
    },
    calc::{
        format::format_currency,
        period::{current_month, month_key, parse_month},
        report::{CategoryReport, PayrollTotals, aggregate_by_category, summarize_payroll},
        salary::{SalaryBreakdown, SalaryInput, compute_salary},
    },
    error::ApiError,
    model::{
        employee::Employee,
        payroll_config::{PayrollConfig, SharedPayrollConfig},
    },
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{error, info, warn};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthQuery {
    /// `YYYY-MM`; defaults to the current month
    #[param(example = "2025-06")]
    pub month: Option<String>,
}

impl MonthQuery {
    fn resolve(&self) -> Result<String, ApiError> {
        match self.month.as_deref() {
            Some(month) => Ok(month_key(parse_month(month)?)),
            None => Ok(month_key(current_month())),
        }
    }
}

/// Derived on request, never stored.
#[derive(Debug, Serialize, ToSchema)]
pub struct SalarySlip {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "Kasun Perera")]
    pub name: String,
    #[schema(example = "Logistics")]
    pub department: String,
    #[schema(example = "2025-06")]
    pub month: String,
    /// `None` when no attendance was recorded for the month
    pub working_days: Option<u32>,
    pub ot_hours: f64,
    pub overtime_rate: f64,
    pub currency: String,
    pub breakdown: SalaryBreakdown,
    #[schema(example = "LKR 121,250.00")]
    pub gross_salary_display: String,
    #[schema(example = "LKR 117,250.00")]
    pub net_salary_display: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PayrollSummary {
    #[schema(example = "2025-06")]
    pub month: String,
    pub currency: String,
    pub totals: PayrollTotals,
    /// Net salary per department
    pub by_department: CategoryReport,
    /// Employees whose stored figures could not be computed
    pub skipped: Vec<u64>,
}

/// Result of running payroll for every payable employee in a month.
pub(crate) struct PayrollRun {
    pub totals: PayrollTotals,
    pub by_department: CategoryReport,
    pub skipped: Vec<u64>,
}

pub(crate) fn read_config(config: &SharedPayrollConfig) -> Result<PayrollConfig, ApiError> {
    config
        .read()
        .map(|guard| guard.clone())
        .map_err(|_| ApiError::Internal("payroll config lock poisoned".into()))
}

pub(crate) async fn run_payroll(
    pool: &MySqlPool,
    config: &PayrollConfig,
    month: &str,
) -> Result<PayrollRun, ApiError> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id");
    let employees: Vec<Employee> = sqlx::query_as::<_, Employee>(&sql)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to load employees for payroll");
            ApiError::from(e)
        })?;

    let ot_hours: HashMap<u64, f64> = fetch_attendance_for_month(pool, month)
        .await
        .map_err(|e| {
            error!(error = %e, month, "Failed to load attendance for payroll");
            ApiError::from(e)
        })?
        .into_iter()
        .map(|record| (record.employee_id, record.ot_hours))
        .collect();

    let rates = config.rates();
    let mut slips: Vec<(String, SalaryBreakdown)> = Vec::new();
    let mut skipped = Vec::new();

    for employee in employees.iter().filter(|e| e.status.is_payable()) {
        let hours = ot_hours.get(&employee.id).copied().unwrap_or(0.0);
        match compute_salary(&config.salary_input(employee.basic_salary, hours), &rates) {
            Ok(slip) => slips.push((employee.department.clone(), slip)),
            Err(e) => {
                warn!(employee_id = employee.id, error = %e, "Skipping employee in payroll run");
                skipped.push(employee.id);
            }
        }
    }

    let totals = summarize_payroll(slips.iter().map(|(_, slip)| slip));
    let by_department = aggregate_by_category(
        &slips,
        |(department, _)| department.clone(),
        |(_, slip)| slip.net_salary,
    )
    .sorted_by_total();

    Ok(PayrollRun {
        totals,
        by_department,
        skipped,
    })
}

#[utoipa::path(
    get,
    path = "/api/salary-slip/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        MonthQuery
    ),
    responses(
        (status = 200, body = SalarySlip),
        (status = 400, description = "Invalid month or stored salary"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Payroll"
)]
pub async fn salary_slip(
    pool: web::Data<MySqlPool>,
    config: web::Data<SharedPayrollConfig>,
    path: web::Path<u64>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();
    let month = query.resolve()?;
    let config = read_config(&config)?;

    let employee = fetch_employee(pool.get_ref(), employee_id)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch employee");
            ApiError::from(e)
        })?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))?;

    let attendance = fetch_month_attendance(pool.get_ref(), employee_id, &month)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, %month, "Failed to fetch attendance");
            ApiError::from(e)
        })?;

    let ot_hours = attendance.as_ref().map(|a| a.ot_hours).unwrap_or(0.0);
    let breakdown = compute_salary(
        &config.salary_input(employee.basic_salary, ot_hours),
        &config.rates(),
    )?;

    Ok(HttpResponse::Ok().json(SalarySlip {
        employee_id,
        employee_code: employee.employee_code,
        name: employee.name,
        department: employee.department,
        month,
        working_days: attendance.as_ref().map(|a| a.working_days),
        ot_hours,
        overtime_rate: config.overtime_rate(employee.basic_salary),
        gross_salary_display: format_currency(breakdown.gross_salary, &config.currency),
        net_salary_display: format_currency(breakdown.net_salary, &config.currency),
        currency: config.currency,
        breakdown,
    }))
}

/// Stateless calculator using the current contribution rates.
#[utoipa::path(
    post,
    path = "/api/salary/calculate",
    request_body = SalaryInput,
    responses(
        (status = 200, body = SalaryBreakdown),
        (status = 400, description = "Negative or non-numeric amount")
    ),
    tag = "Payroll"
)]
pub async fn calculate_salary(
    config: web::Data<SharedPayrollConfig>,
    payload: web::Json<SalaryInput>,
) -> Result<HttpResponse, ApiError> {
    let rates = read_config(&config)?.rates();
    let breakdown = compute_salary(&payload, &rates)?;
    Ok(HttpResponse::Ok().json(breakdown))
}

#[utoipa::path(
    get,
    path = "/api/payroll/summary",
    params(MonthQuery),
    responses(
        (status = 200, body = PayrollSummary),
        (status = 400, description = "Invalid month")
    ),
    tag = "Payroll"
)]
pub async fn payroll_summary(
    pool: web::Data<MySqlPool>,
    config: web::Data<SharedPayrollConfig>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ApiError> {
    let month = query.resolve()?;
    let config = read_config(&config)?;

    let run = run_payroll(pool.get_ref(), &config, &month).await?;

    Ok(HttpResponse::Ok().json(PayrollSummary {
        month,
        currency: config.currency,
        totals: run.totals,
        by_department: run.by_department,
        skipped: run.skipped,
    }))
}

#[utoipa::path(
    get,
    path = "/api/payroll-config",
    responses(
        (status = 200, body = PayrollConfig)
    ),
    tag = "Payroll"
)]
pub async fn get_payroll_config(
    config: web::Data<SharedPayrollConfig>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(read_config(&config)?))
}

/// Replaces the in-memory payroll settings. Not persisted across restarts.
#[utoipa::path(
    put,
    path = "/api/payroll-config",
    request_body = PayrollConfig,
    responses(
        (status = 200, body = PayrollConfig),
        (status = 400, description = "Rate outside 0..=1, non-positive hours or bad allowance")
    ),
    tag = "Payroll"
)]
pub async fn update_payroll_config(
    config: web::Data<SharedPayrollConfig>,
    kpi_cache: Option<web::Data<KpiCache>>,
    payload: web::Json<PayrollConfig>,
) -> Result<HttpResponse, ApiError> {
    let new_config = payload.into_inner();
    new_config.validate()?;

    {
        let mut guard = config
            .write()
            .map_err(|_| ApiError::Internal("payroll config lock poisoned".into()))?;
        *guard = new_config.clone();
    }

    // Cached payroll KPIs were computed with the old rates.
    if let Some(cache) = kpi_cache {
        cache.invalidate_all().await;
    }

    info!(
        epf_employee_rate = new_config.epf_employee_rate,
        overtime_multiplier = new_config.overtime_multiplier,
        allowances = new_config.allowances.len(),
        "Payroll config updated"
    );

    Ok(HttpResponse::Ok().json(new_config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{
        App,
        http::StatusCode,
        test::{TestRequest, call_and_read_body_json, call_service, init_service},
        web::Data,
    };
    use serde_json::json;
    use std::sync::RwLock;

    fn config_data() -> Data<SharedPayrollConfig> {
        Data::new(RwLock::new(PayrollConfig::default()))
    }

    #[actix_web::test]
    async fn calculator_returns_breakdown() {
        let app = init_service(
            App::new()
                .app_data(config_data())
                .route("/salary/calculate", web::post().to(calculate_salary)),
        )
        .await;

        let req = TestRequest::post()
            .uri("/salary/calculate")
            .set_json(json!({
                "basic_salary": 50000,
                "allowances": [
                    {"name": "Housing", "amount": 25000},
                    {"name": "Transport", "amount": 6000},
                    {"name": "Meal", "amount": 3500},
                    {"name": "Medical", "amount": 8000}
                ],
                "overtime_amount": 18750,
                "bonus": 10000
            }))
            .to_request();

        let body: SalaryBreakdown = call_and_read_body_json(&app, req).await;
        assert_eq!(body.gross_salary, 121250.0);
        assert_eq!(body.epf_employee, 4000.0);
        assert_eq!(body.net_salary, 117250.0);
    }

    #[actix_web::test]
    async fn calculator_rejects_negative_bonus() {
        let app = init_service(
            App::new()
                .app_data(config_data())
                .route("/salary/calculate", web::post().to(calculate_salary)),
        )
        .await;

        let req = TestRequest::post()
            .uri("/salary/calculate")
            .set_json(json!({"basic_salary": 1000, "bonus": -5}))
            .to_request();

        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn config_update_changes_calculation() {
        let config = config_data();
        let app = init_service(
            App::new()
                .app_data(config.clone())
                .route("/payroll-config", web::get().to(get_payroll_config))
                .route("/payroll-config", web::put().to(update_payroll_config))
                .route("/salary/calculate", web::post().to(calculate_salary)),
        )
        .await;

        let updated = PayrollConfig {
            epf_employee_rate: 0.1,
            ..PayrollConfig::default()
        };
        let req = TestRequest::put()
            .uri("/payroll-config")
            .set_json(&updated)
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = TestRequest::get().uri("/payroll-config").to_request();
        let current: PayrollConfig = call_and_read_body_json(&app, req).await;
        assert_eq!(current, updated);

        let req = TestRequest::post()
            .uri("/salary/calculate")
            .set_json(json!({"basic_salary": 50000}))
            .to_request();
        let body: SalaryBreakdown = call_and_read_body_json(&app, req).await;
        assert_eq!(body.epf_employee, 5000.0);
    }

    #[actix_web::test]
    async fn invalid_config_is_rejected_and_kept() {
        let config = config_data();
        let app = init_service(
            App::new()
                .app_data(config.clone())
                .route("/payroll-config", web::put().to(update_payroll_config)),
        )
        .await;

        let bad = PayrollConfig {
            standard_monthly_hours: 0.0,
            ..PayrollConfig::default()
        };
        let req = TestRequest::put()
            .uri("/payroll-config")
            .set_json(&bad)
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(*config.read().unwrap(), PayrollConfig::default());
    }

    #[test]
    fn month_query_resolves() {
        let query = MonthQuery {
            month: Some("2025-06".into()),
        };
        assert_eq!(query.resolve().unwrap(), "2025-06");

        let bad = MonthQuery {
            month: Some("June".into()),
        };
        assert!(bad.resolve().is_err());

        assert_eq!(MonthQuery { month: None }.resolve().unwrap().len(), 7);
    }
}
