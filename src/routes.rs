use crate::api::{attendance, dashboard, employee, expense, payroll, raw_material};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, Responder, get, web};
use anyhow::{Result, anyhow};
use serde_json::json;
use std::sync::Arc;

pub type ApiLimiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-peer-IP limiter allowing `requests_per_min` with the same burst.
pub fn build_limiter(requests_per_min: u32) -> Result<ApiLimiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {requests_per_min} requests/min"))?;
    Ok(Governor::new(&cfg))
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiter: Arc<ApiLimiter>) {
    cfg.service(health);

    cfg.service(
        web::scope(api_prefix)
            .wrap(limiter) // rate limiting
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/availability, registered before /{id}
                    .service(
                        web::resource("/availability")
                            .route(web::get().to(employee::check_availability)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("")
                            .route(web::post().to(attendance::create_attendance))
                            .route(web::get().to(attendance::list_attendance)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(attendance::update_attendance))
                            .route(web::get().to(attendance::get_attendance))
                            .route(web::delete().to(attendance::delete_attendance)),
                    ),
            )
            // payroll
            .route(
                "/salary-slip/{employee_id}",
                web::get().to(payroll::salary_slip),
            )
            .route(
                "/salary/calculate",
                web::post().to(payroll::calculate_salary),
            )
            .route("/payroll/summary", web::get().to(payroll::payroll_summary))
            .service(
                web::resource("/payroll-config")
                    .route(web::get().to(payroll::get_payroll_config))
                    .route(web::put().to(payroll::update_payroll_config)),
            )
            .service(
                web::scope("/expenses")
                    .service(
                        web::resource("")
                            .route(web::post().to(expense::create_expense))
                            .route(web::get().to(expense::list_expenses)),
                    )
                    .service(web::resource("/report").route(web::get().to(expense::expense_report)))
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(expense::update_expense))
                            .route(web::get().to(expense::get_expense))
                            .route(web::delete().to(expense::delete_expense)),
                    ),
            )
            .service(
                web::scope("/raw-materials")
                    .service(
                        web::resource("")
                            .route(web::post().to(raw_material::create_raw_material))
                            .route(web::get().to(raw_material::list_raw_materials)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(raw_material::update_raw_material))
                            .route(web::get().to(raw_material::get_raw_material))
                            .route(web::delete().to(raw_material::delete_raw_material)),
                    ),
            )
            .route("/dashboard/kpis", web::get().to(dashboard::dashboard_kpis)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{
        App,
        http::StatusCode,
        test::{TestRequest, call_service, init_service},
    };

    #[test]
    fn limiter_accepts_extreme_rates() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(1000).is_ok());
        assert!(build_limiter(120_000).is_ok());
    }

    #[actix_web::test]
    async fn health_is_outside_the_api_scope() {
        let app = init_service(App::new().service(health)).await;
        let req = TestRequest::get().uri("/health").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
