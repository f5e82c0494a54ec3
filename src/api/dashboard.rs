use std::time::Duration;

use crate::{
    api::{
        expense::fetch_expenses,
        payroll::{read_config, run_payroll},
        raw_material::fetch_raw_materials,
    },
    calc::{
        format::format_percentage,
        period::{current_month, month_key, month_range, previous_month},
        report::{CategoryTotal, aggregate_by_category, percent_change},
    },
    error::ApiError,
    model::{
        expense::{Expense, ExpenseStatus},
        payroll_config::SharedPayrollConfig,
        raw_material::RawMaterial,
    },
};
use actix_web::{HttpResponse, web};
use moka::future::Cache;
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::ToSchema;

const TOP_CATEGORIES: usize = 5;

/// Computed KPIs keyed by month, so a month rollover never serves stale data.
pub struct KpiCache {
    inner: Cache<String, DashboardKpis>,
}

impl KpiCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(16)
                .time_to_live(Duration::from_secs(ttl_secs.max(1)))
                .build(),
        }
    }

    pub async fn invalidate_all(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardKpis {
    #[schema(example = "2025-06")]
    pub month: String,
    #[schema(example = "LKR")]
    pub currency: String,
    #[schema(example = 48)]
    pub headcount: i64,
    #[schema(example = 41)]
    pub active_headcount: i64,
    /// Employer cost of this month's payroll
    pub payroll_cost: f64,
    pub net_payroll: f64,
    pub expenses_this_month: f64,
    pub expenses_last_month: f64,
    /// `null` when last month had no expenses
    #[schema(nullable = true)]
    pub expense_change_pct: Option<f64>,
    /// `expense_change_pct` as shown on the dashboard card
    #[schema(example = "25.00%", nullable = true)]
    pub expense_change_display: Option<String>,
    pub top_expense_categories: Vec<CategoryTotal>,
    #[schema(example = 3)]
    pub low_stock_count: usize,
    pub inventory_value: f64,
}

#[derive(Debug, Default, PartialEq)]
pub struct ExpenseKpis {
    pub this_month: f64,
    pub last_month: f64,
    pub change_pct: Option<f64>,
    pub top_categories: Vec<CategoryTotal>,
}

/// Splits `expenses` into the given month and the one before it. Rejected
/// expenses are not counted.
pub fn expense_kpis(expenses: &[Expense], month: &str, previous: &str) -> ExpenseKpis {
    let counted: Vec<&Expense> = expenses
        .iter()
        .filter(|e| e.status != ExpenseStatus::Rejected)
        .collect();

    let total_for = |key: &str| -> f64 {
        counted
            .iter()
            .filter(|e| month_key(e.date) == key)
            .map(|e| e.amount)
            .sum()
    };
    let this_month = total_for(month);
    let last_month = total_for(previous);

    let current: Vec<&Expense> = counted
        .iter()
        .copied()
        .filter(|e| month_key(e.date) == month)
        .collect();
    let mut top_categories =
        aggregate_by_category(&current, |e| e.category.clone(), |e| e.amount)
            .sorted_by_total()
            .categories;
    top_categories.truncate(TOP_CATEGORIES);

    ExpenseKpis {
        this_month,
        last_month,
        change_pct: percent_change(last_month, this_month),
        top_categories,
    }
}

/// `(low_stock_count, inventory_value)`
pub fn inventory_kpis(materials: &[RawMaterial]) -> (usize, f64) {
    let low = materials.iter().filter(|m| m.needs_reorder()).count();
    let value = materials.iter().map(RawMaterial::stock_value).sum();
    (low, value)
}

async fn compute_kpis(
    pool: &MySqlPool,
    config: &SharedPayrollConfig,
) -> Result<DashboardKpis, ApiError> {
    let config = read_config(config)?;
    let this_month = current_month();
    let last_month = previous_month(this_month);
    let month = month_key(this_month);

    let (headcount, active_headcount) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COUNT(*), CAST(COALESCE(SUM(status = 'Active'), 0) AS SIGNED)
        FROM employees
        "#,
    )
    .fetch_one(pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to count employees");
        ApiError::from(e)
    })?;

    let payroll = run_payroll(pool, &config, &month).await?;

    let (_, month_end) = month_range(this_month);
    let expenses = fetch_expenses(pool, None, None, Some(last_month), month_end.pred_opt())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to load expenses for dashboard");
            ApiError::from(e)
        })?;
    let expense = expense_kpis(&expenses, &month, &month_key(last_month));

    let materials = fetch_raw_materials(pool).await.map_err(|e| {
        error!(error = %e, "Failed to load raw materials for dashboard");
        ApiError::from(e)
    })?;
    let (low_stock_count, inventory_value) = inventory_kpis(&materials);

    Ok(DashboardKpis {
        month,
        currency: config.currency,
        headcount,
        active_headcount,
        payroll_cost: payroll.totals.total_employer_cost,
        net_payroll: payroll.totals.total_net,
        expenses_this_month: expense.this_month,
        expenses_last_month: expense.last_month,
        expense_change_pct: expense.change_pct,
        expense_change_display: expense.change_pct.map(format_percentage),
        top_expense_categories: expense.top_categories,
        low_stock_count,
        inventory_value,
    })
}

#[utoipa::path(
    get,
    path = "/api/dashboard/kpis",
    responses(
        (status = 200, body = DashboardKpis),
        (status = 500, description = "Database error")
    ),
    tag = "Dashboard"
)]
pub async fn dashboard_kpis(
    pool: web::Data<MySqlPool>,
    config: web::Data<SharedPayrollConfig>,
    cache: web::Data<KpiCache>,
) -> Result<HttpResponse, ApiError> {
    let key = month_key(current_month());

    if let Some(kpis) = cache.inner.get(&key).await {
        debug!(month = %key, "Serving dashboard KPIs from cache");
        return Ok(HttpResponse::Ok().json(kpis));
    }

    let kpis = compute_kpis(pool.get_ref(), config.get_ref()).await?;
    cache.inner.insert(key, kpis.clone()).await;

    Ok(HttpResponse::Ok().json(kpis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn expense(category: &str, date: &str, amount: f64, status: ExpenseStatus) -> Expense {
        Expense {
            id: 0,
            category: category.to_string(),
            description: String::new(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            amount,
            status,
        }
    }

    #[test]
    fn expenses_compare_against_previous_month() {
        let expenses = vec![
            expense("Fuel", "2025-05-10", 4000.0, ExpenseStatus::Approved),
            expense("Fuel", "2025-06-02", 3000.0, ExpenseStatus::Approved),
            expense("Repairs", "2025-06-15", 2000.0, ExpenseStatus::Pending),
            expense("Repairs", "2025-06-20", 9999.0, ExpenseStatus::Rejected),
        ];

        let kpis = expense_kpis(&expenses, "2025-06", "2025-05");
        assert_eq!(kpis.this_month, 5000.0);
        assert_eq!(kpis.last_month, 4000.0);
        assert_eq!(kpis.change_pct, Some(25.0));
        assert_eq!(
            kpis.change_pct.map(format_percentage).as_deref(),
            Some("25.00%")
        );
        assert_eq!(kpis.top_categories.len(), 2);
        assert_eq!(kpis.top_categories[0].category, "Fuel");
    }

    #[test]
    fn no_previous_expenses_means_no_change() {
        let expenses = vec![expense("Fuel", "2025-06-02", 3000.0, ExpenseStatus::Approved)];
        let kpis = expense_kpis(&expenses, "2025-06", "2025-05");
        assert_eq!(kpis.change_pct, None);
    }

    #[test]
    fn inventory_counts_low_stock_and_value() {
        let materials = vec![
            RawMaterial {
                id: 1,
                name: "Sugar".into(),
                unit: "kg".into(),
                quantity: 10.0,
                reorder_level: 10.0,
                unit_price: 250.0,
                supplier: None,
            },
            RawMaterial {
                id: 2,
                name: "Cups".into(),
                unit: "pcs".into(),
                quantity: 500.0,
                reorder_level: 100.0,
                unit_price: 12.0,
                supplier: Some("Lanka Plastics".into()),
            },
        ];

        assert_eq!(inventory_kpis(&materials), (1, 8500.0));
        assert_eq!(inventory_kpis(&[]), (0, 0.0));
    }

    #[actix_web::test]
    async fn cache_returns_inserted_kpis_until_invalidated() {
        let cache = KpiCache::new(60);
        let kpis = DashboardKpis {
            month: "2025-06".into(),
            currency: "LKR".into(),
            headcount: 2,
            active_headcount: 1,
            payroll_cost: 0.0,
            net_payroll: 0.0,
            expenses_this_month: 0.0,
            expenses_last_month: 0.0,
            expense_change_pct: None,
            expense_change_display: None,
            top_expense_categories: Vec::new(),
            low_stock_count: 0,
            inventory_value: 0.0,
        };

        cache.inner.insert("2025-06".into(), kpis.clone()).await;
        assert_eq!(cache.inner.get("2025-06").await, Some(kpis));

        cache.invalidate_all().await;
        assert_eq!(cache.inner.get("2025-06").await, None);
    }
}
