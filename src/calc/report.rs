use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use utoipa::ToSchema;

use super::salary::SalaryBreakdown;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CategoryTotal {
    #[schema(example = "Utilities")]
    pub category: String,
    #[schema(example = 12500.0)]
    pub total: f64,
    #[schema(example = 25.0)]
    pub percentage: f64,
    #[schema(example = 3)]
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct CategoryReport {
    pub grand_total: f64,
    pub categories: Vec<CategoryTotal>,
}

impl CategoryReport {
    /// Largest category first; ties keep first-seen order.
    pub fn sorted_by_total(mut self) -> Self {
        self.categories.sort_by(|a, b| b.total.total_cmp(&a.total));
        self
    }
}

/// Groups `records` by `key` and sums `value` per group.
///
/// Categories appear in the order they are first seen. A zero grand total
/// yields 0% for every category instead of NaN.
pub fn aggregate_by_category<T, K, V>(records: &[T], key: K, value: V) -> CategoryReport
where
    K: Fn(&T) -> String,
    V: Fn(&T) -> f64,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut categories: Vec<CategoryTotal> = Vec::new();

    for record in records {
        let category = key(record);
        let amount = value(record);

        match index.get(&category) {
            Some(&i) => {
                categories[i].total += amount;
                categories[i].count += 1;
            }
            None => {
                index.insert(category.clone(), categories.len());
                categories.push(CategoryTotal {
                    category,
                    total: amount,
                    percentage: 0.0,
                    count: 1,
                });
            }
        }
    }

    let grand_total: f64 = categories.iter().map(|c| c.total).sum();

    if grand_total != 0.0 {
        for c in &mut categories {
            c.percentage = c.total / grand_total * 100.0;
        }
    }

    CategoryReport {
        grand_total,
        categories,
    }
}

/// Period-over-period change in percent. `None` when there is no base to
/// compare against.
pub fn percent_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return None;
    }
    Some((current - previous) / previous.abs() * 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthTotal {
    #[schema(example = "2025-06")]
    pub month: String,
    pub total: f64,
}

/// Sums `value` per `YYYY-MM` key, oldest month first.
pub fn totals_by_month<T, M, V>(records: &[T], month: M, value: V) -> Vec<MonthTotal>
where
    M: Fn(&T) -> String,
    V: Fn(&T) -> f64,
{
    let mut buckets: BTreeMap<String, f64> = BTreeMap::new();
    for record in records {
        *buckets.entry(month(record)).or_insert(0.0) += value(record);
    }

    buckets
        .into_iter()
        .map(|(month, total)| MonthTotal { month, total })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct PayrollTotals {
    pub headcount: usize,
    pub total_basic: f64,
    pub total_gross: f64,
    pub total_deductions: f64,
    pub total_net: f64,
    pub total_epf_employee: f64,
    pub total_epf_employer: f64,
    pub total_etf_employer: f64,
    pub total_employer_cost: f64,
}

pub fn summarize_payroll<'a, I>(breakdowns: I) -> PayrollTotals
where
    I: IntoIterator<Item = &'a SalaryBreakdown>,
{
    breakdowns
        .into_iter()
        .fold(PayrollTotals::default(), |mut acc, slip| {
            acc.headcount += 1;
            acc.total_basic += slip.basic_salary;
            acc.total_gross += slip.gross_salary;
            acc.total_deductions += slip.total_deductions;
            acc.total_net += slip.net_salary;
            acc.total_epf_employee += slip.epf_employee;
            acc.total_epf_employer += slip.epf_employer;
            acc.total_etf_employer += slip.etf_employer;
            acc.total_employer_cost += slip.employer_cost;
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::salary::{ContributionRates, SalaryInput, compute_salary};

    struct Row {
        category: &'static str,
        month: &'static str,
        amount: f64,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                category: "Fuel",
                month: "2025-02",
                amount: 1200.0,
            },
            Row {
                category: "Utilities",
                month: "2025-01",
                amount: 3000.0,
            },
            Row {
                category: "Fuel",
                month: "2025-01",
                amount: 800.0,
            },
            Row {
                category: "Maintenance",
                month: "2025-02",
                amount: 5000.0,
            },
        ]
    }

    #[test]
    fn test_aggregate_by_category() {
        let report = aggregate_by_category(&rows(), |r| r.category.to_string(), |r| r.amount);

        assert_eq!(report.grand_total, 10000.0);
        let names: Vec<_> = report.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, ["Fuel", "Utilities", "Maintenance"]);
        assert_eq!(report.categories[0].total, 2000.0);
        assert_eq!(report.categories[0].count, 2);
        assert_eq!(report.categories[2].percentage, 50.0);
        assert!(report.categories.iter().all(|c| c.category != "Rent"));
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let amounts = [0.1, 7.77, 1234.5, 3.3333, 99.0, 0.02];
        let report = aggregate_by_category(
            &amounts,
            |a| format!("c{}", (*a as u64) % 3),
            |a| *a,
        );
        let sum: f64 = report.categories.iter().map(|c| c.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_total_has_no_nan() {
        let rows = vec![Row {
            category: "Fuel",
            month: "2025-01",
            amount: 0.0,
        }];
        let report = aggregate_by_category(&rows, |r| r.category.to_string(), |r| r.amount);
        assert_eq!(report.grand_total, 0.0);
        assert_eq!(report.categories[0].percentage, 0.0);

        let empty =
            aggregate_by_category(&Vec::<Row>::new(), |r| r.category.to_string(), |r| r.amount);
        assert!(empty.categories.is_empty());
    }

    #[test]
    fn test_sorted_by_total() {
        let report = aggregate_by_category(&rows(), |r| r.category.to_string(), |r| r.amount)
            .sorted_by_total();
        assert_eq!(report.categories[0].category, "Maintenance");
        assert_eq!(report.categories[2].category, "Fuel");
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(200.0, 250.0), Some(25.0));
        assert_eq!(percent_change(200.0, 150.0), Some(-25.0));
        assert_eq!(percent_change(0.0, 150.0), None);
        assert_eq!(percent_change(-100.0, -50.0), Some(50.0));
    }

    #[test]
    fn test_totals_by_month_is_ordered() {
        let months = totals_by_month(&rows(), |r| r.month.to_string(), |r| r.amount);
        assert_eq!(
            months,
            vec![
                MonthTotal {
                    month: "2025-01".to_string(),
                    total: 3800.0,
                },
                MonthTotal {
                    month: "2025-02".to_string(),
                    total: 6200.0,
                },
            ]
        );
    }

    #[test]
    fn test_summarize_payroll() {
        let rates = ContributionRates::default();
        let slips: Vec<_> = [40000.0, 60000.0]
            .into_iter()
            .map(|basic| {
                compute_salary(
                    &SalaryInput {
                        basic_salary: basic,
                        ..Default::default()
                    },
                    &rates,
                )
                .unwrap()
            })
            .collect();

        let totals = summarize_payroll(&slips);
        assert_eq!(totals.headcount, 2);
        assert_eq!(totals.total_gross, 100000.0);
        assert_eq!(totals.total_epf_employee, 8000.0);
        assert_eq!(totals.total_net, 92000.0);
        assert_eq!(totals.total_employer_cost, 115000.0);
    }
}
