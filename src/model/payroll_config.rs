use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::calc::{
    CalcError, ensure_amount, ensure_rate,
    salary::{Allowance, ContributionRates, SalaryInput, round_cents},
};

/// Global payroll settings. Held in memory for the life of the process and
/// shared between workers behind a lock.
pub type SharedPayrollConfig = RwLock<PayrollConfig>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "epf_employee_rate": 0.08,
    "epf_employer_rate": 0.12,
    "etf_employer_rate": 0.03,
    "overtime_multiplier": 1.5,
    "standard_monthly_hours": 240.0,
    "allowances": [{"name": "Transport", "amount": 6000.0}],
    "currency": "LKR"
}))]
pub struct PayrollConfig {
    pub epf_employee_rate: f64,
    pub epf_employer_rate: f64,
    pub etf_employer_rate: f64,
    pub overtime_multiplier: f64,
    pub standard_monthly_hours: f64,
    /// Flat allowances paid to every employee each month.
    #[serde(default)]
    pub allowances: Vec<Allowance>,
    pub currency: String,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        let rates = ContributionRates::default();
        Self {
            epf_employee_rate: rates.epf_employee,
            epf_employer_rate: rates.epf_employer,
            etf_employer_rate: rates.etf_employer,
            overtime_multiplier: 1.5,
            standard_monthly_hours: 240.0,
            allowances: Vec::new(),
            currency: "LKR".to_string(),
        }
    }
}

impl PayrollConfig {
    pub fn rates(&self) -> ContributionRates {
        ContributionRates {
            epf_employee: self.epf_employee_rate,
            epf_employer: self.epf_employer_rate,
            etf_employer: self.etf_employer_rate,
        }
    }

    pub fn validate(&self) -> Result<(), CalcError> {
        ensure_rate("epf_employee_rate", self.epf_employee_rate)?;
        ensure_rate("epf_employer_rate", self.epf_employer_rate)?;
        ensure_rate("etf_employer_rate", self.etf_employer_rate)?;
        ensure_amount("overtime_multiplier", self.overtime_multiplier)?;

        if !(self.standard_monthly_hours.is_finite() && self.standard_monthly_hours > 0.0) {
            return Err(CalcError::InvalidConfig(format!(
                "standard_monthly_hours must be positive, got {}",
                self.standard_monthly_hours
            )));
        }
        for allowance in &self.allowances {
            if allowance.name.trim().is_empty() {
                return Err(CalcError::InvalidConfig("allowance name must not be empty".into()));
            }
            ensure_amount(format!("allowances[{}]", allowance.name), allowance.amount)?;
        }
        if self.currency.trim().is_empty() {
            return Err(CalcError::InvalidConfig("currency must not be empty".into()));
        }
        Ok(())
    }

    /// Hourly overtime rate: basic / standard hours * multiplier, to cents.
    pub fn overtime_rate(&self, basic_salary: f64) -> f64 {
        round_cents(basic_salary / self.standard_monthly_hours * self.overtime_multiplier)
    }

    pub fn salary_input(&self, basic_salary: f64, ot_hours: f64) -> SalaryInput {
        SalaryInput {
            basic_salary,
            allowances: self.allowances.clone(),
            ot_hours,
            ot_rate: self.overtime_rate(basic_salary),
            ..Default::default()
        }
    }
}

/// Parses `"Transport:6000,Meal:3500"` into allowances.
pub fn parse_allowances(raw: &str) -> Result<Vec<Allowance>, CalcError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (name, amount) = part.split_once(':').ok_or_else(|| {
                CalcError::InvalidConfig(format!("allowance '{part}' must look like Name:amount"))
            })?;
            let amount: f64 = amount.trim().parse().map_err(|_| {
                CalcError::InvalidConfig(format!("allowance '{part}' has a non-numeric amount"))
            })?;
            Ok(Allowance {
                name: name.trim().to_string(),
                amount: ensure_amount(format!("allowances[{}]", name.trim()), amount)?,
            })
        })
        .collect()
}
