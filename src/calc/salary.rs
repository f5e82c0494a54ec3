use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{CalcError, ensure_amount, ensure_rate};

/// Statutory contribution rates applied to the basic salary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContributionRates {
    #[schema(example = 0.08)]
    pub epf_employee: f64,
    #[schema(example = 0.12)]
    pub epf_employer: f64,
    #[schema(example = 0.03)]
    pub etf_employer: f64,
}

impl Default for ContributionRates {
    fn default() -> Self {
        Self {
            epf_employee: 0.08,
            epf_employer: 0.12,
            etf_employer: 0.03,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Allowance {
    #[schema(example = "Transport")]
    pub name: String,
    #[schema(example = 6000.0)]
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Deduction {
    #[schema(example = "Salary advance")]
    pub name: String,
    #[schema(example = 2500.0)]
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "basic_salary": 50000.0,
    "allowances": [
        {"name": "Housing", "amount": 25000.0},
        {"name": "Transport", "amount": 6000.0},
        {"name": "Meal", "amount": 3500.0},
        {"name": "Medical", "amount": 8000.0}
    ],
    "overtime_amount": 18750.0,
    "bonus": 10000.0
}))]
pub struct SalaryInput {
    pub basic_salary: f64,
    #[serde(default)]
    pub allowances: Vec<Allowance>,
    /// Pre-computed overtime pay. Takes precedence over `ot_hours * ot_rate`.
    #[serde(default)]
    pub overtime_amount: Option<f64>,
    #[serde(default)]
    pub ot_hours: f64,
    #[serde(default)]
    pub ot_rate: f64,
    #[serde(default)]
    pub bonus: f64,
    #[serde(default)]
    pub reimbursements: f64,
    #[serde(default)]
    pub other_deductions: Vec<Deduction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalaryBreakdown {
    pub basic_salary: f64,
    pub total_allowances: f64,
    pub overtime_pay: f64,
    pub bonus: f64,
    pub reimbursements: f64,
    pub gross_salary: f64,
    pub epf_employee: f64,
    pub epf_employer: f64,
    pub etf_employer: f64,
    pub other_deductions: f64,
    pub total_deductions: f64,
    pub net_salary: f64,
    /// Gross plus employer-side EPF and ETF.
    pub employer_cost: f64,
}

/// Half away from zero, to whole currency units.
pub fn round_whole(value: f64) -> f64 {
    value.round()
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl SalaryInput {
    fn overtime_pay(&self) -> Result<f64, CalcError> {
        match self.overtime_amount {
            Some(amount) => ensure_amount("overtime_amount", amount),
            None => {
                let hours = ensure_amount("ot_hours", self.ot_hours)?;
                let rate = ensure_amount("ot_rate", self.ot_rate)?;
                Ok(round_cents(hours * rate))
            }
        }
    }
}

pub fn compute_salary(
    input: &SalaryInput,
    rates: &ContributionRates,
) -> Result<SalaryBreakdown, CalcError> {
    let basic_salary = ensure_amount("basic_salary", input.basic_salary)?;
    let bonus = ensure_amount("bonus", input.bonus)?;
    let reimbursements = ensure_amount("reimbursements", input.reimbursements)?;
    let epf_employee_rate = ensure_rate("epf_employee", rates.epf_employee)?;
    let epf_employer_rate = ensure_rate("epf_employer", rates.epf_employer)?;
    let etf_employer_rate = ensure_rate("etf_employer", rates.etf_employer)?;

    let mut total_allowances = 0.0;
    for allowance in &input.allowances {
        total_allowances +=
            ensure_amount(format!("allowances[{}]", allowance.name), allowance.amount)?;
    }

    let mut other_deductions = 0.0;
    for deduction in &input.other_deductions {
        other_deductions += ensure_amount(
            format!("other_deductions[{}]", deduction.name),
            deduction.amount,
        )?;
    }

    let overtime_pay = input.overtime_pay()?;

    let gross_salary = basic_salary + total_allowances + overtime_pay + bonus + reimbursements;

    let epf_employee = round_whole(basic_salary * epf_employee_rate);
    let epf_employer = round_whole(basic_salary * epf_employer_rate);
    let etf_employer = round_whole(basic_salary * etf_employer_rate);

    let total_deductions = epf_employee + other_deductions;
    let net_salary = gross_salary - total_deductions;

    Ok(SalaryBreakdown {
        basic_salary,
        total_allowances,
        overtime_pay,
        bonus,
        reimbursements,
        gross_salary,
        epf_employee,
        epf_employer,
        etf_employer,
        other_deductions,
        total_deductions,
        net_salary,
        employer_cost: gross_salary + epf_employer + etf_employer,
    })
}
