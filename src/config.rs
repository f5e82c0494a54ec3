use std::{env, str::FromStr};

use anyhow::{Context, Result, anyhow};

use crate::model::payroll_config::{PayrollConfig, parse_allowances};

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_api_per_min: u32,

    pub kpi_cache_ttl_secs: u64,

    /// Starting payroll settings; editable at runtime through the API.
    pub payroll: PayrollConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        let defaults = PayrollConfig::default();
        let payroll = PayrollConfig {
            epf_employee_rate: parse_or(&lookup, "EPF_EMPLOYEE_RATE", defaults.epf_employee_rate)?,
            epf_employer_rate: parse_or(&lookup, "EPF_EMPLOYER_RATE", defaults.epf_employer_rate)?,
            etf_employer_rate: parse_or(&lookup, "ETF_EMPLOYER_RATE", defaults.etf_employer_rate)?,
            overtime_multiplier: parse_or(&lookup, "OT_MULTIPLIER", defaults.overtime_multiplier)?,
            standard_monthly_hours: parse_or(
                &lookup,
                "STANDARD_MONTHLY_HOURS",
                defaults.standard_monthly_hours,
            )?,
            allowances: match lookup("FLAT_ALLOWANCES") {
                Some(raw) => parse_allowances(&raw).context("FLAT_ALLOWANCES")?,
                None => defaults.allowances,
            },
            currency: lookup("CURRENCY").unwrap_or(defaults.currency),
        };
        payroll.validate().context("invalid payroll settings")?;

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            rate_api_per_min: parse_or(&lookup, "RATE_API_PER_MIN", 1000)?,
            kpi_cache_ttl_secs: parse_or(&lookup, "KPI_CACHE_TTL_SECS", 60)?,
            payroll,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_ADDR", "127.0.0.1:8080"),
            ("DATABASE_URL", "mysql://root@localhost/bizdash"),
        ]))
        .unwrap();

        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.rate_api_per_min, 1000);
        assert_eq!(config.kpi_cache_ttl_secs, 60);
        assert_eq!(config.payroll, PayrollConfig::default());
    }

    #[test]
    fn test_payroll_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_ADDR", "0.0.0.0:80"),
            ("DATABASE_URL", "mysql://db/bizdash"),
            ("EPF_EMPLOYEE_RATE", "0.1"),
            ("OT_MULTIPLIER", "2"),
            ("FLAT_ALLOWANCES", "Transport:6000,Meal:3500"),
            ("CURRENCY", "USD"),
        ]))
        .unwrap();

        assert_eq!(config.payroll.epf_employee_rate, 0.1);
        assert_eq!(config.payroll.overtime_multiplier, 2.0);
        assert_eq!(config.payroll.allowances.len(), 2);
        assert_eq!(config.payroll.currency, "USD");
    }

    #[test]
    fn test_missing_and_invalid_values_fail() {
        let missing = Config::from_lookup(lookup(&[("SERVER_ADDR", "0.0.0.0:80")]));
        assert!(missing.err().unwrap().to_string().contains("DATABASE_URL"));

        let bad_rate = Config::from_lookup(lookup(&[
            ("SERVER_ADDR", "0.0.0.0:80"),
            ("DATABASE_URL", "mysql://db/bizdash"),
            ("ETF_EMPLOYER_RATE", "3"),
        ]));
        assert!(bad_rate.is_err());

        let not_a_number = Config::from_lookup(lookup(&[
            ("SERVER_ADDR", "0.0.0.0:80"),
            ("DATABASE_URL", "mysql://db/bizdash"),
            ("RATE_API_PER_MIN", "many"),
        ]));
        assert!(not_a_number.is_err());
    }
}
