use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;

use crate::engine::salary_config::{SalaryConfig, SalaryConfigOverrides, create_salary_config};
use crate::service::liquidation_service::VersioningMode;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    // Lookup cache
    pub cache_ttl: Duration,
    pub cache_max_capacity: u64,

    pub liquidation_versioning: VersioningMode,
    pub salary: SalaryConfigOverrides,
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{name} must be set"))
}

fn parsed_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{name}={raw:?} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

fn parsed_opt<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("{name}={raw:?} is invalid: {e}")),
        Err(_) => Ok(None),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,

            cache_ttl: Duration::from_secs(parsed_or("CACHE_TTL_SECS", 300)?),
            cache_max_capacity: parsed_or("CACHE_MAX_CAPACITY", 10_000)?,

            liquidation_versioning: parsed_or("LIQUIDATION_VERSIONING", VersioningMode::InPlace)?,
            salary: SalaryConfigOverrides {
                overtime_multiplier: parsed_opt("OVERTIME_MULTIPLIER")?,
                holiday_multiplier: parsed_opt("HOLIDAY_MULTIPLIER")?,
                working_hours_per_day: parsed_opt("WORKING_HOURS_PER_DAY")?,
                working_days_per_month: parsed_opt("WORKING_DAYS_PER_MONTH")?,
            },
        })
    }

    /// Defaults merged with the env overrides, validated.
    pub fn salary_config(&self) -> Result<SalaryConfig> {
        create_salary_config(self.salary)
            .validated()
            .context("invalid salary configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config(salary: SalaryConfigOverrides) -> Config {
        Config {
            database_url: "mysql://localhost/payroll".into(),
            jwt_secret: "secret".into(),
            server_addr: "127.0.0.1:8080".into(),
            api_prefix: "/api".into(),
            rate_protected_per_min: 1000,
            cache_ttl: Duration::from_secs(300),
            cache_max_capacity: 10_000,
            liquidation_versioning: VersioningMode::InPlace,
            salary,
        }
    }

    #[test]
    fn test_salary_overrides_are_merged_and_validated() {
        let cfg = config(SalaryConfigOverrides {
            overtime_multiplier: Some(dec!(1.75)),
            ..Default::default()
        })
        .salary_config()
        .unwrap();
        assert_eq!(cfg.overtime_multiplier, dec!(1.75));
        assert_eq!(cfg.working_days_per_month, 30);

        let err = config(SalaryConfigOverrides {
            working_hours_per_day: Some(0),
            ..Default::default()
        })
        .salary_config()
        .unwrap_err();
        assert!(format!("{err:#}").contains("working_hours_per_day"));
    }

    #[test]
    fn test_unset_variable_falls_back_to_default() {
        let ttl: u64 = parsed_or("PAYROLL_ENGINE_TEST_UNSET_TTL", 42).unwrap();
        assert_eq!(ttl, 42);
        let multiplier: Option<rust_decimal::Decimal> =
            parsed_opt("PAYROLL_ENGINE_TEST_UNSET_MULTIPLIER").unwrap();
        assert_eq!(multiplier, None);
    }
}
