use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{LoanError, Result};

/// engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// wall-clock budget for a single workflow invocation
    pub workflow_timeout_ms: u64,
    /// divisor turning an annual rate into a weekly one
    pub weeks_per_year: u32,
    /// overdue unpaid installments at which a borrower counts as delinquent
    pub delinquency_threshold: u32,
    /// longest term a loan request may ask for
    pub max_term_weeks: u32,
    /// require payment installment ids to equal the recomputed due set
    pub strict_installment_match: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl EngineConfig {
    /// standard configuration: 30s workflows, 52-week year, delinquent at two missed installments
    pub fn standard() -> Self {
        Self {
            workflow_timeout_ms: 30_000,
            weeks_per_year: 52,
            delinquency_threshold: 2,
            max_term_weeks: 520,
            strict_installment_match: false,
        }
    }

    /// standard configuration with payment installment ids checked against the due set
    pub fn strict() -> Self {
        Self {
            strict_installment_match: true,
            ..Self::standard()
        }
    }

    pub fn with_workflow_timeout(mut self, timeout: Duration) -> Self {
        self.workflow_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn workflow_timeout(&self) -> Duration {
        Duration::from_millis(self.workflow_timeout_ms)
    }

    /// load from json; missing fields take their standard values
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(raw).map_err(|e| LoanError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.weeks_per_year == 0 {
            return Err(LoanError::InvalidConfiguration {
                message: "weeks_per_year must be greater than 0".to_string(),
            });
        }
        if self.delinquency_threshold == 0 {
            return Err(LoanError::InvalidConfiguration {
                message: "delinquency_threshold must be greater than 0".to_string(),
            });
        }
        if self.max_term_weeks == 0 {
            return Err(LoanError::InvalidConfiguration {
                message: "max_term_weeks must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.workflow_timeout(), Duration::from_secs(30));
        assert_eq!(config.weeks_per_year, 52);
        assert_eq!(config.delinquency_threshold, 2);
        assert!(!config.strict_installment_match);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(r#"{ "workflow_timeout_ms": 500, "strict_installment_match": true }"#)
            .unwrap();
        assert_eq!(config.workflow_timeout(), Duration::from_millis(500));
        assert!(config.strict_installment_match);
        assert_eq!(config.weeks_per_year, 52);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "weeks_per_year": 0 }"#),
            Err(LoanError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(LoanError::InvalidConfiguration { .. })
        ));
    }
}
