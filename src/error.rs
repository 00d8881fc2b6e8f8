use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the payroll and liquidation engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Bad config, bad dates, amount constraints. Never retried.
    #[error("validation failed: {}", .violations.join("; "))]
    Validation { violations: Vec<String> },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Stored or reported amount disagrees with the recomputed one.
    #[error("{field} is inconsistent: expected {expected}, got {actual}")]
    Inconsistency {
        field: String,
        expected: Decimal,
        actual: Decimal,
    },

    /// Optimistic concurrency loss: the row moved past `expected_version`.
    #[error("{entity} {id} was modified concurrently (expected version {expected_version})")]
    Conflict {
        entity: &'static str,
        id: u64,
        expected_version: u32,
    },

    #[error("datastore failure: {0}")]
    Infrastructure(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation {
            violations: vec![message.into()],
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Only datastore failures are worth retrying at the caller level.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Infrastructure(_))
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Infrastructure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validation_message_lists_every_violation() {
        let err = EngineError::Validation {
            violations: vec!["a is bad".into(), "b is bad".into()],
        };
        assert_eq!(err.to_string(), "validation failed: a is bad; b is bad");
    }

    #[test]
    fn test_inconsistency_reports_both_values() {
        let err = EngineError::Inconsistency {
            field: "total_salary".into(),
            expected: dec!(100.00),
            actual: dec!(99.50),
        };
        let msg = err.to_string();
        assert!(msg.contains("total_salary"));
        assert!(msg.contains("100.00"));
        assert!(msg.contains("99.50"));
    }

    #[test]
    fn test_only_infrastructure_is_retryable() {
        assert!(EngineError::Infrastructure("timeout".into()).is_retryable());
        assert!(!EngineError::not_found("employee", 7).is_retryable());
        assert!(!EngineError::InvalidState("paid".into()).is_retryable());
    }
}
