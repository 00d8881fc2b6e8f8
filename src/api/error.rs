use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use tracing::error;

use crate::error::EngineError;

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Validation { .. } => StatusCode::BAD_REQUEST,
            EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::InvalidState(_) | EngineError::Conflict { .. } => StatusCode::CONFLICT,
            EngineError::Inconsistency { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            EngineError::Validation { violations } => json!({
                "error": "validation_failed",
                "violations": violations,
            }),
            EngineError::NotFound { entity, id } => json!({
                "error": "not_found",
                "entity": entity,
                "id": id,
            }),
            EngineError::InvalidState(message) => json!({
                "error": "invalid_state",
                "message": message,
            }),
            EngineError::Inconsistency {
                field,
                expected,
                actual,
            } => json!({
                "error": "inconsistent_amounts",
                "field": field,
                "expected": expected,
                "actual": actual,
            }),
            EngineError::Conflict {
                entity,
                id,
                expected_version,
            } => json!({
                "error": "conflict",
                "entity": entity,
                "id": id,
                "expected_version": expected_version,
                "message": "modified concurrently, reload and retry",
            }),
            EngineError::Infrastructure(detail) => {
                // details stay in the log
                error!(error = %detail, "Datastore failure");
                json!({ "error": "internal_error" })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
