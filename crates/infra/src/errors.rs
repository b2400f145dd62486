//! Conversions from external infrastructure errors into domain errors.

use linkcal_domain::LinkcalError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub LinkcalError);

impl From<InfraError> for LinkcalError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LinkcalError> for InfraError {
    fn from(value: LinkcalError) -> Self {
        InfraError(value)
    }
}

impl From<rusqlite::Error> for InfraError {
    fn from(value: rusqlite::Error) -> Self {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        let mapped = match value {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => LinkcalError::Database("database is busy".into()),
                    ErrorCode::DatabaseLocked => {
                        LinkcalError::Database("database is locked".into())
                    }
                    ErrorCode::ConstraintViolation => LinkcalError::Database(format!(
                        "constraint violation (code {}): {message}",
                        err.extended_code
                    )),
                    _ => LinkcalError::Database(format!(
                        "sqlite failure {:?} (code {}): {message}",
                        err.code, err.extended_code
                    )),
                }
            }
            RE::QueryReturnedNoRows => LinkcalError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                LinkcalError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                LinkcalError::Database(format!("invalid column type: {ty}"))
            }
            other => LinkcalError::Database(other.to_string()),
        };

        InfraError(mapped)
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(LinkcalError::Database(format!("connection pool error: {value}")))
    }
}

impl From<reqwest::Error> for InfraError {
    fn from(value: reqwest::Error) -> Self {
        let mapped = if value.is_timeout() {
            LinkcalError::Network("request timed out".into())
        } else if value.is_connect() {
            LinkcalError::Network(format!("connection failed: {value}"))
        } else if value.is_decode() {
            LinkcalError::InvalidInput(format!("failed to decode response body: {value}"))
        } else {
            LinkcalError::Network(value.to_string())
        };

        InfraError(mapped)
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(LinkcalError::InvalidInput(format!("serialization error: {value}")))
    }
}
