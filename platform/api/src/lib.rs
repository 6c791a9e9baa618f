use std::{collections::BTreeMap, sync::Arc};

use async_graphql::{Error, ErrorExtensions, Name, Value};
use thiserror::Error;

/// Shared GraphQL result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error, Clone)]
pub enum ApiError {
    #[error("resource not found")]
    NotFound,
    #[error("bad request: {0}")]
    InvalidInput(String),
    #[error("validation failed")]
    Validation(BTreeMap<String, String>),
    #[error("internal server error")]
    Internal(Arc<anyhow::Error>),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound => "NOT_FOUND",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::Validation(_) => "VALIDATION_FAILED",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::Internal(Arc::new(err))
    }

    /// Field name to message, one entry per failing field.
    pub fn validation<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Validation(
            fields
                .into_iter()
                .map(|(field, message)| (field.into(), message.into()))
                .collect(),
        )
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> Error {
        if let ApiError::Internal(inner) = self {
            tracing::error!(error = %inner, "internal error surfaced to client");
        }
        let mut err = Error::new(self.to_string());
        err = err.extend_with(|_err, e| {
            e.set("code", self.code());
        });
        match self {
            ApiError::InvalidInput(_) => {
                err = err.extend_with(|_err, e| {
                    e.set("type", "BAD_REQUEST");
                });
            }
            ApiError::Validation(fields) => {
                err = err.extend_with(|_err, e| {
                    let fields = fields
                        .iter()
                        .map(|(field, message)| (Name::new(field), Value::from(message.as_str())))
                        .collect();
                    e.set("fields", Value::Object(fields));
                });
            }
            _ => {}
        }
        err
    }
}

/// Convert any error into a GraphQL error payload while hiding internals.
pub fn internal_error(err: impl Into<anyhow::Error>) -> Error {
    ApiError::internal(err.into()).extend()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_are_masked() {
        let err = internal_error(anyhow::anyhow!("boom"));
        assert_eq!(err.message, "internal server error");
        let extra = err.extensions.as_ref().and_then(|map| map.get("code"));
        let code = extra.cloned();
        assert_eq!(code, Some(Value::from("INTERNAL")));
    }

    #[test]
    fn validation_errors_carry_field_messages() {
        let err = ApiError::validation([("name", "This field is required.")]).extend();
        let ext = err.extensions.as_ref().unwrap();
        assert_eq!(ext.get("code").cloned(), Some(Value::from("VALIDATION_FAILED")));
        let Some(Value::Object(fields)) = ext.get("fields").cloned() else {
            panic!("fields extension missing");
        };
        assert_eq!(
            fields.get("name").cloned(),
            Some(Value::from("This field is required."))
        );
    }
}
