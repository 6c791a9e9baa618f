use platform_db::DbError;
use thiserror::Error;

use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] DbError),
    #[error("failed to serialize roster: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("no employee is open for editing")]
    NotEditing,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ValidationErrors> for RosterError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

pub type RosterResult<T> = Result<T, RosterError>;
