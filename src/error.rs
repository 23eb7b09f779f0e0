//! Engine error type

use uuid::Uuid;

use crate::domain::EntityKind;
use crate::store::StoreError;

/// Errors returned by the progression, quest and challenge components.
///
/// None of these are retried internally.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A fetch or commit failed. Only the attempted mutation is lost.
    #[error("persistence failure: {0}")]
    PersistenceFailure(#[source] StoreError),

    /// The referenced entity is no longer present. Callers may treat this as
    /// already satisfied for delete and complete.
    #[error("{kind} not found")]
    NotFound { kind: EntityKind, id: Option<Uuid> },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl EngineError {
    pub fn not_found(kind: EntityKind, id: Uuid) -> Self {
        Self::NotFound { kind, id: Some(id) }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { kind, id } => Self::not_found(kind, id),
            other => Self::PersistenceFailure(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
