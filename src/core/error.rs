use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Not authorized to perform '{task}' on {model}")]
    AuthorizationError { task: String, model: String },

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Write conflict: {0}")]
    WriteConflict(String),

    #[error("Deferred callback failed: {0}")]
    CallbackFailed(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl ModelError {
    /// Whether a transaction body failing with this error may be re-executed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::WriteConflict(_))
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

impl<T> From<std::sync::PoisonError<T>> for ModelError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
