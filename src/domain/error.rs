use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unconvertible timestamp: {0} ms")]
    Timestamp(i64),

    #[error("Scorer error: {0}")]
    Scorer(String),

    #[error("Notifier error: {0}")]
    Notifier(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Channel error: {0}")]
    Channel(String),
}

impl DomainError {
    /// Errors that will not go away by trying the same call again.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            DomainError::Timestamp(_) | DomainError::InvalidInput(_) | DomainError::NotFound(_)
        )
    }
}
