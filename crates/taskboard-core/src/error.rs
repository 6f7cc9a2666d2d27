use thiserror::Error;

/// Input rejected before any mutation takes place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be blank")]
    EmptyName,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("subtasks in one batch must belong to the same task")]
    MixedOrigin,
}

#[derive(Error, Debug)]
pub enum TaskboardError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An arrangement batch does not belong to a single scope.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Drag session busy: {0}")]
    SessionBusy(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
