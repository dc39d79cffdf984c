use thiserror::Error;

/// Fallback text shown when the backend gives us nothing readable.
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again later.";

/// Errors raised while talking to the marketplace backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Server rejected request ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// The line a user should see for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server { message, .. } => message.clone(),
            ApiError::Transport(_) => "Connection failed.".to_string(),
            ApiError::Decode(_) | ApiError::InvalidRequest(_) => GENERIC_FAILURE.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Server { status: 404, .. })
    }
}

/// Errors from a collection store task.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Store closed")]
    Closed,
    #[error("Store dropped the response")]
    Dropped,
    #[error("Mutation already in flight for {0}")]
    Busy(String),
}

/// Errors surfaced by an optimistic mutation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MutationError {
    #[error("Missing identifier: {0}")]
    MissingId(String),
    #[error("Already updating {0}")]
    Busy(String),
    #[error("Update failed: {0}")]
    Remote(ApiError),
    #[error("Store communication error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for MutationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Busy(id) => MutationError::Busy(id),
            other => MutationError::Store(other),
        }
    }
}

/// Errors around the persisted user session.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("This action requires a {expected} account, logged in as {actual}")]
    WrongRole { expected: String, actual: String },
    #[error("Session storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
    #[error("No data directory available for the session file")]
    NoDataDir,
}

/// Top-level error for CLI commands.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Validation(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
