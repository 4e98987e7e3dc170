use thiserror::Error;

/// Errors raised by store handles and the post repository.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller input was rejected before touching the store.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The execution context carries no binding under the requested name.
    #[error("Database binding not found: {name}")]
    BindingNotFound { name: String },

    /// The store could not be reached or refused the statement.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Remote store error: {0}")]
    Remote(#[from] reqwest::Error),

    /// A row came back in a shape that does not match the post model.
    #[error("Row decode error: {0}")]
    Decode(String),
}

impl StoreError {
    /// Short error code string for structured log fields.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Validation(_) => "VALIDATION_ERROR",
            StoreError::BindingNotFound { .. } => "BINDING_NOT_FOUND",
            StoreError::Unavailable(_) | StoreError::Sqlite(_) | StoreError::Remote(_) => {
                "STORE_UNAVAILABLE"
            }
            StoreError::Decode(_) => "DECODE_ERROR",
        }
    }

    /// True for errors the caller can fix by changing its input.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }

    /// True for connectivity / runtime failures of the backing store.
    pub fn is_unavailable(&self) -> bool {
        self.code() == "STORE_UNAVAILABLE"
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
