use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostsError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PostsError {
    /// Short error code string used in structured log fields.
    pub fn code(&self) -> &'static str {
        match self {
            PostsError::Config(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, PostsError>;
