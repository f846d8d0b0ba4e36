use thiserror::Error;

/// Errors that can occur while resolving mentions.
#[derive(Error, Debug)]
pub enum MentionGraphError {
    #[error("invalid url: {message} (input: {input})")]
    InvalidUrl { message: String, input: String },

    #[error("database error: {message} (operation: {operation})")]
    Database { message: String, operation: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("fixture error: {message}")]
    Fixture { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("libsql error: {0}")]
    Libsql(#[from] libsql::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results using `MentionGraphError`.
pub type Result<T> = std::result::Result<T, MentionGraphError>;
