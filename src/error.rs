use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Store initialization failed: {0}")]
    Init(String),

    #[error("Query on '{collection}' failed: {source}")]
    Read {
        collection: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Batch commit failed: {0}")]
    Write(#[source] rusqlite::Error),

    #[error("Malformed document '{id}' in '{collection}': {reason}")]
    Decode {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Run exceeded timeout of {0:?}")]
    Timeout(std::time::Duration),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
