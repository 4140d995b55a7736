use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("an I/O error occurred: {0}")]
    GenericIo(#[from] std::io::Error),

    #[error("failed to walk plugin directory: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("http client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("deserialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("invalid JSON in {}: {source}", path.display())]
    InvalidFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid hosting domain '{domain}': {source}")]
    InvalidDomain {
        domain: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to replace the catalog: {0}")]
    PersistError(#[from] tempfile::PersistError),

    #[error("background task failed: {0}")]
    TaskJoinError(#[from] tokio::task::JoinError),
}
