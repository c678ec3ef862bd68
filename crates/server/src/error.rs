use hyper::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Missing field required by the strategy: {0}")]
    MissingField(&'static str),
    #[error("No endpoint configured for {0}")]
    EndpointNotConfigured(&'static str),
    #[error("Invalid endpoint URI: {0}")]
    InvalidUri(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP status {status}: {context}")]
    Http { status: StatusCode, context: String },
    #[error("JSON parse error: {0}")]
    Json(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Attachment has no content")]
    MissingContent,
    #[error("Invalid base64 content: {0}")]
    Decode(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}
