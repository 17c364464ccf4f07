use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("llm extraction failed: {0}")]
    ExtractionFailed(String),
}

#[derive(Debug, Error)]
pub enum RecallError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("model request failed: {0}")]
    Model(String),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
