use thiserror::Error;

/// Failures on the transform path. All of them end in a 403 plain-text
/// response whose body is the `Display` output.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("file format is not jpeg but: {format}")]
    UnsupportedFormat { format: String },
    #[error("could not fetch {uri}: {source}")]
    Fetch {
        uri: String,
        #[source]
        source: FetchError,
    },
    #[error("image could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image could not be resized: {0}")]
    Resize(String),
    #[error("image could not be encoded: {0}")]
    Encode(String),
    #[error("transform task failed: {0}")]
    Task(String),
}

/// Object store failures.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("object not found")]
    NotFound,
    #[error("storage responded with status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Request(String),
}

/// Raised when the origin host is not a storage host. This is a hard fault:
/// the invocation fails instead of producing a response.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid S3 hostname: {hostname}")]
pub struct FatalHostnameError {
    pub hostname: String,
}
