use thiserror::Error;

/// Errors produced while scanning a single bucket or while the process is
/// getting set up. Each variant corresponds to one of the distinct error
/// kinds in the error handling design: callers match on these to decide
/// whether to skip a bucket, reject/ack a broker message, or abort the run.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid bucket name: {0}")]
    InvalidName(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("existence check failed for bucket '{bucket}': {source}")]
    Existence {
        bucket: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("permission scan failed for bucket '{bucket}' ({region}): {source}")]
    Permission {
        bucket: String,
        region: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("enumeration failed for bucket '{bucket}': {source}")]
    Enumerate {
        bucket: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("more than 5000 pages of objects found for bucket '{bucket}'; skipping")]
    PageCapExceeded { bucket: String },

    #[error("broker error: {0}")]
    Broker(#[from] lapin::Error),

    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
