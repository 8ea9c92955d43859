/// Pipeline failure classes. Each variant has a defined blast radius:
/// `Upstream` aborts the current fetch cycle, `MalformedRecord` skips one
/// record, `StoreWrite` skips one alert, `Publish` skips one message,
/// `Config` is fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("upstream unavailable: {0}")]
    Upstream(String),
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    #[error("store write failed: {0}")]
    StoreWrite(#[from] sqlx::Error),
    #[error("publish failed: {0}")]
    Publish(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Upstream(err.to_string())
    }
}
