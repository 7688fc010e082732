use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("data source error: {0}")]
    DataSource(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("sync task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
