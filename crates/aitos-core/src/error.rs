use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("could not determine {0} directory")]
    DirNotFound(&'static str),

    #[error("{0} is not configured: set an API key first")]
    ProviderNotConfigured(&'static str),

    #[error("storage lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
