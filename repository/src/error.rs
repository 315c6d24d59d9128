use thiserror::Error;

use metrics_model::ErrorKind;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("metric not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("backup I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backup serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl RepositoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepositoryError::NotFound => ErrorKind::NotFound,
            _ => ErrorKind::Storage,
        }
    }
}
