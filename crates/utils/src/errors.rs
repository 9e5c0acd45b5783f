use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// 通用应用错误
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    InternalServerErrorWithContext(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
