//! 에러 타입 정의

use thiserror::Error;

/// 공통 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Duplicate label '{label}' in {first} and {second}")]
    DuplicateLabel {
        label: String,
        first: String,
        second: String,
    },
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, Error>;
