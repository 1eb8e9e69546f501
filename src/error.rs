use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("설정 오류: {0}")]
    Config(String),

    #[error(transparent)]
    Common(#[from] scam_triage_common::Error),

    #[error("파일을 찾을 수 없습니다: {0}")]
    FileNotFound(String),

    #[error("인코딩을 판별할 수 없습니다: {path} (시도: {tried})")]
    InputDecoding { path: String, tried: String },

    #[error("필수 컬럼 'id'가 없습니다: {0}")]
    MissingIdColumn(String),

    #[error("모델 추론 실패: {0}")]
    InferenceFailure(String),

    #[error("날짜 형식이 올바르지 않습니다 (YYYY-MM-DD): {0}")]
    InvalidDate(String),

    #[error("CSV 오류: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML 파싱 오류: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON 파싱 오류: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP 오류: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO 오류: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TriageError>;
