//! Scam Triage Common Library
//!
//! 파일 I/O와 무관한 순수 로직: 분류 체계, 키워드 분류기, 모델 결과 해석, 레코드 병합

pub mod error;
pub mod fallback;
pub mod keyword;
pub mod record;
pub mod table;
pub mod taxonomy;

pub use error::{Error, Result};
pub use fallback::{resolve, FallbackVerdict, ModelChoice, ModelOutcome, RankedLabel, API_TIMEOUT};
pub use keyword::{classify, classify_all, KeywordMatch};
pub use record::{
    is_blank, is_marker_id, is_untrustworthy, result_columns, BatchMarker, ClassificationResult,
    DimensionResult, PostRecord, API_EVIDENCE, ID_COLUMN, POST_COLUMNS,
};
pub use table::{merge, merge_batch, Row, Table};
pub use taxonomy::{CategoryEntry, Dimension, DimensionConfig, DimensionTaxonomy, Taxonomy, TaxonomyConfig};
