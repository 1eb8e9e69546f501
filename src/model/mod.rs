//! 제로샷 분류 모델 연동
//!
//! 모델 호출은 `ZeroShotModel` 트레이트 뒤에 둔다. 실제 구현은 Hugging Face
//! Inference API이고, 테스트에서는 메모리 안의 가짜 모델로 바꿔 끼운다.

mod huggingface;

pub use huggingface::HuggingFaceClient;

use crate::error::Result;
use async_trait::async_trait;
use scam_triage_common::{resolve, FallbackVerdict, ModelOutcome, RankedLabel, Taxonomy};
use tracing::{debug, warn};

/// 모델 추론 요청
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    pub text: String,
    /// 순서가 있는 후보 라벨 전체
    pub candidate_labels: Vec<String>,
    /// 라벨별 독립 점수 여부 (softmax 하나가 아니라)
    pub multi_label: bool,
}

/// 제로샷 분류 모델
#[async_trait]
pub trait ZeroShotModel: Send + Sync {
    /// 후보 라벨 전체에 대한 (라벨, 점수) 순위를 점수 내림차순으로 반환
    async fn rank(&self, request: &InferenceRequest) -> Result<Vec<RankedLabel>>;
}

/// 모델로 세 축을 한 번에 분류
///
/// - 빈 텍스트면 None
/// - 모델 호출 에러는 `ModelOutcome::Failed`로 바꿔 센티널 판정을 돌려준다
pub async fn classify_with_model(
    text: &str,
    taxonomy: &Taxonomy,
    model: &dyn ZeroShotModel,
) -> Result<Option<FallbackVerdict>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    taxonomy.ensure_fallback_ready()?;

    let request = InferenceRequest {
        text: text.to_string(),
        candidate_labels: taxonomy.candidate_labels(),
        multi_label: true,
    };

    let outcome = match model.rank(&request).await {
        Ok(ranked) => {
            debug!(labels = ranked.len(), "모델 순위 수신");
            ModelOutcome::Ranked(ranked)
        }
        Err(e) => {
            warn!(error = %e, "모델 분류 실패, API_TIMEOUT 으로 기록");
            ModelOutcome::Failed {
                reason: e.to_string(),
            }
        }
    };

    let verdict = resolve(&outcome, taxonomy);
    if !verdict.unmapped_labels.is_empty() {
        warn!(labels = ?verdict.unmapped_labels, "분류 체계에 없는 라벨을 무시했습니다");
    }
    Ok(Some(verdict))
}
