//! 분류 오케스트레이터
//!
//! 2단계 분류:
//! - 1단계 (키워드): 세 축 모두 키워드 분류기로 판정
//! - 2단계 (모델): 하나라도 매칭에 실패하면 레코드당 한 번만 모델을 호출하고,
//!   실패한 축만 모델 결과로 교체한다
//!
//! 모델 폴백을 쓰는 동안에는 레코드 사이에 최소 간격을 둔다.

mod rate_limit;

pub use rate_limit::RateLimiter;

use crate::error::Result;
use crate::model::{classify_with_model, ZeroShotModel};
use scam_triage_common::{
    classify_all, ClassificationResult, Dimension, DimensionResult, PostRecord, Taxonomy,
    API_EVIDENCE,
};
use std::time::Duration;
use tracing::debug;

pub struct Orchestrator<'a> {
    taxonomy: &'a Taxonomy,
    model: Option<&'a dyn ZeroShotModel>,
    limiter: RateLimiter,
    model_calls: usize,
}

impl<'a> Orchestrator<'a> {
    /// 모델이 있으면 폴백 사용, 없으면 키워드 전용
    pub fn new(
        taxonomy: &'a Taxonomy,
        model: Option<&'a dyn ZeroShotModel>,
        min_interval: Duration,
    ) -> Result<Self> {
        match model {
            Some(model) => Self::with_model(taxonomy, model, min_interval),
            None => Ok(Self::keyword_only(taxonomy)),
        }
    }

    /// 키워드 전용 (모델 호출 없음)
    pub fn keyword_only(taxonomy: &'a Taxonomy) -> Self {
        Self {
            taxonomy,
            model: None,
            limiter: RateLimiter::new(Duration::ZERO),
            model_calls: 0,
        }
    }

    /// 모델 폴백 사용. 빈 축이 있으면 ConfigurationError
    pub fn with_model(
        taxonomy: &'a Taxonomy,
        model: &'a dyn ZeroShotModel,
        min_interval: Duration,
    ) -> Result<Self> {
        taxonomy.ensure_fallback_ready()?;
        Ok(Self {
            taxonomy,
            model: Some(model),
            limiter: RateLimiter::new(min_interval),
            model_calls: 0,
        })
    }

    pub fn fallback_enabled(&self) -> bool {
        self.model.is_some()
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        self.taxonomy
    }

    /// 지금까지의 모델 호출 횟수
    pub fn model_calls(&self) -> usize {
        self.model_calls
    }

    /// 게시글 하나를 분류. 배치 마커는 빈 결과
    pub async fn classify_record(&mut self, post: &PostRecord) -> Result<ClassificationResult> {
        if post.is_marker() {
            return Ok(ClassificationResult::empty());
        }

        if self.model.is_some() {
            self.limiter.wait().await;
        }

        let text = post.classification_text();
        let keyword_matches = classify_all(&text, self.taxonomy);

        let mut result = ClassificationResult::default();
        for (dimension, found) in Dimension::ALL.iter().zip(&keyword_matches) {
            *result.get_mut(*dimension) = DimensionResult {
                value: found.key.clone(),
                evidence: found.evidence.clone(),
                score: None,
            };
        }

        let failed: Vec<Dimension> = Dimension::ALL
            .iter()
            .zip(&keyword_matches)
            .filter(|(_, found)| !found.matched)
            .map(|(dimension, _)| *dimension)
            .collect();

        let model = match self.model {
            Some(model) if !failed.is_empty() && !text.is_empty() => model,
            _ => return Ok(result),
        };

        debug!(id = %post.id, failed = ?failed, "키워드 매칭 실패, 모델 분류 사용");
        self.model_calls += 1;
        let verdict = match classify_with_model(&text, self.taxonomy, model).await? {
            Some(verdict) => verdict,
            None => return Ok(result),
        };

        for dimension in failed {
            let choice = verdict.choice(dimension);
            *result.get_mut(dimension) = DimensionResult {
                value: choice.key.clone(),
                evidence: API_EVIDENCE.to_string(),
                score: choice.score,
            };
        }

        Ok(result)
    }
}
