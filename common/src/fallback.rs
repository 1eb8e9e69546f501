//! 모델 폴백 결과 해석
//!
//! 제로샷 모델은 세 축의 라벨을 하나로 합친 후보 목록 전체에 대해 순위를 매긴다.
//! 전역 순위를 한 번 훑으면서 축마다 처음 만난 라벨을 채택하고, 이후에는 고정한다.
//! 한 번의 모델 호출로 세 축의 결정을 모두 얻는다.

use crate::taxonomy::{Dimension, Taxonomy};
use serde::{Deserialize, Serialize};

/// 모델 호출 실패 시 세 축에 기록하는 센티널 값
pub const API_TIMEOUT: &str = "API_TIMEOUT";

/// 모델이 반환한 (라벨, 점수)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLabel {
    pub label: String,
    pub score: f64,
}

impl RankedLabel {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// 모델 호출 결과 (예외 대신 명시적인 분기)
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutcome {
    /// 점수 내림차순 순위
    Ranked(Vec<RankedLabel>),
    /// 타임아웃, 응답 파싱 실패 등
    Failed { reason: String },
}

/// 한 축에 대한 모델의 선택
#[derive(Debug, Clone, PartialEq)]
pub struct ModelChoice {
    pub key: String,
    /// 순위에서 선택된 경우에만 존재
    pub score: Option<f64>,
}

/// 세 축에 대한 모델 판정
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackVerdict {
    pub choices: [ModelChoice; 3],
    /// 모델 호출이 실패해 센티널로 채워졌는지
    pub failed: bool,
    /// 분류 체계에 없는 라벨 (설정 오류 진단용)
    pub unmapped_labels: Vec<String>,
}

impl FallbackVerdict {
    pub fn choice(&self, dimension: Dimension) -> &ModelChoice {
        &self.choices[dimension_index(dimension)]
    }
}

fn dimension_index(dimension: Dimension) -> usize {
    match dimension {
        Dimension::Type => 0,
        Dimension::Topic => 1,
        Dimension::Method => 2,
    }
}

/// 모델 결과를 축별 판정으로 변환
pub fn resolve(outcome: &ModelOutcome, taxonomy: &Taxonomy) -> FallbackVerdict {
    let ranked = match outcome {
        ModelOutcome::Ranked(ranked) => ranked,
        ModelOutcome::Failed { .. } => {
            return FallbackVerdict {
                choices: Dimension::ALL.map(|_| ModelChoice {
                    key: API_TIMEOUT.to_string(),
                    score: None,
                }),
                failed: true,
                unmapped_labels: Vec::new(),
            };
        }
    };

    let mut picked: [Option<ModelChoice>; 3] = [None, None, None];
    let mut unmapped_labels = Vec::new();

    for entry in ranked {
        match taxonomy.lookup_label(&entry.label) {
            Some((dimension, key)) => {
                let slot = &mut picked[dimension_index(dimension)];
                if slot.is_none() {
                    *slot = Some(ModelChoice {
                        key: key.to_string(),
                        score: Some(entry.score),
                    });
                }
            }
            None => unmapped_labels.push(entry.label.clone()),
        }

        if picked.iter().all(Option::is_some) {
            break;
        }
    }

    let choices = Dimension::ALL.map(|dimension| {
        picked[dimension_index(dimension)]
            .take()
            .unwrap_or_else(|| ModelChoice {
                key: taxonomy.default_key(dimension).to_string(),
                score: None,
            })
    });

    FallbackVerdict {
        choices,
        failed: false,
        unmapped_labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::DimensionTaxonomy;

    fn test_taxonomy() -> Taxonomy {
        Taxonomy::new(
            DimensionTaxonomy::new()
                .with_category("question", "질문", &[])
                .with_category("experience", "경험 공유", &[]),
            DimensionTaxonomy::new()
                .with_category("phishing", "피싱", &[])
                .with_category("fraud", "사기", &[]),
            DimensionTaxonomy::new()
                .with_category("email", "이메일", &[])
                .with_category("sms", "SMS", &[]),
        )
        .unwrap()
    }

    #[test]
    fn test_first_label_per_dimension_is_frozen() {
        let taxonomy = test_taxonomy();
        let outcome = ModelOutcome::Ranked(vec![
            RankedLabel::new("SMS", 0.91),
            RankedLabel::new("경험 공유", 0.80),
            RankedLabel::new("이메일", 0.75),
            RankedLabel::new("사기", 0.60),
            RankedLabel::new("질문", 0.40),
            RankedLabel::new("피싱", 0.10),
        ]);

        let verdict = resolve(&outcome, &taxonomy);
        assert!(!verdict.failed);
        assert_eq!(verdict.choice(Dimension::Type).key, "experience");
        assert_eq!(verdict.choice(Dimension::Type).score, Some(0.80));
        assert_eq!(verdict.choice(Dimension::Topic).key, "fraud");
        assert_eq!(verdict.choice(Dimension::Method).key, "sms");
        assert_eq!(verdict.choice(Dimension::Method).score, Some(0.91));
    }

    #[test]
    fn test_empty_ranking_falls_back_to_first_declared() {
        let taxonomy = test_taxonomy();
        let verdict = resolve(&ModelOutcome::Ranked(Vec::new()), &taxonomy);
        assert!(!verdict.failed);
        assert_eq!(verdict.choice(Dimension::Type).key, "question");
        assert_eq!(verdict.choice(Dimension::Topic).key, "phishing");
        assert_eq!(verdict.choice(Dimension::Method).key, "email");
        assert!(verdict.choices.iter().all(|c| c.score.is_none()));
    }

    #[test]
    fn test_failure_yields_sentinel_everywhere() {
        let taxonomy = test_taxonomy();
        let outcome = ModelOutcome::Failed {
            reason: "timeout".to_string(),
        };
        let verdict = resolve(&outcome, &taxonomy);
        assert!(verdict.failed);
        for dimension in Dimension::ALL {
            assert_eq!(verdict.choice(dimension).key, API_TIMEOUT);
        }
    }

    #[test]
    fn test_unmapped_labels_are_skipped() {
        let taxonomy = test_taxonomy();
        let outcome = ModelOutcome::Ranked(vec![
            RankedLabel::new("오타난 라벨", 0.99),
            RankedLabel::new("질문", 0.50),
        ]);
        let verdict = resolve(&outcome, &taxonomy);
        assert_eq!(verdict.unmapped_labels, vec!["오타난 라벨".to_string()]);
        assert_eq!(verdict.choice(Dimension::Type).key, "question");
        assert_eq!(verdict.choice(Dimension::Type).score, Some(0.50));
        // 순위에 나타나지 않은 축은 기본 키, 점수 없음
        assert_eq!(verdict.choice(Dimension::Topic).key, "phishing");
        assert_eq!(verdict.choice(Dimension::Topic).score, None);
    }
}
