//! 키워드 분류기
//!
//! 텍스트를 소문자로 바꾼 뒤 패턴의 부분 문자열 포함 여부로 분류한다.
//! - 단일 라벨 축(type, topic): 선언 순서상 첫 매칭에서 즉시 종료
//! - 복수 라벨 축(method): 매칭된 카테고리를 모두 모아 정렬 후 `+`로 결합
//!
//! 외부 호출이 없는 순수 함수다.

use crate::taxonomy::{Dimension, DimensionTaxonomy, Taxonomy};
use std::collections::BTreeSet;

/// 복수 라벨 결합 구분자
pub const MULTI_LABEL_SEPARATOR: &str = "+";

/// 키워드 분류 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    /// 카테고리 키 (method는 `+` 결합 가능)
    pub key: String,
    /// 패턴 매칭 여부
    pub matched: bool,
    /// 매칭된 패턴 (매칭 실패 시 빈 문자열)
    pub evidence: String,
}

impl KeywordMatch {
    fn unmatched(default_key: &str) -> Self {
        Self {
            key: default_key.to_string(),
            matched: false,
            evidence: String::new(),
        }
    }
}

/// 한 축에 대해 텍스트를 분류
pub fn classify(text: &str, taxonomy: &Taxonomy, dimension: Dimension) -> KeywordMatch {
    classify_with(
        text,
        taxonomy.dimension(dimension),
        dimension.is_multi_label(),
    )
}

/// 세 축 모두 분류 (type, topic, method 순)
pub fn classify_all(text: &str, taxonomy: &Taxonomy) -> [KeywordMatch; 3] {
    Dimension::ALL.map(|dimension| classify(text, taxonomy, dimension))
}

/// 카테고리 표 하나에 대해 분류
pub fn classify_with(text: &str, categories: &DimensionTaxonomy, multi: bool) -> KeywordMatch {
    let default_key = categories.default_key().unwrap_or("");

    if text.trim().is_empty() {
        return KeywordMatch::unmatched(default_key);
    }

    let text = text.to_lowercase();

    if !multi {
        for (key, entry) in categories.iter() {
            for pattern in &entry.patterns {
                if pattern_hits(&text, pattern) {
                    return KeywordMatch {
                        key: key.to_string(),
                        matched: true,
                        evidence: pattern.clone(),
                    };
                }
            }
        }
        return KeywordMatch::unmatched(default_key);
    }

    let mut matched_keys = BTreeSet::new();
    let mut matched_patterns = BTreeSet::new();
    for (key, entry) in categories.iter() {
        for pattern in &entry.patterns {
            if pattern_hits(&text, pattern) {
                matched_keys.insert(key);
                matched_patterns.insert(pattern.as_str());
            }
        }
    }

    if matched_keys.is_empty() {
        return KeywordMatch::unmatched(default_key);
    }

    KeywordMatch {
        key: join_sorted(matched_keys),
        matched: true,
        evidence: join_sorted(matched_patterns),
    }
}

fn pattern_hits(lowered_text: &str, pattern: &str) -> bool {
    // 빈 패턴은 모든 텍스트에 매칭되므로 무시
    !pattern.is_empty() && lowered_text.contains(&pattern.to_lowercase())
}

fn join_sorted(items: BTreeSet<&str>) -> String {
    items.into_iter().collect::<Vec<_>>().join(MULTI_LABEL_SEPARATOR)
}
