//! 게시글 레코드와 분류 결과
//!
//! - PostRecord: 분류에 필요한 필드만 꺼낸 게시글 보기
//! - ClassificationResult: 세 축의 값, 매칭 키워드, 모델 점수
//! - BatchMarker: 크롤링 배치 시작을 나타내는 `date:<YYYY-MM-DD>` 행

use crate::fallback::API_TIMEOUT;
use crate::table::{value, Row};
use crate::taxonomy::Dimension;

pub const ID_COLUMN: &str = "id";
pub const TITLE_COLUMN: &str = "title";
pub const CONTENT_COLUMN: &str = "content";
pub const ENG_TITLE_COLUMN: &str = "Eng_title";
pub const ENG_CONTENTS_COLUMN: &str = "Eng_Contents";

/// 저장소 파일의 게시글 컬럼 (크롤러 스키마)
pub const POST_COLUMNS: &[&str] = &[
    ID_COLUMN,
    TITLE_COLUMN,
    CONTENT_COLUMN,
    ENG_TITLE_COLUMN,
    ENG_CONTENTS_COLUMN,
    "image_urls",
    "url",
    "keyword",
    "crawled_at",
];

/// 배치 마커 id 접두사
pub const MARKER_PREFIX: &str = "date:";

/// 모델이 값을 채웠을 때 매칭 키워드 컬럼에 기록하는 값
pub const API_EVIDENCE: &str = "API";

/// 재분류 대상이 되는 저장값 (소문자 비교)
const UNTRUSTWORTHY_VALUES: &[&str] = &["", "nan", "unclear", "unknown"];

/// 빈 값 판정: 빈 문자열, 공백만, `nan`
pub fn is_blank(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}

/// 배치 마커 id 판정
pub fn is_marker_id(id: &str) -> bool {
    id.trim().starts_with(MARKER_PREFIX)
}

/// 저장된 분류 값이 신뢰할 수 없는 자리표시자인지
pub fn is_untrustworthy(value: &str) -> bool {
    let lowered = value.trim().to_lowercase();
    UNTRUSTWORTHY_VALUES.contains(&lowered.as_str()) || value.trim() == API_TIMEOUT
}

/// 결과 컬럼 전체 (축 순서대로 값, 매칭 키워드, 점수)
pub fn result_columns() -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = Dimension::ALL.iter().map(|d| d.column()).collect();
    columns.extend(Dimension::ALL.iter().map(|d| d.evidence_column()));
    columns.extend(Dimension::ALL.iter().map(|d| d.score_column()));
    columns
}

/// 배치 마커
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchMarker {
    id: String,
}

impl BatchMarker {
    /// `date`는 `YYYY-MM-DD` 형식
    pub fn new(date: impl AsRef<str>) -> Self {
        Self {
            id: format!("{}{}", MARKER_PREFIX, date.as_ref()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `id` 외의 컬럼은 모두 비어 있는 행
    pub fn row(&self) -> Row {
        let mut row = Row::new();
        row.insert(ID_COLUMN.to_string(), self.id.clone());
        row
    }
}

/// 분류에 쓰이는 게시글 필드
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub eng_title: String,
    pub eng_contents: String,
}

impl PostRecord {
    /// 행에서 읽는다. 없는 컬럼은 빈 값으로 취급
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: value(row, ID_COLUMN).trim().to_string(),
            title: value(row, TITLE_COLUMN).to_string(),
            content: value(row, CONTENT_COLUMN).to_string(),
            eng_title: value(row, ENG_TITLE_COLUMN).to_string(),
            eng_contents: value(row, ENG_CONTENTS_COLUMN).to_string(),
        }
    }

    pub fn is_marker(&self) -> bool {
        is_marker_id(&self.id)
    }

    /// 분류 대상 텍스트
    ///
    /// 한국어 `title + " " + content`를 우선하고, 둘 다 비어 있으면
    /// 영어 번역 `Eng_title + " " + Eng_Contents`를 쓴다
    pub fn classification_text(&self) -> String {
        let korean = join_non_blank(&[self.title.as_str(), self.content.as_str()]);
        if !korean.is_empty() {
            return korean;
        }
        join_non_blank(&[self.eng_title.as_str(), self.eng_contents.as_str()])
    }
}

fn join_non_blank(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !is_blank(p))
        .map(|p| p.trim())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 한 축의 분류 값
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionResult {
    /// 카테고리 키
    pub value: String,
    /// 매칭 패턴, `API`, 또는 빈 문자열
    pub evidence: String,
    /// 모델이 값을 채운 경우의 점수
    pub score: Option<f64>,
}

/// 게시글 하나의 분류 결과
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationResult {
    pub scam_type: DimensionResult,
    pub scam_topic: DimensionResult,
    pub scam_method: DimensionResult,
}

impl ClassificationResult {
    /// 배치 마커용: 모든 필드가 빈 결과
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, dimension: Dimension) -> &DimensionResult {
        match dimension {
            Dimension::Type => &self.scam_type,
            Dimension::Topic => &self.scam_topic,
            Dimension::Method => &self.scam_method,
        }
    }

    pub fn get_mut(&mut self, dimension: Dimension) -> &mut DimensionResult {
        match dimension {
            Dimension::Type => &mut self.scam_type,
            Dimension::Topic => &mut self.scam_topic,
            Dimension::Method => &mut self.scam_method,
        }
    }

    /// 저장된 결과를 읽는다. 구 스키마 컬럼 이름도 받아들인다
    pub fn from_row(row: &Row) -> Self {
        let mut result = Self::default();
        for dimension in Dimension::ALL {
            let (legacy_value, legacy_evidence) = dimension.legacy_columns();
            let slot = result.get_mut(dimension);
            slot.value = first_present(row, &[dimension.column(), legacy_value]);
            slot.evidence = first_present(row, &[dimension.evidence_column(), legacy_evidence]);
            slot.score = value(row, dimension.score_column()).trim().parse().ok();
        }
        result
    }

    /// 세 축 모두 값이 있고 자리표시자가 아니면 신뢰 가능 (재분류 생략)
    pub fn is_trustworthy(&self) -> bool {
        Dimension::ALL
            .iter()
            .all(|d| !is_untrustworthy(&self.get(*d).value))
    }

    /// 결과 컬럼을 행에 기록
    pub fn apply_to(&self, row: &mut Row) {
        for dimension in Dimension::ALL {
            let slot = self.get(dimension);
            row.insert(dimension.column().to_string(), slot.value.clone());
            row.insert(dimension.evidence_column().to_string(), slot.evidence.clone());
            row.insert(
                dimension.score_column().to_string(),
                slot.score.map(|s| format!("{:.4}", s)).unwrap_or_default(),
            );
        }
    }
}

fn first_present(row: &Row, columns: &[&str]) -> String {
    columns
        .iter()
        .filter_map(|c| row.get(*c))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("   \t"));
        assert!(is_blank("nan"));
        assert!(is_blank("NaN"));
        assert!(!is_blank("0"));
        assert!(!is_blank("본문"));
    }

    #[test]
    fn test_marker() {
        let marker = BatchMarker::new("2024-01-01");
        assert_eq!(marker.id(), "date:2024-01-01");
        assert!(is_marker_id(marker.id()));
        assert!(!is_marker_id("12345"));
        assert_eq!(marker.row().len(), 1);
    }

    #[test]
    fn test_classification_text_prefers_korean() {
        let post = PostRecord {
            title: "제목".into(),
            content: "본문".into(),
            eng_title: "Title".into(),
            ..Default::default()
        };
        assert_eq!(post.classification_text(), "제목 본문");
    }

    #[test]
    fn test_classification_text_falls_back_to_english() {
        let post = PostRecord {
            title: "  ".into(),
            content: "nan".into(),
            eng_title: "Phishing".into(),
            eng_contents: "mail".into(),
            ..Default::default()
        };
        assert_eq!(post.classification_text(), "Phishing mail");
    }

    #[test]
    fn test_classification_text_only_content() {
        let post = PostRecord {
            content: "본문만".into(),
            ..Default::default()
        };
        assert_eq!(post.classification_text(), "본문만");
    }

    #[test]
    fn test_untrustworthy_values() {
        for v in ["", " ", "nan", "unclear", "Unknown", "API_TIMEOUT"] {
            assert!(is_untrustworthy(v), "{:?} should be untrustworthy", v);
        }
        assert!(!is_untrustworthy("fraud"));
    }

    #[test]
    fn test_trustworthy_requires_all_dimensions() {
        let stored = row(&[
            ("scam_type", "warning"),
            ("scam_topic", "unclear"),
            ("scam_method", "sms"),
        ]);
        assert!(!ClassificationResult::from_row(&stored).is_trustworthy());

        let missing = row(&[("scam_type", "warning"), ("scam_topic", "fraud")]);
        assert!(!ClassificationResult::from_row(&missing).is_trustworthy());

        let complete = row(&[
            ("scam_type", "warning"),
            ("scam_topic", "fraud"),
            ("scam_method", "phone+sms"),
        ]);
        assert!(ClassificationResult::from_row(&complete).is_trustworthy());
    }

    #[test]
    fn test_legacy_columns_accepted() {
        let stored = row(&[
            ("type", "question"),
            ("matched_type_keyword", "궁금"),
            ("scam_topic", "fraud"),
            ("matched_topic_keyword", "사기"),
            ("scam_method", "sms"),
            ("matched_method_keyword", "API"),
        ]);
        let result = ClassificationResult::from_row(&stored);
        assert_eq!(result.scam_type.value, "question");
        assert_eq!(result.scam_type.evidence, "궁금");
        assert_eq!(result.scam_method.evidence, "API");
        assert!(result.is_trustworthy());
    }

    #[test]
    fn test_apply_to_round_trip() {
        let result = ClassificationResult {
            scam_type: DimensionResult {
                value: "warning".into(),
                evidence: API_EVIDENCE.into(),
                score: Some(0.8123),
            },
            scam_topic: DimensionResult {
                value: "fraud".into(),
                evidence: "사기".into(),
                score: None,
            },
            scam_method: DimensionResult {
                value: "phone+sms".into(),
                evidence: "문자+전화".into(),
                score: None,
            },
        };
        let mut target = row(&[("id", "1")]);
        result.apply_to(&mut target);
        assert_eq!(value(&target, "scam_type_score"), "0.8123");
        assert_eq!(value(&target, "scam_topic_score"), "");
        assert_eq!(ClassificationResult::from_row(&target), result);
    }

    #[test]
    fn test_result_columns() {
        let columns = result_columns();
        assert_eq!(columns.len(), 9);
        assert_eq!(columns[0], "scam_type");
        assert_eq!(columns[3], "matched_scam_type_keyword");
        assert_eq!(columns[8], "scam_method_score");
    }
}
