//! 분류 체계(Taxonomy) 모듈
//!
//! 세 개의 분류 축(type / topic / method)마다 카테고리 키, 사람이 읽는 라벨,
//! 키워드 패턴 목록을 보관한다. 실행 시작 시 한 번 만들어지고 이후에는 변경되지 않는다.
//!
//! 카테고리 선언 순서는 의미가 있다:
//! - 키워드 분류기는 선언 순서대로 첫 번째 매칭을 채택한다
//! - 매칭이 없을 때의 기본값은 첫 번째로 선언된 키다
//!
//! 설정 파일에서 키 순서를 바꾸면 기본 분류 결과도 바뀐다.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 분류 축
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Type,
    Topic,
    Method,
}

impl Dimension {
    /// 고정 처리 순서 (type, topic, method)
    pub const ALL: [Dimension; 3] = [Dimension::Type, Dimension::Topic, Dimension::Method];

    /// 결과 컬럼 이름
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Type => "scam_type",
            Dimension::Topic => "scam_topic",
            Dimension::Method => "scam_method",
        }
    }

    /// 매칭 키워드 컬럼 이름
    pub fn evidence_column(&self) -> &'static str {
        match self {
            Dimension::Type => "matched_scam_type_keyword",
            Dimension::Topic => "matched_scam_topic_keyword",
            Dimension::Method => "matched_scam_method_keyword",
        }
    }

    /// 모델 신뢰도 컬럼 이름
    pub fn score_column(&self) -> &'static str {
        match self {
            Dimension::Type => "scam_type_score",
            Dimension::Topic => "scam_topic_score",
            Dimension::Method => "scam_method_score",
        }
    }

    /// 구 스키마 파일에서 쓰이던 컬럼 이름 (결과, 매칭 키워드)
    pub fn legacy_columns(&self) -> (&'static str, &'static str) {
        match self {
            Dimension::Type => ("type", "matched_type_keyword"),
            Dimension::Topic => ("scam_topic", "matched_topic_keyword"),
            Dimension::Method => ("scam_method", "matched_method_keyword"),
        }
    }

    /// 복수 라벨 허용 여부 (method만 `+` 결합)
    pub fn is_multi_label(&self) -> bool {
        matches!(self, Dimension::Method)
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// 카테고리 하나: 라벨과 키워드 패턴
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub label: String,
    pub patterns: Vec<String>,
}

/// 한 분류 축의 카테고리 표 (선언 순서 유지)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionTaxonomy {
    categories: IndexMap<String, CategoryEntry>,
}

impl DimensionTaxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    /// 카테고리 추가. 같은 키가 이미 있으면 라벨과 패턴을 교체하되 선언 위치는 유지한다
    pub fn with_category<S: Into<String>>(mut self, key: S, label: S, patterns: &[&str]) -> Self {
        self.insert(
            key.into(),
            CategoryEntry {
                label: label.into(),
                patterns: patterns.iter().map(|p| p.to_string()).collect(),
            },
        );
        self
    }

    pub fn insert(&mut self, key: String, entry: CategoryEntry) {
        self.categories.insert(key, entry);
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// 선언 순서대로 키 목록
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(|k| k.as_str())
    }

    /// 선언 순서대로 (키, 카테고리)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryEntry)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 구조적 기본값: 첫 번째로 선언된 키
    pub fn default_key(&self) -> Option<&str> {
        self.categories.keys().next().map(|k| k.as_str())
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.categories.get(key).map(|e| e.label.as_str())
    }

    pub fn key_for_label(&self, label: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|(_, e)| e.label == label)
            .map(|(k, _)| k.as_str())
    }

    /// 선언 순서대로 라벨 목록
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.categories.values().map(|e| e.label.as_str())
    }
}

/// 설정 파일의 한 분류 축 (`categories` + `patterns`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DimensionConfig {
    /// 키 → 라벨 (순서 유지)
    #[serde(default)]
    pub categories: IndexMap<String, String>,
    /// 키 → 패턴 목록
    #[serde(default)]
    pub patterns: IndexMap<String, Vec<String>>,
}

impl From<DimensionConfig> for DimensionTaxonomy {
    fn from(config: DimensionConfig) -> Self {
        let DimensionConfig {
            categories,
            mut patterns,
        } = config;

        let mut dimension = DimensionTaxonomy::new();
        for (key, label) in categories {
            let key_patterns = patterns.shift_remove(&key).unwrap_or_default();
            dimension.insert(
                key,
                CategoryEntry {
                    label,
                    patterns: key_patterns,
                },
            );
        }

        // 라벨 없이 패턴만 선언된 키는 키 자체를 라벨로 사용
        for (key, key_patterns) in patterns {
            dimension.insert(
                key.clone(),
                CategoryEntry {
                    label: key,
                    patterns: key_patterns,
                },
            );
        }

        dimension
    }
}

/// 설정 파일의 `text_classification` 섹션
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    #[serde(rename = "type", alias = "scam_type", default)]
    pub scam_type: Option<DimensionConfig>,
    #[serde(default)]
    pub scam_topic: Option<DimensionConfig>,
    #[serde(default)]
    pub scam_method: Option<DimensionConfig>,
}

/// 세 분류 축 전체
#[derive(Debug, Clone)]
pub struct Taxonomy {
    scam_type: DimensionTaxonomy,
    scam_topic: DimensionTaxonomy,
    scam_method: DimensionTaxonomy,
    /// 라벨 → (축, 키)
    label_index: HashMap<String, (Dimension, String)>,
}

impl Taxonomy {
    /// 세 축으로 분류 체계를 만든다. 라벨이 축을 넘어 중복되면 에러
    pub fn new(
        scam_type: DimensionTaxonomy,
        scam_topic: DimensionTaxonomy,
        scam_method: DimensionTaxonomy,
    ) -> Result<Self> {
        let taxonomy = Self::assemble(scam_type, scam_topic, scam_method);
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// 설정 섹션에서 생성. 누락된 축은 빈 축으로 둔다
    pub fn from_config(config: TaxonomyConfig) -> Result<Self> {
        Self::new(
            config.scam_type.map(Into::into).unwrap_or_default(),
            config.scam_topic.map(Into::into).unwrap_or_default(),
            config.scam_method.map(Into::into).unwrap_or_default(),
        )
    }

    /// JSON 문자열에서 생성
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TaxonomyConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    fn assemble(
        scam_type: DimensionTaxonomy,
        scam_topic: DimensionTaxonomy,
        scam_method: DimensionTaxonomy,
    ) -> Self {
        let mut label_index = HashMap::new();
        for (dimension, table) in [
            (Dimension::Type, &scam_type),
            (Dimension::Topic, &scam_topic),
            (Dimension::Method, &scam_method),
        ] {
            for (key, entry) in table.iter() {
                label_index
                    .entry(entry.label.clone())
                    .or_insert_with(|| (dimension, key.to_string()));
            }
        }

        Self {
            scam_type,
            scam_topic,
            scam_method,
            label_index,
        }
    }

    /// 라벨이 세 축 전체에서 유일한지 검사
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashMap<&str, String> = HashMap::new();
        for dimension in Dimension::ALL {
            for (key, entry) in self.dimension(dimension).iter() {
                let owner = format!("{}.{}", dimension, key);
                if let Some(first) = seen.get(entry.label.as_str()) {
                    return Err(Error::DuplicateLabel {
                        label: entry.label.clone(),
                        first: first.clone(),
                        second: owner,
                    });
                }
                seen.insert(entry.label.as_str(), owner);
            }
        }
        Ok(())
    }

    pub fn dimension(&self, dimension: Dimension) -> &DimensionTaxonomy {
        match dimension {
            Dimension::Type => &self.scam_type,
            Dimension::Topic => &self.scam_topic,
            Dimension::Method => &self.scam_method,
        }
    }

    /// 축의 기본 키 (빈 축이면 빈 문자열)
    pub fn default_key(&self, dimension: Dimension) -> &str {
        self.dimension(dimension).default_key().unwrap_or("")
    }

    /// 모델 후보 라벨: type → topic → method 순, 축 안에서는 선언 순서
    pub fn candidate_labels(&self) -> Vec<String> {
        Dimension::ALL
            .iter()
            .flat_map(|d| self.dimension(*d).labels())
            .map(|l| l.to_string())
            .collect()
    }

    /// 라벨을 (축, 키)로 역변환
    pub fn lookup_label(&self, label: &str) -> Option<(Dimension, &str)> {
        self.label_index
            .get(label)
            .map(|(dimension, key)| (*dimension, key.as_str()))
    }

    /// 모델 폴백에 필요한 조건: 세 축 모두 비어 있지 않을 것
    pub fn ensure_fallback_ready(&self) -> Result<()> {
        for dimension in Dimension::ALL {
            if self.dimension(dimension).is_empty() {
                return Err(Error::Configuration(format!(
                    "{} 분류 항목이 비어 있어 모델 분류를 사용할 수 없습니다",
                    dimension
                )));
            }
        }
        Ok(())
    }

    /// 내장 기본 분류 체계
    ///
    /// 패턴은 부분 문자열로 비교한다. `\?$`도 정규식이 아니라 글자 그대로의 패턴이다.
    /// topic과 method의 `other` 라벨은 축 사이에서 겹치지 않도록 "기타 주제", "기타 수단"으로 둔다
    pub fn builtin() -> Self {
        let scam_type = DimensionTaxonomy::new()
            .with_category(
                "question",
                "질문, 확인 요청",
                &[
                    r"\?$", "질문", "궁금", "어떻게", "무엇", "어디", "언제", "왜", "어떤",
                    "help", "question", "how", "what", "where", "when", "why", "which",
                    "도와주세요", "알려주세요", "확인", "요청",
                ],
            )
            .with_category(
                "warning",
                "경고, 주의 환기",
                &[
                    "주의", "경고", "조심", "위험", "피해", "사기", "scam", "fraud", "warning",
                    "caution", "danger", "risk", "주의사항", "알림",
                ],
            )
            .with_category(
                "experience",
                "경험 공유 (피해담/사례 등)",
                &[
                    "경험", "사례", "피해", "당했다", "받았다", "겪었다", "발생", "발견",
                    "experience", "case", "story", "happened", "received", "found",
                    "당했어", "받았어", "겪었어", "생겼어", "발견했어",
                ],
            )
            .with_category(
                "advice",
                "해결 방법, 조언",
                &[
                    "조언", "해결", "방법", "팁", "도움", "가이드", "해결책", "advice",
                    "solution", "method", "tip", "help", "guide", "이렇게 하세요",
                    "다음과 같이", "권장", "추천",
                ],
            )
            .with_category(
                "discussion",
                "일반적 논의, 잡담",
                &[
                    "토론", "논의", "잡담", "이야기", "얘기", "대화", "소통", "discussion",
                    "talk", "chat", "conversation", "story", "생각", "의견", "느낌", "느껴",
                    "생각해",
                ],
            );

        let scam_topic = DimensionTaxonomy::new()
            .with_category(
                "phishing",
                "피싱",
                &[
                    "phishing", "피싱", "사기", "scam", "fraud", "속임수", "속인주소", "속인메일",
                    "속인전화",
                ],
            )
            .with_category(
                "identity_theft",
                "신원 도용",
                &["identity_theft", "신원도용", "신원탈취", "신원사칭", "신원조작", "신원변조"],
            )
            .with_category(
                "fraud",
                "사기",
                &["fraud", "사기", "scam", "속임수", "속인주소", "속인메일", "속인전화"],
            )
            .with_category(
                "other",
                "기타 주제",
                &[
                    "other", "기타", "기타사기", "기타사칭", "기타속임수", "기타속인주소",
                    "기타속인메일", "기타속인전화",
                ],
            );

        let scam_method = DimensionTaxonomy::new()
            .with_category(
                "email",
                "이메일",
                &[
                    "email", "이메일", "메일", "메일주소", "메일주소입력", "메일주소입력필드",
                    "메일주소입력필드입력",
                ],
            )
            .with_category(
                "sms",
                "SMS",
                &["sms", "sms메시지", "sms메시지입력", "sms메시지입력필드", "sms메시지입력필드입력"],
            )
            .with_category(
                "phone",
                "전화",
                &[
                    "phone", "전화", "전화번호", "전화번호입력", "전화번호입력필드",
                    "전화번호입력필드입력",
                ],
            )
            .with_category(
                "website",
                "웹사이트",
                &[
                    "website", "웹사이트", "웹사이트주소", "웹사이트주소입력",
                    "웹사이트주소입력필드", "웹사이트주소입력필드입력",
                ],
            )
            .with_category(
                "app",
                "앱",
                &["app", "앱", "앱설치", "앱다운로드", "앱다운로드필드", "앱다운로드필드입력"],
            )
            .with_category(
                "other",
                "기타 수단",
                &["other", "기타", "기타방법", "기타방식", "기타수단", "기타수단사용"],
            );

        Self::assemble(scam_type, scam_topic, scam_method)
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}
