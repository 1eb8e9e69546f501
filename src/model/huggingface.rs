//! Hugging Face Inference API 클라이언트 (zero-shot-classification)

use super::{InferenceRequest, ZeroShotModel};
use crate::error::{Result, TriageError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use scam_triage_common::RankedLabel;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// API 요청 본문
#[derive(Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
    multi_label: bool,
}

/// API 응답
#[derive(Debug, Deserialize)]
struct ZeroShotResponse {
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    scores: Vec<f64>,
}

pub struct HuggingFaceClient {
    api_key: String,
    url: String,
    http: reqwest::Client,
}

impl HuggingFaceClient {
    pub fn new(api_key: &str, endpoint: &str, model: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key: api_key.to_string(),
            url: format!("{}/{}", endpoint.trim_end_matches('/'), model),
            http,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| TriageError::Config(format!("API 토큰 형식 오류: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl ZeroShotModel for HuggingFaceClient {
    async fn rank(&self, request: &InferenceRequest) -> Result<Vec<RankedLabel>> {
        let body = ZeroShotRequest {
            inputs: &request.text,
            parameters: ZeroShotParameters {
                candidate_labels: &request.candidate_labels,
                multi_label: request.multi_label,
            },
        };

        debug!(url = %self.url, labels = request.candidate_labels.len(), "zero-shot 요청");

        let response = self
            .http
            .post(&self.url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TriageError::InferenceFailure(format!(
                "Hugging Face API error ({}): {}",
                status, error_text
            )));
        }

        let text = response.text().await?;
        parse_response(&text)
    }
}

/// 응답 파싱. 점수 내림차순으로 다시 정렬한다
fn parse_response(text: &str) -> Result<Vec<RankedLabel>> {
    let parsed: ZeroShotResponse = serde_json::from_str(text)?;
    if parsed.labels.len() != parsed.scores.len() {
        return Err(TriageError::InferenceFailure(format!(
            "라벨 수({})와 점수 수({})가 다릅니다",
            parsed.labels.len(),
            parsed.scores.len()
        )));
    }

    let mut ranked: Vec<RankedLabel> = parsed
        .labels
        .into_iter()
        .zip(parsed.scores)
        .map(|(label, score)| RankedLabel { label, score })
        .collect();
    // 안정 정렬이라 동점이면 응답 순서 유지
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_sorted() {
        let text = r#"{"sequence": "문자 사기", "labels": ["사기", "SMS", "질문"], "scores": [0.5, 0.9, 0.1]}"#;
        let ranked = parse_response(text).unwrap();
        let labels: Vec<&str> = ranked.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["SMS", "사기", "질문"]);
    }

    #[test]
    fn test_parse_response_length_mismatch() {
        let text = r#"{"labels": ["사기", "SMS"], "scores": [0.5]}"#;
        assert!(matches!(
            parse_response(text),
            Err(TriageError::InferenceFailure(_))
        ));
    }

    #[test]
    fn test_parse_response_malformed() {
        assert!(matches!(
            parse_response("{\"error\": \"Model is loading\""),
            Err(TriageError::Json(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let labels = vec!["질문".to_string(), "SMS".to_string()];
        let body = ZeroShotRequest {
            inputs: "본문",
            parameters: ZeroShotParameters {
                candidate_labels: &labels,
                multi_label: true,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["inputs"], "본문");
        assert_eq!(json["parameters"]["candidate_labels"][1], "SMS");
        assert_eq!(json["parameters"]["multi_label"], true);
    }

    #[test]
    fn test_client_url() {
        let client = HuggingFaceClient::new(
            "hf_test",
            "https://api-inference.huggingface.co/models/",
            "joeddav/xlm-roberta-large-xnli",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.url,
            "https://api-inference.huggingface.co/models/joeddav/xlm-roberta-large-xnli"
        );
    }
}
