use crate::error::{Result, TriageError};
use scam_triage_common::{Taxonomy, TaxonomyConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// API 토큰 환경 변수 (설정 파일보다 우선)
pub const API_KEY_ENV: &str = "HUGGINGFACE_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub huggingface_api_key: Option<String>,
    /// 모델 폴백 전역 스위치
    pub use_fallback: bool,
    pub model: String,
    pub inference_endpoint: String,
    pub timeout_seconds: u64,
    /// 모델 폴백 사용 시 레코드 간 최소 간격
    pub request_interval_ms: u64,
    /// 분류 체계. 없으면 내장 기본값
    pub text_classification: Option<TaxonomyConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    /// 설정 파일 읽기
    ///
    /// 경로를 지정했는데 파일이 없으면 에러, 기본 경로에 파일이 없으면 기본값
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(TriageError::FileNotFound(p.display().to_string()));
                }
                p.to_path_buf()
            }
            None => Self::config_path()?,
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_yaml(&content)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default_config());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| TriageError::Config("홈 디렉터리를 찾을 수 없습니다".into()))?;
        Ok(home.join(".config").join("scam-triage").join("config.yaml"))
    }

    fn default_config() -> Self {
        Self {
            huggingface_api_key: None,
            use_fallback: true,
            model: "joeddav/xlm-roberta-large-xnli".into(),
            inference_endpoint: "https://api-inference.huggingface.co/models".into(),
            timeout_seconds: 30,
            request_interval_ms: 500,
            text_classification: None,
        }
    }

    /// API 토큰 (환경 변수 우선). 비어 있으면 None
    pub fn get_api_key(&self) -> Option<String> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        pick_token(from_env, self.huggingface_api_key.clone())
    }

    /// 모델 폴백에 사용할 토큰. 스위치가 꺼져 있거나 토큰이 없으면 None (키워드 전용)
    pub fn fallback_token(&self) -> Option<String> {
        if !self.use_fallback {
            return None;
        }
        self.get_api_key()
    }

    pub fn set_api_key(&mut self, key: String, path: Option<&Path>) -> Result<()> {
        self.huggingface_api_key = Some(key);
        self.save(path)
    }

    /// 설정의 분류 체계 (없으면 내장 기본값)
    pub fn taxonomy(&self) -> Result<Taxonomy> {
        match &self.text_classification {
            Some(section) => Ok(Taxonomy::from_config(section.clone())?),
            None => Ok(Taxonomy::builtin()),
        }
    }
}

fn pick_token(from_env: Option<String>, from_file: Option<String>) -> Option<String> {
    from_env
        .into_iter()
        .chain(from_file)
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
}

/// 토큰 마스킹 (앞 4자리만 표시)
pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{}****", visible)
}
