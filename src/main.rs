use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use scam_triage::classifier::Orchestrator;
use scam_triage::model::{HuggingFaceClient, ZeroShotModel};
use scam_triage::{cli, config, error, pipeline, report, store};
use scam_triage_common::{BatchMarker, Dimension};
use cli::{Cli, Commands};
use config::Config;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.as_deref();
    let config = Config::load(config_path).context("설정 파일을 읽을 수 없습니다")?;

    match cli.command {
        Commands::Classify { input, output, no_fallback, interval_ms } => {
            println!("🔎 scam-triage - 게시글 분류\n");

            let output = output.unwrap_or_else(|| pipeline::default_output_path(&input));

            // 1. 분류 체계
            println!("[1/3] 분류 체계 준비 중...");
            let taxonomy = config.taxonomy()?;
            println!(
                "✔ 유형 {}개, 주제 {}개, 수단 {}개\n",
                taxonomy.dimension(Dimension::Type).len(),
                taxonomy.dimension(Dimension::Topic).len(),
                taxonomy.dimension(Dimension::Method).len()
            );

            // 2. 모델 폴백
            println!("[2/3] 모델 폴백 확인 중...");
            let token = if no_fallback { None } else { config.fallback_token() };
            if token.is_none() && !no_fallback && config.use_fallback {
                warn!("Hugging Face API 토큰이 없어 키워드 분류만 사용합니다");
            }
            let client = match token {
                Some(token) => Some(HuggingFaceClient::new(
                    &token,
                    &config.inference_endpoint,
                    &config.model,
                    Duration::from_secs(config.timeout_seconds),
                )?),
                None => None,
            };
            let interval = Duration::from_millis(interval_ms.unwrap_or(config.request_interval_ms));
            let model = client.as_ref().map(|c| c as &dyn ZeroShotModel);
            let mut orchestrator = Orchestrator::new(&taxonomy, model, interval)?;
            if orchestrator.fallback_enabled() {
                println!("✔ 모델 폴백 사용: {}\n", config.model);
            } else {
                println!("✔ 키워드 분류만 사용\n");
            }

            // 3. 분류
            println!("[3/3] 분류 중: {}", input.display());
            let (table, summary) = pipeline::run(&input, &output, &mut orchestrator, true)
                .await
                .with_context(|| format!("분류 실패: {}", input.display()))?;
            println!(
                "✔ 새로 분류 {}건, 재사용 {}건, 배치 마커 {}건 (모델 호출 {}회)",
                summary.classified,
                summary.reused,
                summary.markers,
                orchestrator.model_calls()
            );
            if summary.model_failures > 0 {
                println!("⚠ 모델 호출 실패 {}건 (다음 실행에서 재시도)", summary.model_failures);
            }
            println!("✔ 결과를 저장: {}\n", output.display());

            print!("{}", report::distribution(&table, Dimension::Type));
            println!("\n✅ 분류 완료");
        }

        Commands::Merge { existing, incoming, date, no_marker } => {
            println!("📥 scam-triage - 배치 병합\n");

            let marker = if no_marker {
                None
            } else {
                let date = match date {
                    Some(text) => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                        .map_err(|_| error::TriageError::InvalidDate(text.clone()))?,
                    None => chrono::Local::now().date_naive(),
                };
                Some(BatchMarker::new(date.format("%Y-%m-%d").to_string()))
            };

            let batch = store::read_table(&incoming)?;
            println!("✔ 새 게시글 {}건", batch.len());

            let merged = store::save_posts(&existing, &batch, marker.as_ref())?;
            println!("✔ 저장소 {}건: {}", merged.len(), existing.display());
            println!("\n✅ 병합 완료");
        }

        Commands::Stats { file } => {
            let table = store::read_table(&file)?;
            println!("📊 {} ({}행)\n", file.display(), table.len());
            for distribution in report::summarize(&table) {
                println!("{}", distribution);
            }
        }

        Commands::Taxonomy => {
            let taxonomy = config.taxonomy()?;
            for dimension in Dimension::ALL {
                let mode = if dimension.is_multi_label() { " (복수 선택)" } else { "" };
                println!("[{}]{}", dimension, mode);
                for (key, entry) in taxonomy.dimension(dimension).iter() {
                    println!("  {} ({}): {}", key, entry.label, entry.patterns.join(", "));
                }
                println!();
            }
        }

        Commands::Config { set_api_key, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key, config_path)?;
                println!("✔ API 토큰을 설정했습니다");
            }

            if show {
                let path = match config_path {
                    Some(p) => p.to_path_buf(),
                    None => Config::config_path()?,
                };
                println!("설정 ({}):", path.display());
                println!("  모델: {}", config.model);
                println!("  엔드포인트: {}", config.inference_endpoint);
                println!("  모델 폴백: {}", if config.use_fallback { "사용" } else { "사용 안 함" });
                println!("  타임아웃: {}초", config.timeout_seconds);
                println!("  요청 간격: {}ms", config.request_interval_ms);
                println!(
                    "  분류 체계: {}",
                    if config.text_classification.is_some() { "설정 파일" } else { "내장 기본값" }
                );
                println!(
                    "  API 토큰: {}",
                    config
                        .get_api_key()
                        .map(|t| config::mask_token(&t))
                        .unwrap_or_else(|| "미설정".into())
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "scam_triage=debug" } else { "scam_triage=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
