use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scam-triage")]
#[command(about = "사기 피해 게시글 유형·주제·수단 분류 도구", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 상세 로그 출력
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 설정 파일 경로 (기본: ~/.config/scam-triage/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 게시글 CSV를 분류해 결과 CSV에 저장
    Classify {
        /// 입력 CSV 파일
        #[arg(required = true)]
        input: PathBuf,

        /// 출력 CSV 파일 (기본: *_translated.csv → *_classified.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 모델 폴백을 쓰지 않음 (키워드 분류만)
        #[arg(long)]
        no_fallback: bool,

        /// 레코드 사이 최소 간격 (밀리초, 설정값 대신)
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// 새로 수집한 게시글을 기존 저장 파일에 병합
    Merge {
        /// 기존 저장 파일 (없으면 새로 만든다)
        #[arg(required = true)]
        existing: PathBuf,

        /// 새로 수집한 게시글 CSV
        #[arg(required = true)]
        incoming: PathBuf,

        /// 배치 마커 날짜 (YYYY-MM-DD, 기본: 오늘)
        #[arg(long)]
        date: Option<String>,

        /// 배치 마커를 추가하지 않음
        #[arg(long)]
        no_marker: bool,
    },

    /// 분류 결과 파일의 축별 분포 출력
    Stats {
        /// 분류 결과 CSV
        #[arg(required = true)]
        file: PathBuf,
    },

    /// 적용 중인 분류 체계 출력
    Taxonomy,

    /// 설정
    Config {
        /// Hugging Face API 토큰 설정
        #[arg(long)]
        set_api_key: Option<String>,

        /// 현재 설정 표시
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classify() {
        let cli = Cli::parse_from([
            "scam-triage",
            "-v",
            "classify",
            "data/posts_translated.csv",
            "--no-fallback",
            "--interval-ms",
            "0",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Classify {
                input,
                output,
                no_fallback,
                interval_ms,
            } => {
                assert_eq!(input, PathBuf::from("data/posts_translated.csv"));
                assert!(output.is_none());
                assert!(no_fallback);
                assert_eq!(interval_ms, Some(0));
            }
            _ => panic!("classify가 아님"),
        }
    }

    #[test]
    fn test_parse_merge_with_date() {
        let cli = Cli::parse_from([
            "scam-triage",
            "merge",
            "store.csv",
            "new.csv",
            "--date",
            "2024-03-01",
            "--config",
            "my.yaml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("my.yaml")));
        match cli.command {
            Commands::Merge {
                date, no_marker, ..
            } => {
                assert_eq!(date.as_deref(), Some("2024-03-01"));
                assert!(!no_marker);
            }
            _ => panic!("merge가 아님"),
        }
    }
}
