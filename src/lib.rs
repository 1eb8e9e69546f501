//! scam-triage
//!
//! 사기 피해 게시글을 유형(type)·주제(topic)·수단(method) 세 축으로 분류한다.
//! 순수 분류 로직은 `scam_triage_common`, 파일 입출력과 모델 호출은 이 크레이트.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod store;
