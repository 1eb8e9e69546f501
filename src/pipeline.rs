//! 배치 분류 파이프라인
//!
//! 1. 입력 파일과 기존 분류 파일을 읽는다
//! 2. 레코드를 파일 순서대로 하나씩 처리한다
//!    - 배치 마커: 분류하지 않고 결과 필드를 비운다
//!    - 기존 결과가 신뢰 가능: 그대로 재사용
//!    - 그 외: 분류 후 즉시 출력 파일에 한 행 추가
//! 3. 마지막에 기존 분류 파일과 병합해 전체를 다시 쓴다

use crate::classifier::Orchestrator;
use crate::error::Result;
use crate::store::{read_table, write_table, IncrementalWriter};
use indicatif::{ProgressBar, ProgressStyle};
use scam_triage_common::table::value;
use scam_triage_common::{
    merge_batch, result_columns, ClassificationResult, Dimension, PostRecord, Row, Table,
    API_TIMEOUT, ID_COLUMN,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 실행 결과 요약
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub total: usize,
    pub classified: usize,
    pub reused: usize,
    pub markers: usize,
    /// 모델 호출 실패로 API_TIMEOUT이 기록된 레코드 (다음 실행에서 재시도)
    pub model_failures: usize,
}

/// 입력 파일 이름에서 기본 출력 경로를 만든다
///
/// `*_translated.csv` → `*_classified.csv`, 그 외 `*.csv` → `*_classified.csv`
pub fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let output_name = if let Some(stem) = name.strip_suffix("_translated.csv") {
        format!("{}_classified.csv", stem)
    } else if let Some(stem) = name.strip_suffix(".csv") {
        format!("{}_classified.csv", stem)
    } else {
        format!("{}_classified.csv", name)
    };

    input.with_file_name(output_name)
}

/// 기존 분류 결과 색인: id → 행
///
/// 중단된 실행이 추가한 행이 뒤에 오므로 나중 행을 우선하되,
/// 신뢰 가능한 결과를 신뢰할 수 없는 결과로 덮어쓰지는 않는다
fn index_stored_results(table: &Table) -> HashMap<String, Row> {
    let mut index: HashMap<String, Row> = HashMap::new();
    for row in table.rows() {
        let post = PostRecord::from_row(row);
        if post.id.is_empty() || post.is_marker() {
            continue;
        }

        let keep_previous = index
            .get(&post.id)
            .map(|previous| {
                ClassificationResult::from_row(previous).is_trustworthy()
                    && !ClassificationResult::from_row(row).is_trustworthy()
            })
            .unwrap_or(false);

        if !keep_previous {
            index.insert(post.id, row.clone());
        }
    }
    index
}

/// 재사용할 수 있는 저장 결과를 찾는다
///
/// 기존 분류 파일에 같은 id가 있으면 그 결과만 본다. 입력 행 자체의 결과는
/// 분류 파일에 행이 없을 때만 쓴다
fn reusable_result(row: &Row, stored: Option<&Row>) -> Option<ClassificationResult> {
    let result = ClassificationResult::from_row(stored.unwrap_or(row));
    result.is_trustworthy().then_some(result)
}

/// 기존 분류 파일의 중복 id를 색인과 같은 규칙으로 하나로 합친다 (첫 위치 유지)
fn collapse_duplicates(table: Table) -> Table {
    let chosen = index_stored_results(&table);
    let mut seen: HashSet<String> = HashSet::new();
    let mut collapsed = Table::new(table.columns().iter().cloned());
    for row in table.rows() {
        let post = PostRecord::from_row(row);
        if post.id.is_empty() || post.is_marker() {
            collapsed.push(row.clone());
            continue;
        }
        if !seen.insert(post.id.clone()) {
            continue;
        }
        collapsed.push(chosen.get(&post.id).cloned().unwrap_or_else(|| row.clone()));
    }
    collapsed
}

fn progress_bar(len: usize, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("  {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
    {
        bar.set_style(style);
    }
    bar
}

/// 입력 파일을 분류해 출력 파일에 저장
pub async fn run(
    input: &Path,
    output: &Path,
    orchestrator: &mut Orchestrator<'_>,
    show_progress: bool,
) -> Result<(Table, PipelineSummary)> {
    let input_table = read_table(input)?;
    info!(path = %input.display(), rows = input_table.len(), "입력 파일 읽기 완료");

    let existing = if output.exists() && std::fs::metadata(output)?.len() > 0 {
        let table = read_table(output)?;
        info!(path = %output.display(), rows = table.len(), "기존 분류 파일 발견");
        Some(table)
    } else {
        None
    };
    let stored = existing
        .as_ref()
        .map(index_stored_results)
        .unwrap_or_default();

    let mut classified_table = input_table.clone();
    for column in result_columns() {
        classified_table.ensure_column(column);
    }

    let mut writer = IncrementalWriter::open(output, classified_table.columns())?;
    let mut summary = PipelineSummary {
        total: classified_table.len(),
        ..Default::default()
    };
    let mut reclassified_ids: HashSet<String> = HashSet::new();

    let bar = progress_bar(classified_table.len(), show_progress);
    for row in classified_table.rows_mut() {
        let post = PostRecord::from_row(row);

        if post.is_marker() {
            ClassificationResult::empty().apply_to(row);
            summary.markers += 1;
            bar.inc(1);
            continue;
        }

        if let Some(result) = reusable_result(row, stored.get(&post.id)) {
            debug!(id = %post.id, "기존 분류 결과 재사용");
            result.apply_to(row);
            summary.reused += 1;
            bar.inc(1);
            continue;
        }

        let result = orchestrator.classify_record(&post).await?;
        if Dimension::ALL
            .iter()
            .any(|dimension| result.get(*dimension).value == API_TIMEOUT)
        {
            summary.model_failures += 1;
        }
        result.apply_to(row);
        writer.append(row)?;

        summary.classified += 1;
        reclassified_ids.insert(post.id);
        bar.inc(1);
    }
    bar.finish_and_clear();
    drop(writer);

    if summary.model_failures > 0 {
        warn!(
            count = summary.model_failures,
            "모델 호출에 실패한 레코드가 있습니다. 다음 실행에서 다시 분류합니다"
        );
    }

    let final_table = match existing {
        Some(previous) => {
            let previous = strip_results(collapse_duplicates(previous), &reclassified_ids);
            merge_batch(&classified_table, &previous, None)
        }
        None => classified_table,
    };
    write_table(output, &final_table)?;

    info!(
        classified = summary.classified,
        reused = summary.reused,
        markers = summary.markers,
        model_calls = orchestrator.model_calls(),
        "분류 완료"
    );
    Ok((final_table, summary))
}

/// 이번 실행에서 다시 분류한 행의 예전 결과 컬럼을 지운다 (병합 시 새 결과와 섞이지 않게)
fn strip_results(mut table: Table, ids: &HashSet<String>) -> Table {
    let columns = result_columns();
    for row in table.rows_mut() {
        if ids.contains(value(row, ID_COLUMN).trim()) {
            for column in &columns {
                row.shift_remove(*column);
            }
        }
    }
    table
}
