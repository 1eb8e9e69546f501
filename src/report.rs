//! 분류 결과 통계 (축별 분포)

use scam_triage_common::table::value;
use scam_triage_common::{is_blank, Dimension, PostRecord, Table};
use std::collections::HashMap;
use std::fmt;

/// 한 축의 값별 건수
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub dimension: Dimension,
    /// 건수 내림차순, 동률이면 값 오름차순
    pub counts: Vec<(String, usize)>,
    pub total: usize,
}

impl Distribution {
    pub fn count(&self, key: &str) -> usize {
        self.counts
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} 분포:", self.dimension)?;
        for (key, count) in &self.counts {
            let ratio = if self.total == 0 {
                0.0
            } else {
                *count as f64 * 100.0 / self.total as f64
            };
            writeln!(f, "  {}: {}개 ({:.1}%)", key, count, ratio)?;
        }
        Ok(())
    }
}

/// 배치 마커를 제외한 레코드의 축별 분포. 빈 값은 "(미분류)"로 센다
pub fn distribution(table: &Table, dimension: Dimension) -> Distribution {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut total = 0;

    for row in table.rows() {
        if PostRecord::from_row(row).is_marker() {
            continue;
        }
        let mut key = value(row, dimension.column()).trim();
        if key.is_empty() {
            // 예전 형식 파일
            key = value(row, dimension.legacy_columns().0).trim();
        }
        let key = if is_blank(key) { "(미분류)" } else { key };
        *counts.entry(key.to_string()).or_default() += 1;
        total += 1;
    }

    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Distribution {
        dimension,
        counts,
        total,
    }
}

/// 세 축 모두
pub fn summarize(table: &Table) -> Vec<Distribution> {
    Dimension::ALL
        .iter()
        .map(|dimension| distribution(table, *dimension))
        .collect()
}
