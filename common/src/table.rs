//! 게시글 테이블과 병합 규칙
//!
//! 저장소 파일의 내용을 컬럼 순서와 함께 메모리에 보관한다.
//! 알 수 없는 컬럼도 그대로 보존한다.
//!
//! ## 병합 규칙
//! - `id`가 양쪽에 있으면: 기존 값이 비어 있고 새 값이 비어 있지 않을 때만 채운다
//! - `id`가 새 배치에만 있으면: 그대로 추가한다
//! - 같은 배치를 두 번 병합해도 결과는 한 번 병합한 것과 같다

use crate::record::{is_blank, is_marker_id, BatchMarker, ID_COLUMN};
use indexmap::IndexMap;
use std::collections::HashMap;

/// 한 행: 컬럼 이름 → 값
pub type Row = IndexMap<String, String>;

/// 컬럼 순서를 가진 테이블
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        let mut table = Self::default();
        for column in columns {
            let column: String = column.into();
            table.ensure_column(&column);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// 컬럼이 없으면 끝에 추가
    pub fn ensure_column(&mut self, column: &str) {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
    }

    /// 행 추가. 행에만 있는 컬럼은 테이블 컬럼에도 추가된다
    pub fn push(&mut self, row: Row) {
        for column in row.keys() {
            if !self.columns.iter().any(|c| c == column) {
                self.columns.push(column.clone());
            }
        }
        self.rows.push(row);
    }

    /// 행을 컬럼 순서대로 값 목록으로 변환 (없는 컬럼은 빈 문자열)
    pub fn record(&self, row: &Row) -> Vec<String> {
        project(row, &self.columns)
    }

    /// `id`로 행 위치를 찾는다 (배치 마커 제외, 첫 행)
    pub fn index_of_id(&self, id: &str) -> Option<usize> {
        let id = id.trim();
        if id.is_empty() || is_marker_id(id) {
            return None;
        }
        self.rows
            .iter()
            .position(|row| value(row, ID_COLUMN).trim() == id)
    }

    /// 첫 행이 배치 마커인지
    pub fn leading_marker(&self) -> Option<&Row> {
        self.rows.first().filter(|row| is_marker_id(value(row, ID_COLUMN)))
    }

    /// 첫 행의 배치 마커를 떼어 낸다
    pub fn take_leading_marker(&mut self) -> Option<Row> {
        if self.leading_marker().is_some() {
            Some(self.rows.remove(0))
        } else {
            None
        }
    }

    /// 행을 맨 앞에 끼워 넣는다
    pub fn prepend(&mut self, row: Row) {
        self.rows.insert(0, row);
    }
}

/// 행에서 값을 읽는다. 컬럼이 없으면 빈 문자열
pub fn value<'a>(row: &'a Row, column: &str) -> &'a str {
    row.get(column).map(|v| v.as_str()).unwrap_or("")
}

/// 행을 주어진 컬럼 순서로 투영
pub fn project(row: &Row, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|column| value(row, column).to_string())
        .collect()
}

/// 두 테이블을 `id` 기준으로 병합
///
/// - 컬럼: 기존 순서 유지, 새 컬럼은 뒤에 추가
/// - 기존의 마커 행은 위치 그대로 보존, 새 배치의 마커 행은 버린다
/// - 새 배치 안에서 중복된 `id`는 첫 행으로 합쳐진다
/// - `id`가 빈 새 행은 키가 없어 병합할 수 없으므로 버린다
pub fn merge(existing: &Table, incoming: &Table) -> Table {
    let mut merged = existing.clone();
    for column in &incoming.columns {
        merged.ensure_column(column);
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    for (i, row) in merged.rows.iter().enumerate() {
        let id = value(row, ID_COLUMN).trim();
        if id.is_empty() || is_marker_id(id) {
            continue;
        }
        index.entry(id.to_string()).or_insert(i);
    }

    for row in &incoming.rows {
        let id = value(row, ID_COLUMN).trim();
        if id.is_empty() || is_marker_id(id) {
            continue;
        }

        match index.get(id) {
            Some(&i) => fill_blanks(&mut merged.rows[i], row),
            None => {
                index.insert(id.to_string(), merged.rows.len());
                merged.rows.push(row.clone());
            }
        }
    }

    merged
}

/// 배치 단위 병합: 기존 첫 행의 마커를 메타데이터로 떼어 낸 뒤 병합하고,
/// 이번 배치의 마커를 맨 앞에 붙인다. 새 마커가 없으면 기존 마커를 되돌려 놓는다
pub fn merge_batch(existing: &Table, incoming: &Table, marker: Option<&BatchMarker>) -> Table {
    let mut body = existing.clone();
    let previous_marker = body.take_leading_marker();

    let mut merged = merge(&body, incoming);

    match (marker, previous_marker) {
        (Some(marker), _) => merged.prepend(marker.row()),
        (None, Some(previous)) => merged.prepend(previous),
        (None, None) => {}
    }

    merged
}

fn fill_blanks(target: &mut Row, source: &Row) {
    for (column, new_value) in source {
        if is_blank(new_value) {
            continue;
        }
        let current = target.get(column).map(|v| v.as_str()).unwrap_or("");
        if is_blank(current) {
            target.insert(column.clone(), new_value.clone());
        }
    }
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

    fn table(rows: Vec<Row>) -> Table {
        let mut table = Table::new(["id", "title", "content"]);
        for r in rows {
            table.push(r);
        }
        table
    }

    #[test]
    fn test_index_of_id() {
        let mut t = table(vec![row(&[("id", "1")]), row(&[("id", " 2 ")])]);
        t.prepend(row(&[("id", "date:2024-03-01")]));
        assert_eq!(t.index_of_id("2"), Some(2));
        assert_eq!(t.index_of_id("date:2024-03-01"), None);
        assert_eq!(t.index_of_id("3"), None);
    }

    #[test]
    fn test_fill_blank_only() {
        let existing = table(vec![
            row(&[("id", "1"), ("title", "기존 제목"), ("content", "")]),
            row(&[("id", "2"), ("title", "두번째"), ("content", "본문")]),
        ]);
        let incoming = table(vec![
            row(&[("id", "1"), ("title", "새 제목"), ("content", "새 본문")]),
            row(&[("id", "2"), ("title", ""), ("content", "  ")]),
        ]);

        let merged = merge(&existing, &incoming);
        assert_eq!(value(&merged.rows()[0], "title"), "기존 제목");
        assert_eq!(value(&merged.rows()[0], "content"), "새 본문");
        // 빈 새 값은 기존 값을 지우지 않는다
        assert_eq!(value(&merged.rows()[1], "title"), "두번째");
        assert_eq!(value(&merged.rows()[1], "content"), "본문");
    }

    #[test]
    fn test_nan_counts_as_blank() {
        let existing = table(vec![row(&[("id", "1"), ("content", "nan")])]);
        let incoming = table(vec![row(&[("id", "1"), ("content", "실제 본문")])]);
        let merged = merge(&existing, &incoming);
        assert_eq!(value(&merged.rows()[0], "content"), "실제 본문");
    }

    #[test]
    fn test_new_ids_appended_in_order() {
        let existing = table(vec![row(&[("id", "1"), ("title", "a")])]);
        let incoming = table(vec![
            row(&[("id", "3"), ("title", "c")]),
            row(&[("id", "2"), ("title", "b")]),
        ]);
        let merged = merge(&existing, &incoming);
        let ids: Vec<&str> = merged.rows().iter().map(|r| value(r, "id")).collect();
        assert_eq!(ids, vec!["1", "3", "2"]);
    }

    #[test]
    fn test_new_columns_appended() {
        let existing = table(vec![row(&[("id", "1")])]);
        let mut incoming = Table::new(["id", "Eng_title"]);
        incoming.push(row(&[("id", "1"), ("Eng_title", "Scam alert")]));
        let merged = merge(&existing, &incoming);
        assert_eq!(merged.columns(), &["id", "title", "content", "Eng_title"]);
        assert_eq!(value(&merged.rows()[0], "Eng_title"), "Scam alert");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let existing = table(vec![
            row(&[("id", "1"), ("title", "a"), ("content", "")]),
            row(&[("id", "date:2024-01-01")]),
        ]);
        let incoming = table(vec![
            row(&[("id", "1"), ("title", "x"), ("content", "본문")]),
            row(&[("id", "4"), ("title", "d"), ("content", "")]),
            row(&[("id", "4"), ("title", ""), ("content", "나중 본문")]),
        ]);

        let once = merge(&existing, &incoming);
        let twice = merge(&once, &incoming);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
        // 배치 내부 중복은 첫 행으로 합쳐진다
        assert_eq!(value(&once.rows()[2], "content"), "나중 본문");
        assert_eq!(value(&once.rows()[2], "title"), "d");
    }

    #[test]
    fn test_markers_not_deduplicated_against_posts() {
        let existing = table(vec![
            row(&[("id", "10")]),
            row(&[("id", "date:2024-01-01")]),
            row(&[("id", "11")]),
        ]);
        let incoming = table(vec![row(&[("id", "date:2024-01-01")]), row(&[("id", "12")])]);
        let merged = merge(&existing, &incoming);
        let ids: Vec<&str> = merged.rows().iter().map(|r| value(r, "id")).collect();
        assert_eq!(ids, vec!["10", "date:2024-01-01", "11", "12"]);
    }

    #[test]
    fn test_merge_batch_replaces_leading_marker() {
        let existing = table(vec![
            row(&[("id", "date:2024-01-01")]),
            row(&[("id", "1"), ("title", "a")]),
        ]);
        let incoming = table(vec![row(&[("id", "2"), ("title", "b")])]);
        let marker = BatchMarker::new("2024-02-01");

        let merged = merge_batch(&existing, &incoming, Some(&marker));
        let ids: Vec<&str> = merged.rows().iter().map(|r| value(r, "id")).collect();
        assert_eq!(ids, vec!["date:2024-02-01", "1", "2"]);
        assert_eq!(value(&merged.rows()[0], "title"), "");

        let again = merge_batch(&merged, &incoming, Some(&marker));
        assert_eq!(again, merged);
    }

    #[test]
    fn test_merge_batch_without_marker_keeps_previous() {
        let existing = table(vec![
            row(&[("id", "date:2024-01-01")]),
            row(&[("id", "1")]),
        ]);
        let incoming = table(vec![row(&[("id", "2")])]);
        let merged = merge_batch(&existing, &incoming, None);
        assert_eq!(value(&merged.rows()[0], "id"), "date:2024-01-01");
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_blank_ids_are_dropped_from_incoming() {
        let existing = table(vec![row(&[("id", "1")])]);
        let incoming = table(vec![row(&[("id", " "), ("title", "키 없음")])]);
        assert_eq!(merge(&existing, &incoming).len(), 1);
    }

    #[test]
    fn test_record_projection_fills_missing() {
        let t = table(vec![row(&[("id", "1"), ("content", "본문")])]);
        assert_eq!(t.record(&t.rows()[0]), vec!["1", "", "본문"]);
    }
}
