//! CSV 저장소
//!
//! - 읽기: 인코딩 판별 후 헤더 기준으로 행을 만든다. 짧은 행의 빠진 컬럼은 빈 값
//! - 전체 쓰기: UTF-8(BOM) 임시 파일에 쓴 뒤 rename 한다. 도중에 실패해도 기존 파일은 그대로
//! - 한 행 추가: 레코드마다 즉시 flush 해서 중단되어도 이어서 실행할 수 있게 한다

use super::encoding::decode_file;
use crate::error::{Result, TriageError};
use scam_triage_common::table::project;
use scam_triage_common::{merge_batch, BatchMarker, Row, Table, ID_COLUMN, POST_COLUMNS};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 파일에서 테이블 읽기
pub fn read_table(path: &Path) -> Result<Table> {
    let (text, encoding) = decode_file(path)?;
    debug!(path = %path.display(), encoding, "CSV 디코딩 완료");
    parse_table(&text, &path.display().to_string())
}

/// 문자열에서 테이블 읽기. `id` 컬럼이 없으면 에러
pub fn parse_table(text: &str, source: &str) -> Result<Table> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if !headers.iter().any(|h| h == ID_COLUMN) {
        return Err(TriageError::MissingIdColumn(source.to_string()));
    }

    let mut table = Table::new(headers.iter().cloned());
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        table.push(row);
    }

    Ok(table)
}

/// 테이블 전체를 UTF-8(BOM)으로 쓴다
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path(path);
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(UTF8_BOM)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(table.record(row))?;
        }
        writer.flush()?;
    }
    std::fs::rename(&tmp_path, path)?;

    debug!(path = %path.display(), rows = table.len(), "CSV 저장 완료");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// 크롤러 배치를 저장소 파일에 병합 (파일이 없으면 새로 만든다)
pub fn save_posts(path: &Path, incoming: &Table, marker: Option<&BatchMarker>) -> Result<Table> {
    let existing = if path.exists() {
        read_table(path)?
    } else {
        Table::new(POST_COLUMNS.iter().copied())
    };

    let merged = merge_batch(&existing, incoming, marker);
    info!(
        path = %path.display(),
        before = existing.len(),
        after = merged.len(),
        "배치 병합"
    );
    write_table(path, &merged)?;
    Ok(merged)
}

/// 한 행씩 추가하는 writer
pub struct IncrementalWriter {
    writer: csv::Writer<File>,
    columns: Vec<String>,
}

impl IncrementalWriter {
    /// 파일이 비어 있거나 없으면 BOM과 헤더를 쓰고, 이미 있으면 그 파일의 헤더 순서로 추가한다
    ///
    /// 기존 헤더에 없는 컬럼이 있으면 먼저 컬럼을 덧붙여 파일 전체를 다시 쓴다
    pub fn open(path: &Path, columns: &[String]) -> Result<Self> {
        let existing_header = if path.exists() && std::fs::metadata(path)?.len() > 0 {
            let header = read_header(path)?;
            let missing: Vec<&String> = columns.iter().filter(|c| !header.contains(*c)).collect();
            if missing.is_empty() {
                Some(header)
            } else {
                info!(path = %path.display(), missing = ?missing, "기존 파일에 컬럼 추가");
                let mut table = read_table(path)?;
                for column in columns {
                    table.ensure_column(column);
                }
                write_table(path, &table)?;
                Some(table.columns().to_vec())
            }
        } else {
            None
        };

        match existing_header {
            Some(header) => {
                let mut file = OpenOptions::new().read(true).append(true).open(path)?;
                ensure_trailing_newline(&mut file)?;
                Ok(Self {
                    writer: csv::Writer::from_writer(file),
                    columns: header,
                })
            }
            None => {
                let mut file = File::create(path)?;
                file.write_all(UTF8_BOM)?;
                let mut writer = csv::Writer::from_writer(file);
                writer.write_record(columns)?;
                writer.flush()?;
                Ok(Self {
                    writer,
                    columns: columns.to_vec(),
                })
            }
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 행을 추가하고 즉시 flush
    pub fn append(&mut self, row: &Row) -> Result<()> {
        self.writer.write_record(project(row, &self.columns))?;
        self.writer.flush()?;
        Ok(())
    }
}

fn read_header(path: &Path) -> Result<Vec<String>> {
    let (text, _) = decode_file(path)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    Ok(reader.headers()?.iter().map(|h| h.trim().to_string()).collect())
}

/// 중단된 쓰기로 마지막 줄바꿈이 빠졌으면 보충
fn ensure_trailing_newline(file: &mut File) -> Result<()> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(());
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scam_triage_common::table::value;

    #[test]
    fn test_parse_short_rows_as_blank() {
        let table = parse_table("id,title,content\n1,제목\n2,제목2,본문\n", "test").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(value(&table.rows()[0], "content"), "");
        assert_eq!(value(&table.rows()[1], "content"), "본문");
    }

    #[test]
    fn test_parse_multiline_quoted_field() {
        let table = parse_table("id,content\n1,\"첫 줄\n둘째 줄\"\n", "test").unwrap();
        assert_eq!(value(&table.rows()[0], "content"), "첫 줄\n둘째 줄");
    }

    #[test]
    fn test_parse_requires_id_column() {
        let result = parse_table("title,content\na,b\n", "posts.csv");
        assert!(matches!(result, Err(TriageError::MissingIdColumn(ref s)) if s == "posts.csv"));
    }

    #[test]
    fn test_parse_strips_bom() {
        let table = parse_table("\u{feff}id,title\n1,a\n", "test").unwrap();
        assert_eq!(table.columns()[0], "id");
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(
            temp_path(Path::new("/data/posts.csv")),
            PathBuf::from("/data/posts.csv.tmp")
        );
    }
}
