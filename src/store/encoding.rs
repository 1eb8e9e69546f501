//! 입력 파일 인코딩 판별
//!
//! 고정된 후보 목록을 순서대로 시도해 잘못된 바이트 없이 디코딩되는 첫 인코딩을 쓴다.
//! 크롤러에 따라 UTF-8(BOM 포함)과 EUC-KR 파일이 섞여 있다.

use crate::error::{Result, TriageError};
use encoding_rs::{Encoding, EUC_KR, UTF_8};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 시도 순서대로 (이름, 인코딩, BOM 필요 여부)
fn candidates() -> [(&'static str, &'static Encoding, bool); 3] {
    [
        ("utf-8-sig", UTF_8, true),
        ("utf-8", UTF_8, false),
        // encoding_rs의 EUC-KR은 cp949 확장까지 포함한다
        ("euc-kr", EUC_KR, false),
    ]
}

/// 후보 인코딩 이름 목록
pub fn candidate_names() -> Vec<&'static str> {
    candidates().iter().map(|(name, _, _)| *name).collect()
}

/// 바이트열을 디코딩. 성공하면 (텍스트, 인코딩 이름)
pub fn decode_bytes(bytes: &[u8]) -> Option<(String, &'static str)> {
    for (name, encoding, needs_bom) in candidates() {
        let body = if needs_bom {
            match bytes.strip_prefix(UTF8_BOM) {
                Some(rest) => rest,
                None => continue,
            }
        } else {
            bytes
        };

        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(body) {
            return Some((text.into_owned(), name));
        }
    }
    None
}

/// 파일을 읽어 디코딩. 어떤 후보로도 디코딩되지 않으면 배치 전체를 중단한다
pub fn decode_file(path: &Path) -> Result<(String, &'static str)> {
    if !path.exists() {
        return Err(TriageError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    decode_bytes(&bytes).ok_or_else(|| TriageError::InputDecoding {
        path: path.display().to_string(),
        tried: candidate_names().join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_with_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("id,title\n1,사기 주의\n".as_bytes());
        let (text, name) = decode_bytes(&bytes).unwrap();
        assert_eq!(name, "utf-8-sig");
        assert!(text.starts_with("id,title"));
    }

    #[test]
    fn test_plain_utf8() {
        let (text, name) = decode_bytes("id\n피싱\n".as_bytes()).unwrap();
        assert_eq!(name, "utf-8");
        assert_eq!(text, "id\n피싱\n");
    }

    #[test]
    fn test_euc_kr() {
        let (encoded, _, had_errors) = EUC_KR.encode("id,title\n1,문자 사기\n");
        assert!(!had_errors);
        let (text, name) = decode_bytes(&encoded).unwrap();
        assert_eq!(name, "euc-kr");
        assert_eq!(text, "id,title\n1,문자 사기\n");
    }

    #[test]
    fn test_undecodable() {
        assert!(decode_bytes(&[0xFF, 0xFF, 0x41]).is_none());
    }

    #[test]
    fn test_decode_file_error_lists_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(&path, [0xFF, 0xFF]).unwrap();
        match decode_file(&path) {
            Err(TriageError::InputDecoding { tried, .. }) => {
                assert_eq!(tried, "utf-8-sig, utf-8, euc-kr");
            }
            other => panic!("expected InputDecoding, got {:?}", other),
        }
    }
}
