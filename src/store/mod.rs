//! 게시글 저장소 (CSV 파일)

pub mod csv_store;
pub mod encoding;

pub use csv_store::{parse_table, read_table, save_posts, write_table, IncrementalWriter};
pub use encoding::{decode_bytes, decode_file};
