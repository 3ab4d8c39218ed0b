//! Storage Adapter - 本地片段缓存

mod file_segment_cache;

pub use file_segment_cache::{segment_file_name, FileSegmentCache};
