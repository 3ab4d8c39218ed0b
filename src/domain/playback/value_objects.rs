//! Playback Context - Value Objects

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 音频片段标识（由合成后端分配）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(String);

impl SegmentId {
    pub fn new(id: impl Into<String>) -> Result<Self, &'static str> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("片段标识不能为空");
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 是否可直接用作文件名（仅包含 `[A-Za-z0-9_-]`）
    pub fn is_filename_safe(&self) -> bool {
        self.0
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 存储桶标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketRef(String);

impl BucketRef {
    pub fn new(bucket: impl Into<String>) -> Result<Self, &'static str> {
        let bucket = bucket.into();
        if bucket.trim().is_empty() {
            return Err("存储桶标识不能为空");
        }
        Ok(Self(bucket))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BucketRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 已落地到本地缓存的音频片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment {
    pub segment_id: SegmentId,
    /// 片段实际所在的存储桶
    pub bucket: BucketRef,
    pub local_path: PathBuf,
    /// 新合成的片段记录原文，重放缓存时为空
    pub source_text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_id_rejects_blank() {
        assert!(SegmentId::new("").is_err());
        assert!(SegmentId::new("  ").is_err());
        assert_eq!(SegmentId::new("abc").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_filename_safety() {
        assert!(SegmentId::new("6650c1e2_a-9").unwrap().is_filename_safe());
        assert!(!SegmentId::new("../etc/passwd").unwrap().is_filename_safe());
        assert!(!SegmentId::new("a b").unwrap().is_filename_safe());
        assert!(!SegmentId::new("é").unwrap().is_filename_safe());
    }

    #[test]
    fn test_segment_id_serializes_as_plain_string() {
        let id = SegmentId::new("file-1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"file-1\"");
    }
}
