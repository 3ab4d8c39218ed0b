//! Segment Transfer Port - 远程片段下载

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::domain::playback::{BucketRef, SegmentId};

/// 下载错误
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Empty response body")]
    EmptyBody,

    #[error("IO error: {0}")]
    IoError(String),
}

/// 远程存储定位
#[derive(Debug, Clone)]
pub struct SegmentLocator {
    /// 存储服务地址，例如 `https://cloud.example.com/v1`
    pub endpoint: String,
    pub project_id: String,
}

impl SegmentLocator {
    pub fn new(endpoint: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            project_id: project_id.into(),
        }
    }

    /// 片段的公开访问 URL
    pub fn segment_url(&self, bucket: &BucketRef, segment_id: &SegmentId) -> String {
        format!(
            "{}/storage/buckets/{}/files/{}/view?project={}",
            self.endpoint.trim_end_matches('/'),
            bucket.as_str(),
            segment_id.as_str(),
            self.project_id
        )
    }
}

#[async_trait]
pub trait SegmentTransferPort: Send + Sync {
    /// 下载 `url` 到 `dest`，返回写入的字节数
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, TransferError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_url() {
        let locator = SegmentLocator::new("https://cloud.example.com/v1/", "proj");
        let url = locator.segment_url(
            &BucketRef::new("tts").unwrap(),
            &SegmentId::new("f1").unwrap(),
        );
        assert_eq!(
            url,
            "https://cloud.example.com/v1/storage/buckets/tts/files/f1/view?project=proj"
        );
    }
}
