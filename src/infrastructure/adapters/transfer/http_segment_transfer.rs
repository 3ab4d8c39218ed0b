//! HTTP Segment Transfer - 从远程存储下载音频片段
//!
//! 实现 SegmentTransferPort trait，响应体以流的方式写入磁盘

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

use crate::application::ports::{SegmentTransferPort, TransferError};

/// HTTP 下载器
pub struct HttpSegmentTransfer {
    client: Client,
}

impl HttpSegmentTransfer {
    /// `timeout_secs` 为 None 时不设超时
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, TransferError> {
        let mut builder = Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| TransferError::NetworkError(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SegmentTransferPort for HttpSegmentTransfer {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, TransferError> {
        tracing::debug!(url = %url, dest = %dest.display(), "Downloading segment");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                TransferError::Timeout
            } else {
                TransferError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::ServiceError(format!("HTTP {}", status)));
        }

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let reader = StreamReader::new(stream);
        tokio::pin!(reader);

        let mut file = fs::File::create(dest)
            .await
            .map_err(|e| TransferError::IoError(e.to_string()))?;
        let written = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| TransferError::NetworkError(format!("Transfer interrupted: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| TransferError::IoError(e.to_string()))?;

        tracing::debug!(url = %url, bytes = written, "Segment downloaded");
        Ok(written)
    }
}
