//! File Segment Cache - 文件系统片段缓存
//!
//! 实现 SegmentCachePort trait
//! - 路径: `<base_dir>/tts_<id>.mp3`，标识含特殊字符时用 md5(id)
//! - 下载先写入唯一命名的 `.part` 文件再重命名，半成品文件不会暴露

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{
    CacheStats, CacheStoreError, SegmentCachePort, SegmentTransferPort, TransferError,
};
use crate::domain::playback::SegmentId;

const FILE_PREFIX: &str = "tts_";
const FILE_EXTENSION: &str = "mp3";

/// 片段缓存文件名
pub fn segment_file_name(segment_id: &SegmentId) -> String {
    if segment_id.is_filename_safe() {
        format!("{}{}.{}", FILE_PREFIX, segment_id.as_str(), FILE_EXTENSION)
    } else {
        let digest = md5::compute(segment_id.as_str().as_bytes());
        format!("{}{:x}.{}", FILE_PREFIX, digest, FILE_EXTENSION)
    }
}

/// 文件系统片段缓存
pub struct FileSegmentCache {
    /// 缓存根目录
    base_dir: PathBuf,
    transfer: Arc<dyn SegmentTransferPort>,
}

impl FileSegmentCache {
    /// 创建缓存，确保目录存在
    pub async fn new(
        base_dir: impl AsRef<Path>,
        transfer: Arc<dyn SegmentTransferPort>,
    ) -> Result<Self, CacheStoreError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| CacheStoreError::IoError(e.to_string()))?;

        Ok(Self { base_dir, transfer })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    async fn non_empty(path: &Path) -> bool {
        fs::metadata(path)
            .await
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }
}

#[async_trait]
impl SegmentCachePort for FileSegmentCache {
    fn local_path(&self, segment_id: &SegmentId) -> PathBuf {
        self.base_dir.join(segment_file_name(segment_id))
    }

    async fn contains(&self, segment_id: &SegmentId) -> bool {
        Self::non_empty(&self.local_path(segment_id)).await
    }

    async fn resolve(
        &self,
        segment_id: &SegmentId,
        remote_url: &str,
    ) -> Result<PathBuf, CacheStoreError> {
        let path = self.local_path(segment_id);
        if Self::non_empty(&path).await {
            tracing::debug!(segment_id = %segment_id, "Segment cache hit");
            return Ok(path);
        }

        let part = self.base_dir.join(format!(
            "{}.{}.part",
            segment_file_name(segment_id),
            Uuid::new_v4().simple()
        ));

        let written = match self.transfer.download(remote_url, &part).await {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&part).await;
                tracing::warn!(segment_id = %segment_id, url = %remote_url, error = %e, "Segment transfer failed");
                return Err(e.into());
            }
        };

        if written == 0 {
            let _ = fs::remove_file(&part).await;
            return Err(TransferError::EmptyBody.into());
        }

        fs::rename(&part, &path)
            .await
            .map_err(|e| CacheStoreError::IoError(e.to_string()))?;

        tracing::info!(
            segment_id = %segment_id,
            bytes = written,
            path = %path.display(),
            "Segment cached"
        );
        Ok(path)
    }

    async fn stats(&self) -> Result<CacheStats, CacheStoreError> {
        let mut stats = CacheStats::default();

        let mut entries = fs::read_dir(&self.base_dir)
            .await
            .map_err(|e| CacheStoreError::IoError(e.to_string()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheStoreError::IoError(e.to_string()))?
        {
            let path = entry.path();
            let is_segment = path.extension().map_or(false, |ext| ext == FILE_EXTENSION)
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.starts_with(FILE_PREFIX));
            if !is_segment {
                continue;
            }
            if let Ok(metadata) = entry.metadata().await {
                stats.file_count += 1;
                stats.used_bytes += metadata.len();
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// 写入固定内容的下载器
    struct FixedTransfer {
        body: Vec<u8>,
        calls: AtomicUsize,
    }

    impl FixedTransfer {
        fn new(body: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                body: body.to_vec(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SegmentTransferPort for FixedTransfer {
        async fn download(&self, _url: &str, dest: &Path) -> Result<u64, TransferError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            fs::write(dest, &self.body)
                .await
                .map_err(|e| TransferError::IoError(e.to_string()))?;
            Ok(self.body.len() as u64)
        }
    }

    struct FailingTransfer;

    #[async_trait]
    impl SegmentTransferPort for FailingTransfer {
        async fn download(&self, _url: &str, dest: &Path) -> Result<u64, TransferError> {
            fs::write(dest, b"partial").await.ok();
            Err(TransferError::NetworkError("connection reset".to_string()))
        }
    }

    fn id(value: &str) -> SegmentId {
        SegmentId::new(value).unwrap()
    }

    #[test]
    fn test_file_name_for_safe_and_unsafe_ids() {
        assert_eq!(segment_file_name(&id("abc_123-X")), "tts_abc_123-X.mp3");

        let name = segment_file_name(&id("../../etc/passwd"));
        assert!(name.starts_with("tts_"));
        assert!(name.ends_with(".mp3"));
        assert!(!name.contains('/'));
        assert_eq!(name.len(), "tts_".len() + 32 + ".mp3".len());
    }

    #[tokio::test]
    async fn test_resolve_transfers_once() {
        let dir = tempdir().unwrap();
        let transfer = FixedTransfer::new(b"ID3audio");
        let cache = FileSegmentCache::new(dir.path(), transfer.clone()).await.unwrap();

        let first = cache.resolve(&id("seg1"), "http://remote/seg1").await.unwrap();
        let second = cache.resolve(&id("seg1"), "http://remote/seg1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, dir.path().join("tts_seg1.mp3"));
        assert_eq!(transfer.calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&id("seg1")).await);
    }

    #[tokio::test]
    async fn test_empty_file_is_refetched() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("tts_seg2.mp3"), b"").unwrap();
        let transfer = FixedTransfer::new(b"data");
        let cache = FileSegmentCache::new(dir.path(), transfer.clone()).await.unwrap();

        assert!(!cache.contains(&id("seg2")).await);
        cache.resolve(&id("seg2"), "http://remote/seg2").await.unwrap();

        assert_eq!(transfer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read(dir.path().join("tts_seg2.mp3")).unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_empty_body_is_error() {
        let dir = tempdir().unwrap();
        let cache = FileSegmentCache::new(dir.path(), FixedTransfer::new(b"")).await.unwrap();

        let err = cache.resolve(&id("seg3"), "http://remote/seg3").await.unwrap_err();

        assert!(matches!(err, CacheStoreError::Transfer(TransferError::EmptyBody)));
        assert!(!cache.contains(&id("seg3")).await);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_transfer_leaves_no_partial_file() {
        let dir = tempdir().unwrap();
        let cache = FileSegmentCache::new(dir.path(), Arc::new(FailingTransfer)).await.unwrap();

        let err = cache.resolve(&id("seg4"), "http://remote/seg4").await.unwrap_err();

        assert!(matches!(err, CacheStoreError::Transfer(TransferError::NetworkError(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_resolves_agree() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(
            FileSegmentCache::new(dir.path(), FixedTransfer::new(b"same-bytes"))
                .await
                .unwrap(),
        );

        let a = tokio::spawn({
            let cache = cache.clone();
            async move { cache.resolve(&id("shared"), "http://remote/shared").await }
        });
        let b = tokio::spawn({
            let cache = cache.clone();
            async move { cache.resolve(&id("shared"), "http://remote/shared").await }
        });

        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
        assert_eq!(a, b);
        assert_eq!(std::fs::read(&a).unwrap(), b"same-bytes");
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().path().extension().map_or(false, |x| x == "part"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_stats_counts_segment_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("tts_a.mp3"), vec![0u8; 100]).unwrap();
        std::fs::write(dir.path().join("tts_b.mp3"), vec![0u8; 50]).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        let cache = FileSegmentCache::new(dir.path(), FixedTransfer::new(b"x")).await.unwrap();

        let stats = cache.stats().await.unwrap();

        assert_eq!(stats, CacheStats { file_count: 2, used_bytes: 150 });
    }
}
