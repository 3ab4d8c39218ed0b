//! Segment Synthesizer - 单片段合成与重放
//!
//! 新片段：凭证 → 合成后端 → 本地缓存 → 加载设备句柄。
//! 重放：跳过合成，直接从缓存加载。
//! 三个步骤（request / fetch / load）也单独公开，步骤之间检查取消。

use std::sync::Arc;

use crate::application::ports::{
    AudioDevicePort, CredentialProviderPort, DeviceHandle, SegmentCachePort, SegmentLocator,
    SynthesisBackendError, SynthesisBackendPort, SynthesisRequest,
};
use crate::domain::playback::{AudioSegment, BucketRef, PlaybackError, PlaybackStatus, SegmentId};
use crate::domain::TextChunk;

/// 合成进度观察者，由播放会话实现
pub trait SegmentProgress: Send + Sync {
    /// 进入新的阶段（generating / downloading）
    fn on_stage(&self, status: PlaybackStatus);

    /// 是否已请求停止
    fn is_cancelled(&self) -> bool;
}

/// 已加载到设备的片段
pub struct LoadedSegment {
    pub segment: AudioSegment,
    pub handle: Box<dyn DeviceHandle>,
}

/// 片段合成器
pub struct SegmentSynthesizer {
    backend: Arc<dyn SynthesisBackendPort>,
    credentials: Arc<dyn CredentialProviderPort>,
    cache: Arc<dyn SegmentCachePort>,
    device: Arc<dyn AudioDevicePort>,
    locator: SegmentLocator,
    default_bucket: BucketRef,
}

impl SegmentSynthesizer {
    pub fn new(
        backend: Arc<dyn SynthesisBackendPort>,
        credentials: Arc<dyn CredentialProviderPort>,
        cache: Arc<dyn SegmentCachePort>,
        device: Arc<dyn AudioDevicePort>,
        locator: SegmentLocator,
        default_bucket: BucketRef,
    ) -> Self {
        Self {
            backend,
            credentials,
            cache,
            device,
            locator,
            default_bucket,
        }
    }

    /// 调用合成后端，返回片段标识和所在存储桶
    pub async fn request(&self, chunk: &TextChunk) -> Result<(SegmentId, BucketRef), PlaybackError> {
        let credential = self
            .credentials
            .issue()
            .await
            .map_err(|e| PlaybackError::synthesis(e.to_string()))?;

        tracing::debug!(
            chunk_index = chunk.index(),
            chars = chunk.char_count(),
            "Requesting synthesis"
        );

        let response = self
            .backend
            .synthesize(
                SynthesisRequest {
                    text: chunk.text().to_string(),
                },
                &credential,
            )
            .await
            .map_err(synthesis_failure)?;

        let segment_id = response
            .segment_id
            .and_then(|id| SegmentId::new(id).ok())
            .ok_or_else(|| PlaybackError::protocol("missing segment identifier"))?;

        let bucket = response
            .bucket_id
            .and_then(|b| BucketRef::new(b).ok())
            .unwrap_or_else(|| self.default_bucket.clone());

        tracing::info!(
            chunk_index = chunk.index(),
            segment_id = %segment_id,
            bucket = %bucket,
            "Segment synthesized"
        );

        Ok((segment_id, bucket))
    }

    /// 确保片段已缓存到本地
    pub async fn fetch(
        &self,
        segment_id: &SegmentId,
        bucket: &BucketRef,
        source_text: Option<String>,
    ) -> Result<AudioSegment, PlaybackError> {
        let url = self.locator.segment_url(bucket, segment_id);
        let local_path = self
            .cache
            .resolve(segment_id, &url)
            .await
            .map_err(|e| PlaybackError::transfer(e.to_string()))?;

        Ok(AudioSegment {
            segment_id: segment_id.clone(),
            bucket: bucket.clone(),
            local_path,
            source_text,
        })
    }

    /// 从本地文件加载设备句柄
    pub async fn load(&self, segment: &AudioSegment) -> Result<Box<dyn DeviceHandle>, PlaybackError> {
        self.device
            .load(&segment.local_path)
            .await
            .map_err(|e| PlaybackError::playback(e.to_string()))
    }

    /// 合成新片段并加载，取消时返回 None
    pub async fn synthesize_new(
        &self,
        chunk: &TextChunk,
        progress: &dyn SegmentProgress,
    ) -> Result<Option<LoadedSegment>, PlaybackError> {
        progress.on_stage(PlaybackStatus::Generating);
        let (segment_id, bucket) = self.request(chunk).await?;
        if progress.is_cancelled() {
            return Ok(None);
        }

        progress.on_stage(PlaybackStatus::Downloading);
        let segment = self
            .fetch(&segment_id, &bucket, Some(chunk.text().to_string()))
            .await?;
        if progress.is_cancelled() {
            return Ok(None);
        }

        let handle = self.load(&segment).await?;
        Ok(Some(LoadedSegment { segment, handle }))
    }

    /// 重放已知片段，不调用合成后端
    pub async fn replay_cached(
        &self,
        segment_id: &SegmentId,
        bucket: Option<&BucketRef>,
        progress: &dyn SegmentProgress,
    ) -> Result<Option<LoadedSegment>, PlaybackError> {
        progress.on_stage(PlaybackStatus::Downloading);
        let bucket = bucket.unwrap_or(&self.default_bucket);
        let segment = self.fetch(segment_id, bucket, None).await?;
        if progress.is_cancelled() {
            return Ok(None);
        }

        let handle = self.load(&segment).await?;
        Ok(Some(LoadedSegment { segment, handle }))
    }
}

fn synthesis_failure(err: SynthesisBackendError) -> PlaybackError {
    match err {
        SynthesisBackendError::ServiceError(msg) => PlaybackError::Synthesis(msg),
        SynthesisBackendError::InvalidResponse(msg) => PlaybackError::Protocol(msg),
        other => PlaybackError::Synthesis(other.to_string()),
    }
}
