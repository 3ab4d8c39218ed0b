//! Synthesis Backend Port - 语音合成后端抽象
//!
//! 后端接收文本，合成音频并存入远程存储桶，只返回片段标识

use async_trait::async_trait;
use thiserror::Error;

use super::Credential;

/// 合成后端错误
#[derive(Debug, Error)]
pub enum SynthesisBackendError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的文本内容
    pub text: String,
}

/// 合成响应
///
/// 字段都是可选的：后端可能返回成功却缺少片段标识，由调用方判定为协议错误
#[derive(Debug, Clone, Default)]
pub struct SynthesisResponse {
    pub segment_id: Option<String>,
    pub bucket_id: Option<String>,
}

/// Synthesis Backend Port
#[async_trait]
pub trait SynthesisBackendPort: Send + Sync {
    /// 合成一段文本
    async fn synthesize(
        &self,
        request: SynthesisRequest,
        credential: &Credential,
    ) -> Result<SynthesisResponse, SynthesisBackendError>;
}
