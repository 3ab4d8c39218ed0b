//! Credential Provider Port - 短期凭证

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Credential unavailable: {0}")]
    Unavailable(String),
}

/// 调用合成后端时携带的凭证
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[async_trait]
pub trait CredentialProviderPort: Send + Sync {
    /// 签发一个凭证，每次合成调用前获取
    async fn issue(&self) -> Result<Credential, CredentialError>;
}
