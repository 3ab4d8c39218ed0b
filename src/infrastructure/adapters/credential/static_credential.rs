//! Static Credential Provider - 配置中的固定凭证

use async_trait::async_trait;

use crate::application::ports::{Credential, CredentialError, CredentialProviderPort};

/// 从配置读取的凭证，未配置时每次签发都失败
pub struct StaticCredentialProvider {
    token: Option<String>,
}

impl StaticCredentialProvider {
    pub fn new(token: Option<String>) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        if token.is_none() {
            tracing::warn!("No synthesis credential configured, synthesis requests will fail");
        }
        Self { token }
    }
}

#[async_trait]
impl CredentialProviderPort for StaticCredentialProvider {
    async fn issue(&self) -> Result<Credential, CredentialError> {
        self.token
            .as_deref()
            .map(Credential::new)
            .ok_or_else(|| CredentialError::Unavailable("no credential configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issues_configured_token() {
        let provider = StaticCredentialProvider::new(Some("jwt-abc".to_string()));
        assert_eq!(provider.issue().await.unwrap().expose(), "jwt-abc");
    }

    #[tokio::test]
    async fn test_blank_token_is_unavailable() {
        let provider = StaticCredentialProvider::new(Some("  ".to_string()));
        assert!(matches!(
            provider.issue().await,
            Err(CredentialError::Unavailable(_))
        ));
        assert!(StaticCredentialProvider::new(None).issue().await.is_err());
    }
}
