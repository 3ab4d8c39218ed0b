//! HTTP Synthesis Client - 调用云函数合成语音
//!
//! 实现 SynthesisBackendPort trait
//!
//! 云函数 API:
//! POST {function_url}/
//! Headers: X-Appwrite-Project, X-Appwrite-JWT
//! Request: {"text": "...", "doTTS": true}  (JSON)
//! Response: {"ok": true, "fileId": "...", "bucketId": "..."} 或 {"ok": false, "error": "..."}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    Credential, SynthesisBackendError, SynthesisBackendPort, SynthesisRequest, SynthesisResponse,
};

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const CREDENTIAL_HEADER: &str = "X-Appwrite-JWT";

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct SynthesisHttpRequest<'a> {
    text: &'a str,
    #[serde(rename = "doTTS")]
    do_tts: bool,
}

/// 合成响应体，无法解析时按空对象处理
#[derive(Debug, Default, Deserialize)]
struct SynthesisHttpResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default, rename = "fileId")]
    file_id: Option<String>,
    #[serde(default, rename = "bucketId")]
    bucket_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP 合成客户端配置
#[derive(Debug, Clone)]
pub struct HttpSynthesisClientConfig {
    /// 云函数地址
    pub function_url: String,
    /// 项目 ID
    pub project_id: String,
    /// 请求超时时间（秒），None 表示不限
    pub timeout_secs: Option<u64>,
}

impl HttpSynthesisClientConfig {
    pub fn new(function_url: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            function_url: function_url.into(),
            project_id: project_id.into(),
            timeout_secs: None,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// HTTP 合成客户端
pub struct HttpSynthesisClient {
    client: Client,
    config: HttpSynthesisClientConfig,
}

impl HttpSynthesisClient {
    pub fn new(config: HttpSynthesisClientConfig) -> Result<Self, SynthesisBackendError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| SynthesisBackendError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取调用 URL
    fn execution_url(&self) -> String {
        format!("{}/", self.config.function_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SynthesisBackendPort for HttpSynthesisClient {
    async fn synthesize(
        &self,
        request: SynthesisRequest,
        credential: &Credential,
    ) -> Result<SynthesisResponse, SynthesisBackendError> {
        let url = self.execution_url();
        tracing::debug!(url = %url, text_len = request.text.len(), "Sending synthesis request");

        let response = self
            .client
            .post(&url)
            .header(PROJECT_HEADER, &self.config.project_id)
            .header(CREDENTIAL_HEADER, credential.expose())
            .json(&SynthesisHttpRequest {
                text: &request.text,
                do_tts: true,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SynthesisBackendError::Timeout
                } else if e.is_connect() {
                    SynthesisBackendError::NetworkError(format!(
                        "Cannot connect to synthesis function: {}",
                        e
                    ))
                } else {
                    SynthesisBackendError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let data: SynthesisHttpResponse = serde_json::from_str(&body).unwrap_or_default();

        if !status.is_success() || !data.ok {
            let message = data
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| format!("TTS function failed ({})", status.as_u16()));
            tracing::warn!(status = status.as_u16(), error = %message, "Synthesis function failed");
            return Err(SynthesisBackendError::ServiceError(message));
        }

        tracing::info!(
            file_id = ?data.file_id,
            bucket_id = ?data.bucket_id,
            "Synthesis function completed"
        );

        Ok(SynthesisResponse {
            segment_id: data.file_id.filter(|id| !id.trim().is_empty()),
            bucket_id: data.bucket_id.filter(|b| !b.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client(server: &mockito::ServerGuard) -> HttpSynthesisClient {
        HttpSynthesisClient::new(HttpSynthesisClientConfig::new(server.url(), "proj")).unwrap()
    }

    fn request(text: &str) -> SynthesisRequest {
        SynthesisRequest {
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_returns_ids() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-appwrite-project", "proj")
            .match_header("x-appwrite-jwt", "jwt-token")
            .match_body(Matcher::Json(json!({"text": "Hello.", "doTTS": true})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true, "fileId": "file-1", "bucketId": "tts"}"#)
            .create_async()
            .await;

        let response = client(&server)
            .synthesize(request("Hello."), &Credential::new("jwt-token"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.segment_id.as_deref(), Some("file-1"));
        assert_eq!(response.bucket_id.as_deref(), Some("tts"));
    }

    #[tokio::test]
    async fn test_success_without_file_id_passes_through() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;

        let response = client(&server)
            .synthesize(request("Hi."), &Credential::new("jwt"))
            .await
            .unwrap();

        assert!(response.segment_id.is_none());
        assert!(response.bucket_id.is_none());
    }

    #[tokio::test]
    async fn test_error_body_message_is_used() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"ok": false, "error": "quota exceeded"}"#)
            .create_async()
            .await;

        let err = client(&server)
            .synthesize(request("Hi."), &Credential::new("jwt"))
            .await
            .unwrap_err();

        assert!(matches!(err, SynthesisBackendError::ServiceError(msg) if msg == "quota exceeded"));
    }

    #[tokio::test]
    async fn test_unparsable_error_body_reports_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create_async()
            .await;

        let err = client(&server)
            .synthesize(request("Hi."), &Credential::new("jwt"))
            .await
            .unwrap_err();

        assert!(matches!(err, SynthesisBackendError::ServiceError(msg) if msg == "TTS function failed (502)"));
    }

    #[tokio::test]
    async fn test_unreachable_function_is_network_error() {
        let client = HttpSynthesisClient::new(
            HttpSynthesisClientConfig::new("http://127.0.0.1:1", "proj").with_timeout(5),
        )
        .unwrap();

        let err = client
            .synthesize(request("Hi."), &Credential::new("jwt"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SynthesisBackendError::NetworkError(_) | SynthesisBackendError::Timeout
        ));
    }

    #[test]
    fn test_execution_url_has_single_trailing_slash() {
        let client =
            HttpSynthesisClient::new(HttpSynthesisClientConfig::new("https://fn.example.com/v1/", "p"))
                .unwrap();
        assert_eq!(client.execution_url(), "https://fn.example.com/v1/");
    }
}
