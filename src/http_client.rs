use crate::error::UploadError;
use reqwest::multipart::Form;
use std::time::Duration;
use tracing::debug;

/// HTTP客户端配置
#[derive(Debug, Clone, Default)]
pub struct HttpClientConfig {
    /// 为 None 时不设置超时，沿用 reqwest 默认行为
    pub timeout_seconds: Option<u64>,
}

/// HTTP客户端
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// 创建新的HTTP客户端
    pub fn new(config: HttpClientConfig) -> Result<Self, UploadError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("ImgS3Uploader/", env!("CARGO_PKG_VERSION")));

        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        let client = builder
            .build()
            .map_err(|e| UploadError::Network(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self { client })
    }

    /// 发送GET请求，返回响应文本
    pub async fn get_text(&self, url: &str) -> Result<String, UploadError> {
        debug!("发送GET请求: {}", url);

        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(url, response).await?;

        Ok(response.text().await?)
    }

    /// 发送 multipart/form-data POST 请求，返回响应文本
    pub async fn post_multipart(&self, url: &str, form: Form) -> Result<String, UploadError> {
        debug!("发送POST请求: {}", url);

        let response = self.client.post(url).multipart(form).send().await?;
        let response = Self::ensure_success(url, response).await?;

        Ok(response.text().await?)
    }

    /// 非 2xx 状态码转换为 `UploadError::Http`，并记录响应细节便于排查
    async fn ensure_success(
        url: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, UploadError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await.unwrap_or_default();

        debug!(
            status = status.as_u16(),
            content_type = %content_type,
            body = %body,
            "请求返回错误状态: {}",
            reason
        );

        Err(UploadError::Http {
            url: url.to_string(),
            status: status.as_u16(),
            reason,
        })
    }
}
