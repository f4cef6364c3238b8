//! 两步上传：先向凭证接口申请预签名表单，再把图片直传到对象存储

use crate::credentials::{CredentialsResponse, PresignedFields};
use crate::error::UploadError;
use crate::http_client::{HttpClient, HttpClientConfig};
use crate::settings::UploaderSettings;
use crate::upload_image::UploadImage;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tracing::info;

/// 默认的凭证接口地址
pub const DEFAULT_CREDENTIALS_URL: &str = "https://api.img.rnd.namecheap.net/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadPhase {
    FetchingCredentials,
    Uploading,
}

/// 上传成功后用于展示和交互的链接
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub image_url: String,
    pub delete_url: Option<String>,
}

pub struct ImgS3Uploader {
    client: HttpClient,
    credentials_url: String,
}

impl ImgS3Uploader {
    pub fn new(
        credentials_url: impl Into<String>,
        config: HttpClientConfig,
    ) -> Result<Self, UploadError> {
        Ok(Self {
            client: HttpClient::new(config)?,
            credentials_url: credentials_url.into(),
        })
    }

    pub fn from_settings(settings: &UploaderSettings) -> Result<Self, UploadError> {
        Self::new(
            settings.credentials_url.clone(),
            HttpClientConfig {
                timeout_seconds: settings.timeout_seconds,
            },
        )
    }

    /// 第一步：获取上传凭证
    pub async fn fetch_credentials(&self) -> Result<CredentialsResponse, UploadError> {
        let body = self.client.get_text(&self.credentials_url).await?;
        CredentialsResponse::parse(&body)
    }

    /// 第二步：用凭证里的表单字段和 PNG 数据向存储端 POST
    pub async fn upload_to_s3(
        &self,
        credentials: &CredentialsResponse,
        image: &UploadImage,
    ) -> Result<UploadResult, UploadError> {
        let form = presigned_form(&credentials.form_data.fields, image.to_png()?)?;
        self.client
            .post_multipart(&credentials.form_data.url, form)
            .await?;

        Ok(UploadResult {
            image_url: credentials.result_url.clone(),
            delete_url: credentials.delete_url().map(str::to_string),
        })
    }

    /// 完整流程。上传请求只会在凭证解析成功之后发出。
    pub async fn upload<F>(
        &self,
        image: &UploadImage,
        mut on_phase: F,
    ) -> Result<UploadResult, UploadError>
    where
        F: FnMut(UploadPhase),
    {
        on_phase(UploadPhase::FetchingCredentials);
        let credentials = self.fetch_credentials().await?;
        info!("已获取上传凭证，目标: {}", credentials.form_data.url);

        on_phase(UploadPhase::Uploading);
        let result = self.upload_to_s3(&credentials, image).await?;
        info!("图片上传成功: {}", result.image_url);

        Ok(result)
    }
}

/// 构造预签名 POST 表单：十个字段原样写入，最后是名为 `file` 的 PNG
pub fn presigned_form(fields: &PresignedFields, png: Vec<u8>) -> Result<Form, UploadError> {
    let mut form = Form::new();
    for (name, value) in fields.ordered() {
        form = form.text(name, value.to_string());
    }

    let file = Part::bytes(png)
        .mime_str("image/png")
        .map_err(|e| UploadError::Image(e.to_string()))?;

    Ok(form.part("file", file))
}
