//! 上传流程中的错误类型

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// 连接失败、超时、TLS 错误等传输层问题
    #[error("网络请求失败: {0}")]
    Network(String),

    /// 服务器返回了非 2xx 状态码。`reason` 是该状态码的标准短语，
    /// 不是响应行里服务器自己写的文字
    #[error("请求 {url} 失败，服务器返回: {status} {reason}")]
    Http {
        url: String,
        status: u16,
        reason: String,
    },

    /// 凭证响应不是合法 JSON，或缺少必需字段
    #[error("上传凭证无效: {0}")]
    InvalidCredentials(String),

    #[error("图片处理失败: {0}")]
    Image(String),

    #[error("剪贴板操作失败: {0}")]
    Clipboard(String),

    #[error("打开链接失败: {0}")]
    Opener(String),

    #[error("配置错误: {0}")]
    Config(String),

    /// 上传完成之前触发了结果相关的操作
    #[error("上传尚未完成")]
    NotFinished,

    #[error("上传窗口不存在: {0}")]
    DialogNotFound(String),

    #[error("窗口操作失败: {0}")]
    Window(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        UploadError::Network(e.to_string())
    }
}

impl From<image::ImageError> for UploadError {
    fn from(e: image::ImageError) -> Self {
        UploadError::Image(e.to_string())
    }
}

impl From<arboard::Error> for UploadError {
    fn from(e: arboard::Error) -> Self {
        UploadError::Clipboard(e.to_string())
    }
}
