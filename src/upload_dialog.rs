//! 上传对话框的状态机
//!
//! `Init → FetchingCredentials → Uploading → {Failed, Succeeded}`，
//! 成功后根据“上传后复制并关闭”设置进入 `Closed` 或 `ResultDisplayed`。
//! 剪贴板、打开链接、系统通知、关窗这些桌面副作用都经由 `DesktopActions`，
//! 状态机本身不依赖窗口系统。

use crate::error::UploadError;
use crate::upload_image::{UploadImage, DRAG_THUMBNAIL_SIZE};
use crate::uploader::{UploadPhase, UploadResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

pub const UPLOADING_TEXT: &str = "正在上传图片";
pub const URL_COPIED: &str = "URL 已复制到剪贴板";
pub const UNABLE_TO_OPEN_URL: &str = "无法打开该链接";
pub const IMAGE_COPIED: &str = "截图已复制到剪贴板";

/// 对话框需要的桌面能力
pub trait DesktopActions: Send + Sync + 'static {
    fn set_clipboard_text(&self, text: &str) -> Result<(), UploadError>;
    fn set_clipboard_image(&self, image: &UploadImage) -> Result<(), UploadError>;
    fn open_url(&self, url: &str) -> Result<(), UploadError>;
    fn send_notification(&self, message: &str);
    fn close(&self);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DialogState {
    Init,
    FetchingCredentials,
    Uploading,
    Failed { message: String },
    ResultDisplayed { result: UploadResult },
    Closed,
}

impl DialogState {
    fn is_in_progress(&self) -> bool {
        matches!(
            self,
            DialogState::Init | DialogState::FetchingCredentials | DialogState::Uploading
        )
    }
}

/// 前端渲染所需的全部信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogView {
    pub state: DialogState,
    pub status_text: Option<String>,
    pub show_spinner: bool,
    pub accent_color: String,
    pub escape_closes: bool,
    pub notice: Option<String>,
}

/// 拖出预览图时携带的数据：链接、完整 PNG 和拖拽时显示的缩略图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    pub image_url: String,
    pub image_data: String,
    pub thumbnail: String,
}

impl DragPayload {
    pub fn new(image_url: String, image: &UploadImage) -> Result<Self, UploadError> {
        Ok(Self {
            image_url,
            image_data: image.to_data_url()?,
            thumbnail: image.thumbnail_data_url(DRAG_THUMBNAIL_SIZE)?,
        })
    }
}

pub struct UploadDialog<A: DesktopActions> {
    image: Arc<UploadImage>,
    actions: A,
    accent_color: String,
    state: DialogState,
    escape_closes: bool,
    notice: Option<String>,
}

impl<A: DesktopActions> UploadDialog<A> {
    pub fn new(image: Arc<UploadImage>, actions: A, accent_color: impl Into<String>) -> Self {
        Self {
            image,
            actions,
            accent_color: accent_color.into(),
            state: DialogState::Init,
            escape_closes: false,
            notice: None,
        }
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == DialogState::Closed
    }

    pub fn on_phase(&mut self, phase: UploadPhase) {
        if !self.state.is_in_progress() {
            return;
        }
        self.state = match phase {
            UploadPhase::FetchingCredentials => DialogState::FetchingCredentials,
            UploadPhase::Uploading => DialogState::Uploading,
        };
    }

    /// 处理上传结果；终态之后到达的结果直接忽略
    pub fn on_finished(
        &mut self,
        outcome: Result<UploadResult, UploadError>,
        copy_and_close: bool,
    ) {
        if !self.state.is_in_progress() {
            return;
        }

        match outcome {
            Ok(result) if copy_and_close => match self.actions.set_clipboard_text(&result.image_url) {
                Ok(()) => {
                    self.actions.send_notification(URL_COPIED);
                    self.close();
                }
                Err(e) => {
                    // 复制失败就退回到展示结果，让用户手动复制
                    warn!("上传后复制链接失败: {}", e);
                    self.show_result(result);
                    self.notice = Some(e.to_string());
                }
            },
            Ok(result) => self.show_result(result),
            Err(e) => {
                self.state = DialogState::Failed {
                    message: e.to_string(),
                };
                self.escape_closes = true;
            }
        }
    }

    fn show_result(&mut self, result: UploadResult) {
        self.state = DialogState::ResultDisplayed { result };
        self.escape_closes = true;
    }

    fn result(&self) -> Result<&UploadResult, UploadError> {
        match &self.state {
            DialogState::ResultDisplayed { result } => Ok(result),
            _ => Err(UploadError::NotFinished),
        }
    }

    pub fn copy_url(&mut self) -> Result<(), UploadError> {
        let url = self.result()?.image_url.clone();
        self.notice = Some(match self.actions.set_clipboard_text(&url) {
            Ok(()) => URL_COPIED.to_string(),
            Err(e) => e.to_string(),
        });
        Ok(())
    }

    pub fn open_url(&mut self) -> Result<(), UploadError> {
        let url = self.result()?.image_url.clone();
        self.open_or_notice(Some(url));
        Ok(())
    }

    pub fn open_delete_url(&mut self) -> Result<(), UploadError> {
        let url = self.result()?.delete_url.clone();
        self.open_or_notice(url);
        Ok(())
    }

    fn open_or_notice(&mut self, url: Option<String>) {
        let opened = match url {
            Some(url) => match self.actions.open_url(&url) {
                Ok(()) => true,
                Err(e) => {
                    warn!("打开链接失败: {}", e);
                    false
                }
            },
            None => false,
        };
        if !opened {
            self.notice = Some(UNABLE_TO_OPEN_URL.to_string());
        }
    }

    pub fn copy_image(&mut self) -> Result<(), UploadError> {
        self.result()?;
        self.notice = Some(match self.actions.set_clipboard_image(&self.image) {
            Ok(()) => IMAGE_COPIED.to_string(),
            Err(e) => e.to_string(),
        });
        Ok(())
    }

    /// 结果展示后的链接和截图，预览和拖拽数据由调用方在锁外生成
    pub fn displayed_image(&self) -> Result<(String, Arc<UploadImage>), UploadError> {
        let image_url = self.result()?.image_url.clone();
        Ok((image_url, Arc::clone(&self.image)))
    }

    /// Esc 只在终态下生效，返回是否关闭
    pub fn handle_escape(&mut self) -> bool {
        if self.escape_closes && !self.is_closed() {
            self.close();
            true
        } else {
            false
        }
    }

    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        info!("关闭上传窗口");
        self.state = DialogState::Closed;
        self.actions.close();
    }

    pub fn view(&self) -> DialogView {
        let status_text = match &self.state {
            DialogState::Init | DialogState::FetchingCredentials | DialogState::Uploading => {
                Some(UPLOADING_TEXT.to_string())
            }
            DialogState::Failed { message } => Some(message.clone()),
            DialogState::ResultDisplayed { .. } | DialogState::Closed => None,
        };

        DialogView {
            state: self.state.clone(),
            status_text,
            show_spinner: self.state.is_in_progress(),
            accent_color: self.accent_color.clone(),
            escape_closes: self.escape_closes,
            notice: self.notice.clone(),
        }
    }
}
