use crate::error::UploadError;
use crate::settings;
use crate::upload_dialog::{DesktopActions, DialogView, DragPayload, UploadDialog};
use crate::upload_image::UploadImage;
use crate::uploader::ImgS3Uploader;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tauri::async_runtime::JoinHandle;
use tauri::{AppHandle, Emitter, Manager, WebviewWindow, WebviewWindowBuilder, WindowEvent};
use tauri_plugin_notification::NotificationExt;
use tauri_plugin_opener::OpenerExt;
use tracing::{info, warn};

/// 状态变化时发给对话框窗口的事件
pub const DIALOG_CHANGED_EVENT: &str = "upload-dialog-changed";

// 用于生成唯一的窗口标识
static DIALOG_COUNTER: AtomicUsize = AtomicUsize::new(0);

// 每个上传窗口的状态和后台任务
static UPLOAD_DIALOGS: Lazy<Mutex<HashMap<String, DialogEntry>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

struct DialogEntry {
    dialog: UploadDialog<TauriActions>,
    task: Option<JoinHandle<()>>,
}

/// 基于 Tauri 插件和 arboard 的桌面操作
pub struct TauriActions {
    app: AppHandle,
    label: String,
}

impl DesktopActions for TauriActions {
    fn set_clipboard_text(&self, text: &str) -> Result<(), UploadError> {
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.set_text(text.to_string())?;
        Ok(())
    }

    fn set_clipboard_image(&self, image: &UploadImage) -> Result<(), UploadError> {
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.set_image(image.to_clipboard_data())?;
        Ok(())
    }

    fn open_url(&self, url: &str) -> Result<(), UploadError> {
        self.app
            .opener()
            .open_url(url, None::<&str>)
            .map_err(|e| UploadError::Opener(e.to_string()))
    }

    fn send_notification(&self, message: &str) {
        if let Err(e) = self
            .app
            .notification()
            .builder()
            .title("ImgS3")
            .body(message)
            .show()
        {
            warn!("发送系统通知失败: {}", e);
        }
    }

    fn close(&self) {
        // 调用方还持有对话框表的锁，关窗放到异步任务里做
        let app = self.app.clone();
        let label = self.label.clone();
        tauri::async_runtime::spawn(async move {
            if let Some(window) = app.get_webview_window(&label) {
                if let Err(e) = window.close() {
                    warn!("关闭上传窗口失败: {}", e);
                }
            }
        });
    }
}

/// 创建上传窗口并立即开始上传，返回窗口标识
pub fn open_upload_dialog(app: &AppHandle, image: UploadImage) -> Result<String, UploadError> {
    let settings = settings::get_global_settings();
    let uploader = ImgS3Uploader::from_settings(&settings)?;

    let counter = DIALOG_COUNTER.fetch_add(1, Ordering::SeqCst);
    let label = format!("upload-{}", counter);
    let image = Arc::new(image);

    let dialog = UploadDialog::new(
        Arc::clone(&image),
        TauriActions {
            app: app.clone(),
            label: label.clone(),
        },
        settings.ui_color.clone(),
    );
    UPLOAD_DIALOGS
        .lock()
        .insert(label.clone(), DialogEntry { dialog, task: None });

    let window = match create_upload_window(app, &label) {
        Ok(window) => window,
        Err(e) => {
            UPLOAD_DIALOGS.lock().remove(&label);
            return Err(e);
        }
    };

    // 窗口销毁时丢弃状态并中止还在进行的请求
    let destroyed_label = label.clone();
    window.on_window_event(move |event| {
        if let WindowEvent::Destroyed = event {
            forget_dialog(&destroyed_label);
        }
    });

    let task = tauri::async_runtime::spawn(run_upload(
        app.clone(),
        label.clone(),
        uploader,
        image,
        settings.copy_and_close_after_upload,
    ));

    match UPLOAD_DIALOGS.lock().get_mut(&label) {
        Some(entry) => entry.task = Some(task),
        // 窗口在任务登记前就已关闭
        None => task.abort(),
    }

    info!("已打开上传窗口: {}", label);
    Ok(label)
}

fn create_upload_window(app: &AppHandle, label: &str) -> Result<WebviewWindow, UploadError> {
    WebviewWindowBuilder::new(app, label, tauri::WebviewUrl::App("upload.html".into()))
        .title("上传到 ImgS3")
        .inner_size(420.0, 360.0)
        .min_inner_size(320.0, 200.0)
        .center()
        .focused(true)
        .build()
        .map_err(|e| UploadError::Window(format!("创建上传窗口失败: {}", e)))
}

async fn run_upload(
    app: AppHandle,
    label: String,
    uploader: ImgS3Uploader,
    image: Arc<UploadImage>,
    copy_and_close: bool,
) {
    let outcome = uploader
        .upload(&image, |phase| {
            update_dialog(&app, &label, |dialog| dialog.on_phase(phase));
        })
        .await;

    if let Err(e) = &outcome {
        warn!("上传失败: {}", e);
    }

    update_dialog(&app, &label, move |dialog| {
        dialog.on_finished(outcome, copy_and_close)
    });
}

/// 在锁内修改对话框，释放锁后把最新视图推给窗口
fn update_dialog<R>(
    app: &AppHandle,
    label: &str,
    f: impl FnOnce(&mut UploadDialog<TauriActions>) -> R,
) -> Option<R> {
    let (ret, view) = {
        let mut dialogs = UPLOAD_DIALOGS.lock();
        let entry = dialogs.get_mut(label)?;
        let ret = f(&mut entry.dialog);
        (ret, entry.dialog.view())
    };

    if let Err(e) = app.emit_to(label, DIALOG_CHANGED_EVENT, &view) {
        warn!("推送上传窗口状态失败: {}", e);
    }

    Some(ret)
}

fn forget_dialog(label: &str) {
    if let Some(entry) = UPLOAD_DIALOGS.lock().remove(label) {
        if let Some(task) = entry.task {
            task.abort();
        }
        info!("上传窗口已销毁: {}", label);
    }
}

/// 对按钮操作的统一处理：执行后返回最新视图
fn dialog_action(
    window: &WebviewWindow,
    action: impl FnOnce(&mut UploadDialog<TauriActions>) -> Result<(), UploadError>,
) -> Result<DialogView, String> {
    let label = window.label().to_string();
    update_dialog(window.app_handle(), &label, |dialog| {
        action(dialog)?;
        Ok::<_, UploadError>(dialog.view())
    })
    .ok_or_else(|| UploadError::DialogNotFound(label).to_string())?
    .map_err(|e| e.to_string())
}

// =================== 前端命令 ===================

#[tauri::command]
pub fn get_upload_dialog_view(window: WebviewWindow) -> Result<DialogView, String> {
    dialog_action(&window, |_| Ok(()))
}

#[tauri::command]
pub fn copy_upload_url(window: WebviewWindow) -> Result<DialogView, String> {
    dialog_action(&window, |dialog| dialog.copy_url())
}

#[tauri::command]
pub fn open_upload_url(window: WebviewWindow) -> Result<DialogView, String> {
    dialog_action(&window, |dialog| dialog.open_url())
}

#[tauri::command]
pub fn open_upload_delete_url(window: WebviewWindow) -> Result<DialogView, String> {
    dialog_action(&window, |dialog| dialog.open_delete_url())
}

#[tauri::command]
pub fn copy_upload_image(window: WebviewWindow) -> Result<DialogView, String> {
    dialog_action(&window, |dialog| dialog.copy_image())
}

/// 取出已上传的链接和截图；编码在锁外进行，不阻塞其他窗口
fn displayed_image(window: &WebviewWindow) -> Result<(String, Arc<UploadImage>), String> {
    let label = window.label().to_string();
    let dialogs = UPLOAD_DIALOGS.lock();
    let entry = dialogs
        .get(&label)
        .ok_or_else(|| UploadError::DialogNotFound(label.clone()).to_string())?;
    entry.dialog.displayed_image().map_err(|e| e.to_string())
}

/// 结果展示时由前端取一次预览，按钮操作返回的视图不再携带图片
#[tauri::command]
pub fn get_upload_preview(window: WebviewWindow) -> Result<String, String> {
    let (_, image) = displayed_image(&window)?;
    image.to_data_url().map_err(|e| e.to_string())
}

/// 前端在预览图上按下鼠标时才请求，拖拽数据不预先生成
#[tauri::command]
pub fn get_upload_drag_payload(window: WebviewWindow) -> Result<DragPayload, String> {
    let (image_url, image) = displayed_image(&window)?;
    DragPayload::new(image_url, &image).map_err(|e| e.to_string())
}

/// `escape` 为 true 时只在终态下关闭；窗口自带的关闭按钮不受限制
#[tauri::command]
pub fn close_upload_dialog(window: WebviewWindow, escape: bool) -> Result<bool, String> {
    let label = window.label().to_string();
    update_dialog(window.app_handle(), &label, |dialog| {
        if escape {
            dialog.handle_escape()
        } else {
            dialog.close();
            true
        }
    })
    .ok_or_else(|| UploadError::DialogNotFound(label).to_string())
}

#[tauri::command]
pub fn get_settings() -> Result<serde_json::Value, String> {
    Ok(settings::get_global_settings().to_json())
}

#[tauri::command]
pub fn save_settings(settings: serde_json::Value) -> Result<(), String> {
    settings::update_global_settings_from_json(&settings).map_err(|e| e.to_string())
}
