// =================== 模块引入 ===================
mod credentials;
mod dialog_window;
mod error;
mod http_client;
mod logging;
mod settings;
mod upload_dialog;
mod upload_image;
mod uploader;

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub use credentials::{CredentialsResponse, PresignedFields, FIELD_NAMES};
pub use error::UploadError;
pub use settings::UploaderSettings;
pub use upload_dialog::{DesktopActions, DialogState, DialogView, DragPayload, UploadDialog};
pub use upload_image::UploadImage;
pub use uploader::{ImgS3Uploader, UploadPhase, UploadResult, DEFAULT_CREDENTIALS_URL};

/// 把截图上传到 ImgS3 并展示分享链接
#[derive(Parser, Debug)]
#[command(name = "imgs3uploader", version)]
struct Args {
    /// 要上传的图片；省略时读取剪贴板中的图片
    image: Option<PathBuf>,

    /// 设置文件路径，默认位于本地数据目录
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn load_source_image(path: Option<&Path>) -> Result<UploadImage, UploadError> {
    match path {
        Some(path) => UploadImage::open(path),
        None => UploadImage::from_clipboard(),
    }
}

// =================== Tauri 应用入口 ===================
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    logging::init_logging();
    let args = Args::parse();

    info!("ImgS3Uploader v{} 启动", env!("CARGO_PKG_VERSION"));

    if let Some(path) = args.config {
        settings::set_settings_path(path);
    }

    let image = match load_source_image(args.image.as_deref()) {
        Ok(image) => image,
        Err(e) => {
            error!("没有可上传的图片: {}", e);
            std::process::exit(1);
        }
    };
    info!("待上传图片尺寸: {}x{}", image.width(), image.height());

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_notification::init())
        .setup(move |app| {
            dialog_window::open_upload_dialog(app.handle(), image)?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            dialog_window::get_upload_dialog_view,
            dialog_window::copy_upload_url,
            dialog_window::open_upload_url,
            dialog_window::open_upload_delete_url,
            dialog_window::copy_upload_image,
            dialog_window::get_upload_preview,
            dialog_window::get_upload_drag_payload,
            dialog_window::close_upload_dialog,
            dialog_window::get_settings,
            dialog_window::save_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
