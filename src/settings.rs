use crate::error::UploadError;
use crate::uploader::DEFAULT_CREDENTIALS_URL;
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploaderSettings {
    // 上传成功后直接复制链接并关闭对话框
    pub copy_and_close_after_upload: bool,
    // 界面主色，用于加载动画
    pub ui_color: String,
    // 凭证接口
    pub credentials_url: String,
    // 请求超时（秒），None 表示不限制
    pub timeout_seconds: Option<u64>,
}

impl Default for UploaderSettings {
    fn default() -> Self {
        Self {
            copy_and_close_after_upload: false,
            ui_color: "#740096".to_string(),
            credentials_url: DEFAULT_CREDENTIALS_URL.to_string(),
            timeout_seconds: None,
        }
    }
}

impl UploaderSettings {
    /// 获取默认的应用数据目录
    pub fn get_default_data_directory() -> Result<PathBuf, UploadError> {
        let app_data_dir = dirs::data_local_dir()
            .ok_or_else(|| UploadError::Config("无法获取本地数据目录".to_string()))?
            .join("imgs3uploader");

        fs::create_dir_all(&app_data_dir)
            .map_err(|e| UploadError::Config(format!("创建应用数据目录失败: {}", e)))?;
        Ok(app_data_dir)
    }

    /// 默认设置文件路径
    pub fn default_settings_path() -> Result<PathBuf, UploadError> {
        Ok(Self::get_default_data_directory()?.join("settings.json"))
    }

    /// 从文件加载设置，失败时写出并返回默认值
    pub fn load(path: &Path) -> Self {
        match Self::load_from_file(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("加载设置失败，使用默认设置: {}", e);
                let default_settings = Self::default();
                if let Err(e) = default_settings.save(path) {
                    warn!("保存默认设置失败: {}", e);
                }
                default_settings
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, UploadError> {
        let content = fs::read_to_string(path)
            .map_err(|e| UploadError::Config(format!("读取设置文件失败: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| UploadError::Config(format!("解析设置文件失败: {}", e)))
    }

    /// 保存设置到文件
    pub fn save(&self, path: &Path) -> Result<(), UploadError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| UploadError::Config(format!("创建设置目录失败: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| UploadError::Config(format!("序列化设置失败: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| UploadError::Config(format!("写入设置文件失败: {}", e)))
    }

    /// 转换为JSON值（用于前端）
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "copyAndCloseAfterUpload": self.copy_and_close_after_upload,
            "uiColor": self.ui_color,
            "credentialsUrl": self.credentials_url,
            "timeoutSeconds": self.timeout_seconds,
        })
    }

    /// 从JSON值更新设置（来自前端），只改动出现的键
    pub fn update_from_json(&mut self, json: &serde_json::Value) {
        if let Some(v) = json.get("copyAndCloseAfterUpload").and_then(|v| v.as_bool()) {
            self.copy_and_close_after_upload = v;
        }
        if let Some(v) = json.get("uiColor").and_then(|v| v.as_str()) {
            self.ui_color = v.to_string();
        }
        if let Some(v) = json.get("credentialsUrl").and_then(|v| v.as_str()) {
            if !v.trim().is_empty() {
                self.credentials_url = v.trim().to_string();
            }
        }
        if let Some(v) = json.get("timeoutSeconds") {
            // null 或 0 都表示不限制
            self.timeout_seconds = v.as_u64().filter(|s| *s > 0);
        }
    }
}

// =================== 全局设置 ===================

static SETTINGS_PATH: OnceCell<PathBuf> = OnceCell::new();

static GLOBAL_SETTINGS: Lazy<Mutex<UploaderSettings>> = Lazy::new(|| {
    match settings_path() {
        Ok(path) => Mutex::new(UploaderSettings::load(&path)),
        Err(e) => {
            warn!("无法确定设置文件位置: {}", e);
            Mutex::new(UploaderSettings::default())
        }
    }
});

/// 指定设置文件位置，需在首次读取设置之前调用
pub fn set_settings_path(path: PathBuf) {
    if SETTINGS_PATH.set(path.clone()).is_err() {
        warn!("设置文件位置已确定，忽略: {}", path.display());
    } else {
        info!("使用设置文件: {}", path.display());
    }
}

fn settings_path() -> Result<PathBuf, UploadError> {
    match SETTINGS_PATH.get() {
        Some(path) => Ok(path.clone()),
        None => UploaderSettings::default_settings_path(),
    }
}

/// 获取全局设置
pub fn get_global_settings() -> UploaderSettings {
    GLOBAL_SETTINGS.lock().clone()
}

/// 更新全局设置并保存
pub fn update_global_settings(settings: UploaderSettings) -> Result<(), UploadError> {
    *GLOBAL_SETTINGS.lock() = settings.clone();
    settings.save(&settings_path()?)
}

/// 从JSON更新全局设置
pub fn update_global_settings_from_json(json: &serde_json::Value) -> Result<(), UploadError> {
    let mut settings = get_global_settings();
    settings.update_from_json(json);
    update_global_settings(settings)
}
