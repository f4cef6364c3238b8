use crate::error::UploadError;
use base64::{engine::general_purpose as b64_engine, Engine as _};
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use std::borrow::Cow;
use std::path::Path;

/// 拖拽时显示的缩略图边长
pub const DRAG_THUMBNAIL_SIZE: u32 = 256;

/// 待上传的截图，上传开始后不再修改
#[derive(Debug, Clone)]
pub struct UploadImage {
    pixels: RgbaImage,
}

impl UploadImage {
    pub fn from_rgba(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, UploadError> {
        let pixels = RgbaImage::from_raw(width, height, bytes)
            .ok_or_else(|| UploadError::Image("像素数据长度与尺寸不匹配".to_string()))?;
        if width == 0 || height == 0 {
            return Err(UploadError::Image("图片尺寸为空".to_string()));
        }
        Ok(Self { pixels })
    }

    /// 从文件加载，任何 image 支持的格式都会转成 RGBA
    pub fn open(path: &Path) -> Result<Self, UploadError> {
        let img = image::open(path)
            .map_err(|e| UploadError::Image(format!("读取图片 {} 失败: {}", path.display(), e)))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw())
    }

    /// 从系统剪贴板读取图片
    pub fn from_clipboard() -> Result<Self, UploadError> {
        let mut clipboard = arboard::Clipboard::new()?;
        let data = clipboard
            .get_image()
            .map_err(|_| UploadError::Clipboard("剪贴板中没有图片".to_string()))?;
        Self::from_rgba(data.width as u32, data.height as u32, data.bytes.into_owned())
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// 编码为 PNG 字节，上传时放在 `file` 字段
    pub fn to_png(&self) -> Result<Vec<u8>, UploadError> {
        encode_png(&self.pixels)
    }

    /// 预览用的 data URL
    pub fn to_data_url(&self) -> Result<String, UploadError> {
        Ok(png_data_url(&self.to_png()?))
    }

    /// 拖拽缩略图：等比缩放到 `max_side` 见方以内，长边对齐到 `max_side`
    pub fn thumbnail_data_url(&self, max_side: u32) -> Result<String, UploadError> {
        let (width, height) = fitted_size(self.width(), self.height(), max_side);
        let scaled = image::imageops::resize(&self.pixels, width, height, FilterType::Triangle);
        Ok(png_data_url(&encode_png(&scaled)?))
    }

    /// 转成 arboard 的图片格式，用于写入剪贴板
    pub fn to_clipboard_data(&self) -> arboard::ImageData<'_> {
        arboard::ImageData {
            width: self.width() as usize,
            height: self.height() as usize,
            bytes: Cow::Borrowed(self.pixels.as_raw()),
        }
    }
}

fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>, UploadError> {
    let mut png_bytes: Vec<u8> = Vec::new();
    PngEncoder::new(&mut png_bytes).write_image(
        pixels.as_raw(),
        pixels.width(),
        pixels.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(png_bytes)
}

fn png_data_url(png_bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", b64_engine::STANDARD.encode(png_bytes))
}

fn fitted_size(width: u32, height: u32, target: u32) -> (u32, u32) {
    let scale = f64::min(
        target as f64 / width as f64,
        target as f64 / height as f64,
    );
    let w = ((width as f64 * scale).round() as u32).clamp(1, target);
    let h = ((height as f64 * scale).round() as u32).clamp(1, target);
    (w, h)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_image() -> UploadImage {
        let mut bytes = Vec::with_capacity(4 * 3 * 4);
        for i in 0..12u8 {
            bytes.extend_from_slice(&[i * 20, 255 - i * 20, 128, 255]);
        }
        UploadImage::from_rgba(4, 3, bytes).unwrap()
    }

    #[test]
    fn png_round_trip_keeps_pixels() {
        let image = sample_image();
        let png = image.to_png().unwrap();

        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.as_raw(), image.pixels.as_raw());
    }

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(UploadImage::from_rgba(4, 4, vec![0; 10]).is_err());
        assert!(UploadImage::from_rgba(0, 0, vec![]).is_err());
    }

    #[test]
    fn thumbnail_fits_inside_target() {
        assert_eq!(fitted_size(1000, 500, 256), (256, 128));
        assert_eq!(fitted_size(100, 400, 256), (64, 256));
        assert_eq!(fitted_size(1920, 1080, 256), (256, 144));

        let url = sample_image().thumbnail_data_url(8).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        let encoded = url.trim_start_matches("data:image/png;base64,");
        let png = b64_engine::STANDARD.decode(encoded).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn thumbnail_of_thin_image_stays_bounded() {
        assert_eq!(fitted_size(1, 2000, 256), (1, 256));
        assert_eq!(fitted_size(4000, 2, 256), (256, 1));

        let thin = UploadImage::from_rgba(1, 2000, vec![200; 2000 * 4]).unwrap();
        let url = thin.thumbnail_data_url(DRAG_THUMBNAIL_SIZE).unwrap();
        let encoded = url.trim_start_matches("data:image/png;base64,");
        let png = b64_engine::STANDARD.decode(encoded).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1, 256));
    }

    #[test]
    fn clipboard_data_borrows_rgba() {
        let image = sample_image();
        let data = image.to_clipboard_data();
        assert_eq!((data.width, data.height), (4, 3));
        assert_eq!(data.bytes.len(), 4 * 3 * 4);
    }
}
