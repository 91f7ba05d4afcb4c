//! 图片标准化 - 基础设施层
//!
//! 把任意输入文件（图片或 PDF 首页）转换为可直接发送给模型的
//! Base64 JPEG：RGB、长边不超过上限、固定压缩质量。

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use tracing::debug;

use crate::config::Config;
use crate::error::ConversionError;
use crate::infrastructure::pdf_rasterizer::{PageRasterizer, PdfiumRasterizer};
use crate::models::InputFile;

/// 标准化后的图片载荷
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    /// Base64 编码的 JPEG 数据（不含 data URI 前缀）
    pub base64_jpeg: String,
    pub width: u32,
    pub height: u32,
}

impl ImagePayload {
    /// 以 data URI 形式返回，用于 Vision API 的 image_url
    pub fn data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.base64_jpeg)
    }
}

/// 图片标准化器
///
/// 持有 PDF 渲染器，只暴露"文件 → 载荷"的能力。
pub struct ImageNormalizer {
    max_edge: u32,
    jpeg_quality: u8,
    pdf_dpi: u32,
    rasterizer: Arc<dyn PageRasterizer>,
}

impl ImageNormalizer {
    pub fn new(config: &Config) -> Self {
        Self::with_rasterizer(config, Arc::new(PdfiumRasterizer::new()))
    }

    /// 使用自定义 PDF 渲染器创建
    pub fn with_rasterizer(config: &Config, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self {
            max_edge: config.max_image_edge.max(1),
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
            pdf_dpi: config.pdf_render_dpi,
            rasterizer,
        }
    }

    /// 将文件转换为 Base64 JPEG
    ///
    /// 步骤：解码（PDF 只取第一页）→ 转 RGB（丢弃 alpha）→ 按需缩小 → JPEG 编码。
    /// 任一步骤失败都返回错误，不会返回部分结果。
    pub fn normalize(&self, file: &InputFile) -> Result<ImagePayload, ConversionError> {
        let image = self.decode(file)?;

        let rgb = image.to_rgb8();
        let (src_w, src_h) = rgb.dimensions();
        let rgb = self.downscale(rgb);
        let (width, height) = rgb.dimensions();

        let jpeg = encode_jpeg(rgb, self.jpeg_quality)?;

        debug!(
            "图片预处理完成: {} ({}x{} -> {}x{}, {} 字节)",
            file.file_name(),
            src_w,
            src_h,
            width,
            height,
            jpeg.len()
        );

        Ok(ImagePayload {
            base64_jpeg: STANDARD.encode(&jpeg),
            width,
            height,
        })
    }

    fn decode(&self, file: &InputFile) -> Result<DynamicImage, ConversionError> {
        let path = Path::new(file.path());
        if file.is_pdf() {
            return self.rasterizer.rasterize_first_page(path, self.pdf_dpi);
        }

        let decode_error = |reason: String| ConversionError::Decode {
            path: file.path().to_string(),
            reason,
        };

        image::io::Reader::open(path)
            .map_err(|e| decode_error(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| decode_error(e.to_string()))?
            .decode()
            .map_err(|e| decode_error(e.to_string()))
    }

    /// 长边超过上限时等比缩小，从不放大
    fn downscale(&self, image: RgbImage) -> RgbImage {
        let (width, height) = image.dimensions();
        match fit_within(width, height, self.max_edge) {
            Some((new_w, new_h)) => image::imageops::resize(&image, new_w, new_h, FilterType::Lanczos3),
            None => image,
        }
    }
}

/// 计算缩小后的尺寸
///
/// 长边等于上限，短边四舍五入（至少 1 像素）；无需缩小时返回 `None`。
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> Option<(u32, u32)> {
    let long_edge = width.max(height);
    if long_edge <= max_edge {
        return None;
    }

    let scale = |short: u32| -> u32 {
        let scaled = (short as f64 * max_edge as f64 / long_edge as f64).round() as u32;
        scaled.max(1)
    };

    if width >= height {
        Some((max_edge, scale(height)))
    } else {
        Some((scale(width), max_edge))
    }
}

fn encode_jpeg(image: RgbImage, quality: u8) -> Result<Vec<u8>, ConversionError> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut cursor, ImageOutputFormat::Jpeg(quality))
        .map_err(|e| ConversionError::Encode {
            reason: e.to_string(),
        })?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    /// 渲染器桩：模拟 PDFium 缺失
    struct MissingRasterizer;

    impl PageRasterizer for MissingRasterizer {
        fn rasterize_first_page(&self, _path: &Path, _dpi: u32) -> Result<DynamicImage, ConversionError> {
            Err(ConversionError::RasterizerUnavailable {
                reason: "libpdfium.so: cannot open shared object file".to_string(),
            })
        }
    }

    /// 渲染器桩：返回固定尺寸的白页
    struct BlankPageRasterizer {
        width: u32,
        height: u32,
    }

    impl PageRasterizer for BlankPageRasterizer {
        fn rasterize_first_page(&self, _path: &Path, _dpi: u32) -> Result<DynamicImage, ConversionError> {
            Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
                self.width,
                self.height,
                image::Rgb([255, 255, 255]),
            )))
        }
    }

    fn normalizer_with_edge(max_edge: u32, rasterizer: Arc<dyn PageRasterizer>) -> ImageNormalizer {
        let config = Config {
            max_image_edge: max_edge,
            ..Config::default()
        };
        ImageNormalizer::with_rasterizer(&config, rasterizer)
    }

    fn decode_payload(payload: &ImagePayload) -> DynamicImage {
        let bytes = STANDARD.decode(&payload.base64_jpeg).unwrap();
        image::load_from_memory(&bytes).unwrap()
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(3000, 1500, 2048), Some((2048, 1024)));
        assert_eq!(fit_within(1500, 3000, 2048), Some((1024, 2048)));
        assert_eq!(fit_within(2100, 700, 2048), Some((2048, 683)));
        assert_eq!(fit_within(2048, 2048, 2048), None);
        assert_eq!(fit_within(1000, 800, 2048), None);
        assert_eq!(fit_within(10000, 1, 2048), Some((2048, 1)));
    }

    #[test]
    fn test_oversized_image_is_downscaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbImage::new(2100, 700).save(&path).unwrap();

        let normalizer = normalizer_with_edge(2048, Arc::new(MissingRasterizer));
        let payload = normalizer
            .normalize(&InputFile::new(path.to_string_lossy()))
            .unwrap();

        assert_eq!((payload.width, payload.height), (2048, 683));
        let decoded = decode_payload(&payload);
        assert_eq!(decoded.dimensions(), (2048, 683));
    }

    #[test]
    fn test_small_image_is_not_resized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.jpg");
        RgbImage::new(100, 80).save(&path).unwrap();

        let normalizer = normalizer_with_edge(2048, Arc::new(MissingRasterizer));
        let payload = normalizer
            .normalize(&InputFile::new(path.to_string_lossy()))
            .unwrap();

        assert_eq!((payload.width, payload.height), (100, 80));
        assert!(payload.data_uri().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_alpha_is_flattened_to_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transparent.png");
        RgbaImage::from_pixel(40, 30, Rgba([10, 20, 30, 0]))
            .save(&path)
            .unwrap();

        let normalizer = normalizer_with_edge(2048, Arc::new(MissingRasterizer));
        let payload = normalizer
            .normalize(&InputFile::new(path.to_string_lossy()))
            .unwrap();

        let decoded = decode_payload(&payload);
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
        // alpha 被直接丢弃，而不是与白色背景混合
        let pixel = decoded.to_rgb8().get_pixel(20, 15).0;
        assert!(pixel.iter().all(|&c| c < 80), "pixel was composited: {:?}", pixel);
    }

    #[test]
    fn test_corrupt_file_fails_without_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let normalizer = normalizer_with_edge(2048, Arc::new(MissingRasterizer));
        let err = normalizer
            .normalize(&InputFile::new(path.to_string_lossy()))
            .unwrap_err();
        assert!(matches!(err, ConversionError::Decode { .. }));
    }

    #[test]
    fn test_missing_file_fails() {
        let normalizer = normalizer_with_edge(2048, Arc::new(MissingRasterizer));
        let err = normalizer
            .normalize(&InputFile::new("/nonexistent/essay.png"))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/essay.png"));
    }

    #[test]
    fn test_pdf_without_rasterizer_reports_platform_cause() {
        let normalizer = normalizer_with_edge(2048, Arc::new(MissingRasterizer));
        let err = normalizer
            .normalize(&InputFile::new("/tmp/essay.pdf"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::RasterizerUnavailable { .. }));
        assert!(err.to_string().contains("PDFIUM_DYNAMIC_LIB_PATH"));
    }

    #[test]
    fn test_pdf_first_page_is_normalized() {
        let normalizer = normalizer_with_edge(
            64,
            Arc::new(BlankPageRasterizer {
                width: 170,
                height: 240,
            }),
        );
        let payload = normalizer.normalize(&InputFile::new("/tmp/essay.PDF")).unwrap();
        assert_eq!((payload.width, payload.height), (45, 64));
    }
}
