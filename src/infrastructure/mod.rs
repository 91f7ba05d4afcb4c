//! 基础设施层：持有与平台相关的资源（PDFium），只暴露"文件 → 图片载荷"的能力

pub mod image_normalizer;
pub mod pdf_rasterizer;

pub use image_normalizer::{fit_within, ImageNormalizer, ImagePayload};
pub use pdf_rasterizer::{PageRasterizer, PdfiumRasterizer};
