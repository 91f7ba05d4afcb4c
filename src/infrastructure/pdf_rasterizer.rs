//! PDF 首页渲染 - 基础设施层
//!
//! 通过 PDFium 将 PDF 第一页渲染为位图。PDFium 是平台相关的动态库，
//! 找不到时返回 `ConversionError::RasterizerUnavailable`，与 PDF 本身的错误区分开。

use std::path::{Path, PathBuf};

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use crate::error::ConversionError;
use crate::infrastructure::image_normalizer::fit_within;

/// 渲染结果的最大边长，防止超大页面耗尽内存
const MAX_RENDER_DIMENSION_PX: u32 = 4096;

/// PDF 坐标单位：每英寸 72 点
const POINTS_PER_INCH: f32 = 72.0;

/// 分页文档渲染能力
///
/// 只渲染第一页；实现必须是无状态的，便于在后台线程中调用。
pub trait PageRasterizer: Send + Sync {
    fn rasterize_first_page(&self, path: &Path, dpi: u32) -> Result<DynamicImage, ConversionError>;
}

/// 基于 PDFium 的渲染器
///
/// `Pdfium` 本身不是 `Send`，因此每次渲染都重新绑定动态库（系统会缓存加载结果）。
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumRasterizer;

impl PdfiumRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize_first_page(&self, path: &Path, dpi: u32) -> Result<DynamicImage, ConversionError> {
        let pdfium = load_pdfium()?;
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| ConversionError::PdfRendering {
                reason: format!("无法打开 PDF ({}): {}", path.display(), e),
            })?;

        let pages = document.pages();
        if pages.len() == 0 {
            return Err(ConversionError::PdfRendering {
                reason: "PDF 没有任何页面".to_string(),
            });
        }

        let page = pages.get(0).map_err(|e| ConversionError::PdfRendering {
            reason: format!("无法读取第 1 页: {}", e),
        })?;

        let (target_w, target_h) =
            page_pixel_size(page.width().value, page.height().value, dpi);

        let config = PdfRenderConfig::new()
            .set_target_width(target_w as i32)
            .set_maximum_height(target_h as i32);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| ConversionError::PdfRendering {
                reason: format!("渲染第 1 页失败: {}", e),
            })?;

        debug!(
            width = target_w,
            height = target_h,
            "PDF 第 1 页渲染完成: {}",
            path.display()
        );

        Ok(bitmap.as_image())
    }
}

/// 绑定 PDFium 动态库
///
/// 设置了 `PDFIUM_DYNAMIC_LIB_PATH` 时只尝试该路径；否则依次尝试程序目录、
/// 程序目录下的 `pdfium/`，最后是系统库路径。
fn load_pdfium() -> Result<Pdfium, ConversionError> {
    let env_path = std::env::var("PDFIUM_DYNAMIC_LIB_PATH").ok();
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let from_env = env_path.is_some();

    let mut last_error = None;
    for candidate in library_candidates(env_path, exe_dir) {
        match Pdfium::bind_to_library(&candidate) {
            Ok(bindings) => {
                debug!(path = %candidate, "PDFium 已加载");
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => last_error = Some(format!("{}: {}", candidate, e)),
        }
    }

    let reason = match (from_env, last_error) {
        (true, Some(detail)) => format!("无法从 PDFIUM_DYNAMIC_LIB_PATH 加载 PDFium ({})", detail),
        _ => match Pdfium::bind_to_system_library() {
            Ok(bindings) => return Ok(Pdfium::new(bindings)),
            Err(e) => format!("未找到 PDFium 动态库: {}", e),
        },
    };
    warn!("{}", reason);
    Err(ConversionError::RasterizerUnavailable { reason })
}

/// PDFium 动态库的候选路径（系统库路径除外）
fn library_candidates(env_path: Option<String>, exe_dir: Option<PathBuf>) -> Vec<String> {
    if let Some(path) = env_path {
        return vec![path];
    }
    exe_dir
        .map(|dir| {
            [dir.clone(), dir.join("pdfium")]
                .iter()
                .map(|d| {
                    PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(
                        d.to_string_lossy().as_ref(),
                    ))
                })
                .map(|p| p.to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

/// 页面（PDF 点）在给定 DPI 下的像素尺寸
///
/// 长边超过上限时按 `fit_within` 的规则缩小；每条边至少 1 像素。
pub fn page_pixel_size(width_points: f32, height_points: f32, dpi: u32) -> (u32, u32) {
    let to_px = |points: f32| ((points * dpi as f32 / POINTS_PER_INCH).round() as u32).max(1);
    let (width, height) = (to_px(width_points), to_px(height_points));
    fit_within(width, height, MAX_RENDER_DIMENSION_PX).unwrap_or((width, height))
}
