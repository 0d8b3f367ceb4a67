use std::path::Path;
use std::time::Instant;

use image::RgbImage;

use super::font::{FontOrigin, FontResolver};
use super::layout::{DrawPlan, plan_layout};
use super::renderer::{encode_png, rasterize, write_file_atomic};
use super::types::RenderRequest;
use crate::config::AppConfig;
use crate::error::RenderError;

/// 渲染选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// 画布宽/高上限
    pub max_dimension: u32,
    /// PNG 编码优先速度
    pub optimize_speed: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_dimension: 8192,
            optimize_speed: false,
        }
    }
}

/// 校验后的画布参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSpec {
    pub width: u32,
    pub height: u32,
    pub font_size: u32,
}

/// 渲染结果
#[derive(Debug, Clone)]
pub struct RenderedImage {
    /// RGB 像素（无 alpha）
    pub pixels: RgbImage,
    /// PNG 编码字节
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// 实际使用的字体来源
    pub font_origin: FontOrigin,
    /// 实际生效的字号
    pub font_size: u32,
    /// 绘制的行数（含空行）
    pub line_count: usize,
}

/// 文字图片渲染器：解析字体、排版居中、栅格化、编码
///
/// 每次调用独立解析字体，不在调用之间共享任何可变状态。
#[derive(Debug, Clone, Default)]
pub struct TextImageRenderer {
    resolver: FontResolver,
    options: RenderOptions,
}

impl TextImageRenderer {
    pub fn new(resolver: FontResolver, options: RenderOptions) -> Self {
        Self { resolver, options }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            FontResolver::from_resources(&config.resources),
            RenderOptions {
                max_dimension: config.image.max_dimension,
                optimize_speed: config.image.optimize_speed,
            },
        )
    }

    pub fn resolver(&self) -> &FontResolver {
        &self.resolver
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// 校验画布尺寸与字号
    pub fn validate(&self, req: &RenderRequest) -> Result<CanvasSpec, RenderError> {
        let max = self.options.max_dimension as i64;
        if req.width <= 0 || req.height <= 0 {
            return Err(RenderError::InvalidDimensions(format!(
                "width/height 必须为正整数（收到 {}x{}）",
                req.width, req.height
            )));
        }
        if req.width > max || req.height > max {
            return Err(RenderError::InvalidDimensions(format!(
                "width/height 不能超过 {max}（收到 {}x{}）",
                req.width, req.height
            )));
        }
        if req.font_size <= 0 || req.font_size > max {
            return Err(RenderError::InvalidFontSize(format!(
                "font_size 必须在 1..={max} 之间（收到 {}）",
                req.font_size
            )));
        }
        Ok(CanvasSpec {
            width: req.width as u32,
            height: req.height as u32,
            font_size: req.font_size as u32,
        })
    }

    /// 仅计算绘制计划（不写像素）
    pub fn plan(&self, req: &RenderRequest) -> Result<DrawPlan, RenderError> {
        let canvas = self.validate(req)?;
        let font = self.resolver.resolve(canvas.font_size);
        Ok(plan_layout(&font, &req.text, canvas.width, canvas.height))
    }

    /// 渲染为内存中的 PNG
    pub fn render(&self, req: &RenderRequest) -> Result<RenderedImage, RenderError> {
        let t0 = Instant::now();
        let canvas = self.validate(req)?;

        let font = self.resolver.resolve(canvas.font_size);
        let plan = plan_layout(&font, &req.text, canvas.width, canvas.height);
        let t_layout = t0.elapsed();

        let pixels = rasterize(
            canvas.width,
            canvas.height,
            req.bg_color,
            req.text_color,
            &font,
            &plan,
        );
        let t_raster = t0.elapsed();

        let png = encode_png(&pixels, self.options.optimize_speed)?;
        let t_encode = t0.elapsed();

        tracing::info!(
            "文字图片渲染完成: {}x{}, {} 行, 字体={:?}@{}px, 排版={:?}, 栅格化={:?}, 编码={:?}, {} 字节",
            canvas.width,
            canvas.height,
            plan.commands.len(),
            font.origin(),
            font.size(),
            t_layout,
            t_raster - t_layout,
            t_encode - t_raster,
            png.len()
        );

        Ok(RenderedImage {
            pixels,
            png,
            width: canvas.width,
            height: canvas.height,
            font_origin: font.origin(),
            font_size: font.size(),
            line_count: plan.commands.len(),
        })
    }

    /// 渲染并写入文件；任何失败都不会在目标位置留下文件
    pub fn render_to_file(
        &self,
        req: &RenderRequest,
        path: &Path,
    ) -> Result<RenderedImage, RenderError> {
        let rendered = self.render(req)?;
        write_file_atomic(path, &rendered.png)?;
        tracing::debug!("已写入图片: {}", path.display());
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::{RenderOptions, TextImageRenderer};
    use crate::error::RenderError;
    use crate::features::image::font::FontResolver;
    use crate::features::image::types::RenderRequest;

    fn renderer() -> TextImageRenderer {
        TextImageRenderer::new(FontResolver::builtin_only(), RenderOptions::default())
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        for (w, h) in [(0, 10), (10, 0), (-5, 10)] {
            let req = RenderRequest {
                width: w,
                height: h,
                ..RenderRequest::new("x")
            };
            let err = renderer().render(&req).expect_err("should fail");
            assert!(matches!(err, RenderError::InvalidDimensions(_)));
        }
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        let r = TextImageRenderer::new(
            FontResolver::builtin_only(),
            RenderOptions {
                max_dimension: 100,
                optimize_speed: true,
            },
        );
        let req = RenderRequest {
            width: 101,
            height: 50,
            ..RenderRequest::new("x")
        };
        assert!(matches!(
            r.validate(&req),
            Err(RenderError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn non_positive_font_size_is_rejected() {
        let req = RenderRequest {
            font_size: 0,
            ..RenderRequest::new("x")
        };
        assert!(matches!(
            renderer().validate(&req),
            Err(RenderError::InvalidFontSize(_))
        ));
    }

    #[test]
    fn failed_render_does_not_create_file() {
        let path = std::env::temp_dir().join(format!(
            "tib-fail-{}.png",
            uuid::Uuid::new_v4().simple()
        ));
        let req = RenderRequest {
            width: 0,
            ..RenderRequest::new("x")
        };
        assert!(renderer().render_to_file(&req, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn builtin_fallback_uses_its_own_size_for_spacing() {
        let req = RenderRequest {
            font_size: 64,
            ..RenderRequest::new("A\nB")
        };
        let plan = renderer().plan(&req).expect("plan");
        assert_eq!(plan.line_spacing, 9);
    }
}
