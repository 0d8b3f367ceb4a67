//! 字体解析：按固定顺序尝试候选字体，全部失败时回落到内置点阵字体。

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use rusttype::{Font, Point, Rect, Scale, point};
use serde::{Deserialize, Serialize};

use super::builtin_font::BuiltinFont;
use super::layout::LineMetrics;
use super::renderer::blend_pixel;
use crate::config::ResourcesConfig;
use crate::error::FontLoadError;

/// 内置兜底字体的固定字号（与请求字号无关）
pub const BUILTIN_FALLBACK_SIZE: u32 = 18;

/// 字体来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FontOrigin {
    /// 用户上传的自定义字体
    Custom,
    /// 随服务分发的默认字体
    Bundled,
    /// 系统字体
    System,
    /// 内置点阵字体
    Builtin,
}

/// 单个字体候选
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontCandidate {
    pub origin: FontOrigin,
    pub path: PathBuf,
}

impl FontCandidate {
    pub fn new(origin: FontOrigin, path: impl Into<PathBuf>) -> Self {
        Self {
            origin,
            path: path.into(),
        }
    }
}

/// 字体解析器：持有有序的候选列表，每次渲染独立解析，不缓存字体句柄
#[derive(Debug, Clone, Default)]
pub struct FontResolver {
    candidates: Vec<FontCandidate>,
}

impl FontResolver {
    pub fn new(candidates: Vec<FontCandidate>) -> Self {
        Self { candidates }
    }

    /// 无任何候选，始终使用内置字体
    pub fn builtin_only() -> Self {
        Self::default()
    }

    /// 自定义字体 → 默认字体 → 系统字体
    pub fn from_resources(resources: &ResourcesConfig) -> Self {
        let mut candidates = vec![
            FontCandidate::new(FontOrigin::Custom, resources.custom_font_path()),
            FontCandidate::new(FontOrigin::Bundled, resources.bundled_font_path()),
        ];
        candidates.extend(
            resources
                .system_fonts
                .iter()
                .map(|p| FontCandidate::new(FontOrigin::System, p)),
        );
        Self { candidates }
    }

    /// 替换自定义字体位置（按调用方隔离自定义字体时使用）
    pub fn with_custom_font(&self, path: impl Into<PathBuf>) -> Self {
        let mut candidates: Vec<FontCandidate> = self
            .candidates
            .iter()
            .filter(|c| c.origin != FontOrigin::Custom)
            .cloned()
            .collect();
        candidates.insert(0, FontCandidate::new(FontOrigin::Custom, path));
        Self { candidates }
    }

    pub fn candidates(&self) -> &[FontCandidate] {
        &self.candidates
    }

    /// 解析字体；单个候选失败只记录日志并继续，永不失败
    pub fn resolve(&self, font_size: u32) -> ResolvedFont {
        for candidate in &self.candidates {
            match OutlineFace::load(&candidate.path, font_size) {
                Ok(face) => {
                    tracing::info!(
                        "已加载字体 ({:?}): {} @ {}px",
                        candidate.origin,
                        candidate.path.display(),
                        font_size
                    );
                    return ResolvedFont {
                        origin: candidate.origin,
                        path: Some(candidate.path.clone()),
                        size: font_size,
                        face: FontFace::Outline(Box::new(face)),
                    };
                }
                Err(FontLoadError::Missing(path)) => {
                    tracing::debug!("字体候选不存在 ({:?}): {}", candidate.origin, path.display());
                }
                Err(e) => {
                    tracing::warn!("字体候选加载失败 ({:?}): {}", candidate.origin, e);
                }
            }
        }

        tracing::warn!(
            "所有字体候选均不可用，使用内置字体 @ {}px",
            BUILTIN_FALLBACK_SIZE
        );
        ResolvedFont {
            origin: FontOrigin::Builtin,
            path: None,
            size: BUILTIN_FALLBACK_SIZE,
            face: FontFace::Builtin(BuiltinFont::new(BUILTIN_FALLBACK_SIZE)),
        }
    }
}

/// 判断字节内容能否作为字体加载（上传校验用）
pub fn is_loadable_font(bytes: &[u8]) -> bool {
    Font::try_from_bytes(bytes).is_some()
}

/// 已解析的字体句柄，仅在单次渲染内有效
pub struct ResolvedFont {
    origin: FontOrigin,
    path: Option<PathBuf>,
    size: u32,
    face: FontFace,
}

enum FontFace {
    Outline(Box<OutlineFace>),
    Builtin(BuiltinFont),
}

impl std::fmt::Debug for ResolvedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedFont")
            .field("origin", &self.origin)
            .field("path", &self.path)
            .field("size", &self.size)
            .finish()
    }
}

impl ResolvedFont {
    pub fn origin(&self) -> FontOrigin {
        self.origin
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 实际生效的字号（内置字体为固定字号）
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn measure(&self, text: &str) -> LineMetrics {
        match &self.face {
            FontFace::Outline(face) => face.measure(text),
            FontFace::Builtin(font) => font.measure(text),
        }
    }

    /// 以墨迹包围盒左上角对齐 (x, y) 绘制一行
    pub fn draw(
        &self,
        canvas: &mut RgbImage,
        text: &str,
        metrics: &LineMetrics,
        x: i64,
        y: i64,
        color: Rgb<u8>,
    ) {
        match &self.face {
            FontFace::Outline(face) => face.draw(canvas, text, metrics, x, y, color),
            FontFace::Builtin(font) => font.draw(canvas, text, metrics, x, y, color),
        }
    }
}

/// TrueType/OpenType 轮廓字体
struct OutlineFace {
    font: Font<'static>,
    scale: Scale,
    ascent: f32,
}

impl OutlineFace {
    fn load(path: &Path, font_size: u32) -> Result<Self, FontLoadError> {
        if !path.is_file() {
            return Err(FontLoadError::Missing(path.to_path_buf()));
        }
        let bytes = fs::read(path).map_err(|source| FontLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let font =
            Font::try_from_vec(bytes).ok_or_else(|| FontLoadError::Parse(path.to_path_buf()))?;
        if font.glyph_count() == 0 {
            return Err(FontLoadError::Parse(path.to_path_buf()));
        }
        let scale = em_scale(&font, font_size as f32);
        let ascent = font.v_metrics(scale).ascent;
        Ok(Self {
            font,
            scale,
            ascent,
        })
    }

    fn measure(&self, text: &str) -> LineMetrics {
        match self.ink_bounds(text, point(0.0, self.ascent)) {
            Some(bb) => LineMetrics {
                width: (bb.max.x - bb.min.x) as u32,
                height: (bb.max.y - bb.min.y) as u32,
                left: bb.min.x as i64,
                top: bb.min.y as i64,
            },
            None => LineMetrics::default(),
        }
    }

    fn ink_bounds(&self, text: &str, origin: Point<f32>) -> Option<Rect<i32>> {
        self.font
            .layout(text, self.scale, origin)
            .filter_map(|g| g.pixel_bounding_box())
            .reduce(|a, b| Rect {
                min: point(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
                max: point(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
            })
    }

    fn draw(
        &self,
        canvas: &mut RgbImage,
        text: &str,
        metrics: &LineMetrics,
        x: i64,
        y: i64,
        color: Rgb<u8>,
    ) {
        let origin = point(
            (x - metrics.left) as f32,
            (y - metrics.top) as f32 + self.ascent,
        );
        for glyph in self.font.layout(text, self.scale, origin) {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, coverage| {
                    blend_pixel(
                        canvas,
                        bb.min.x as i64 + gx as i64,
                        bb.min.y as i64 + gy as i64,
                        color,
                        coverage,
                    );
                });
            }
        }
    }
}

/// 让字号对应 em 方框高度（rusttype 的 Scale 以 ascent-descent 为高度）
fn em_scale(font: &Font<'_>, px: f32) -> Scale {
    let units_per_em = font.units_per_em() as f32;
    let vm = font.v_metrics_unscaled();
    let height_units = vm.ascent - vm.descent;
    if units_per_em > 0.0 && height_units > 0.0 {
        Scale::uniform(px * height_units / units_per_em)
    } else {
        Scale::uniform(px)
    }
}
