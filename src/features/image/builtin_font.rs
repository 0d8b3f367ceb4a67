//! 内置最小字体：8x8 点阵字形按最近邻放大到目标像素尺寸。
//!
//! 不依赖任何外部文件，作为字体解析的最后一级兜底，永不失败。

use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};

use super::layout::LineMetrics;
use super::renderer::blend_pixel;

/// 点阵字形边长
const GLYPH_CELLS: u32 = 8;

/// 内置点阵字体（等宽，字宽 = 字高 = size）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinFont {
    size: u32,
}

impl BuiltinFont {
    pub fn new(size: u32) -> Self {
        Self { size: size.max(1) }
    }

    /// 查找字形；缺失的字符用 '?' 代替
    fn glyph_rows(ch: char) -> [u8; 8] {
        BASIC_FONTS
            .get(ch)
            .or_else(|| LATIN_FONTS.get(ch))
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8])
    }

    /// 单元格内点亮的像素（相对单元格左上角）
    fn lit_pixels(&self, rows: [u8; 8]) -> impl Iterator<Item = (u32, u32)> + '_ {
        let size = self.size;
        (0..size).flat_map(move |ty| {
            let row = rows[(ty * GLYPH_CELLS / size) as usize];
            (0..size).filter_map(move |tx| {
                let bit = tx * GLYPH_CELLS / size;
                ((row >> bit) & 1 == 1).then_some((tx, ty))
            })
        })
    }

    /// 整行所有点亮像素（相对笔位原点）
    fn line_pixels<'a>(&'a self, text: &'a str) -> impl Iterator<Item = (i64, i64)> + 'a {
        text.chars().enumerate().flat_map(move |(i, ch)| {
            let pen_x = i as i64 * self.size as i64;
            self.lit_pixels(Self::glyph_rows(ch))
                .map(move |(x, y)| (pen_x + x as i64, y as i64))
        })
    }

    /// 计算整行的紧致墨迹包围盒
    pub fn measure(&self, text: &str) -> LineMetrics {
        let mut bounds: Option<(i64, i64, i64, i64)> = None;
        for (x, y) in self.line_pixels(text) {
            bounds = Some(match bounds {
                None => (x, y, x + 1, y + 1),
                Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x + 1), b.max(y + 1)),
            });
        }
        match bounds {
            Some((left, top, right, bottom)) => LineMetrics {
                width: (right - left) as u32,
                height: (bottom - top) as u32,
                left,
                top,
            },
            None => LineMetrics::default(),
        }
    }

    /// 以墨迹包围盒左上角对齐 (x, y) 绘制整行
    pub fn draw(
        &self,
        canvas: &mut RgbImage,
        text: &str,
        metrics: &LineMetrics,
        x: i64,
        y: i64,
        color: Rgb<u8>,
    ) {
        let dx = x - metrics.left;
        let dy = y - metrics.top;
        for (px, py) in self.line_pixels(text) {
            blend_pixel(canvas, px + dx, py + dy, color, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BuiltinFont;
    use image::{Rgb, RgbImage};

    #[test]
    fn empty_and_blank_lines_have_zero_metrics() {
        let font = BuiltinFont::new(18);
        assert_eq!(font.measure("").width, 0);
        assert_eq!(font.measure("").height, 0);
        assert_eq!(font.measure("   ").height, 0);
    }

    #[test]
    fn glyph_metrics_stay_inside_cells() {
        let font = BuiltinFont::new(18);
        let one = font.measure("A");
        assert!(one.width > 0 && one.width <= 18);
        assert!(one.height > 0 && one.height <= 18);
        assert!(one.left >= 0 && one.top >= 0);

        let two = font.measure("AA");
        assert_eq!(two.height, one.height);
        assert!(two.width > one.width);
        assert!(two.width <= 36);
    }

    #[test]
    fn unknown_characters_render_as_placeholder() {
        let font = BuiltinFont::new(16);
        assert_eq!(font.measure("\u{4e2d}"), font.measure("?"));
    }

    #[test]
    fn draw_stays_within_measured_box() {
        let font = BuiltinFont::new(18);
        let metrics = font.measure("Hi");
        let mut canvas = RgbImage::from_pixel(80, 40, Rgb([0, 0, 0]));
        font.draw(&mut canvas, "Hi", &metrics, 10, 5, Rgb([255, 255, 255]));

        let mut lit = 0;
        for (x, y, px) in canvas.enumerate_pixels() {
            if px.0 != [0, 0, 0] {
                lit += 1;
                assert!(x >= 10 && x < 10 + metrics.width, "x={x} outside bbox");
                assert!(y >= 5 && y < 5 + metrics.height, "y={y} outside bbox");
            }
        }
        assert!(lit > 0);
    }
}
