//! 多行文字测量与居中排版。
//!
//! 只负责计算绘制计划（每行文字与其左上角坐标），不写任何像素。
//! 坐标 (x, y) 指该行墨迹包围盒的左上角。

use super::font::ResolvedFont;

/// 单行文字的紧致墨迹包围盒
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineMetrics {
    /// 包围盒宽度（right - left）
    pub width: u32,
    /// 包围盒高度（bottom - top）
    pub height: u32,
    /// 包围盒左边相对笔位原点的偏移
    pub left: i64,
    /// 包围盒上边相对行顶的偏移
    pub top: i64,
}

/// 单行绘制指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCommand {
    pub text: String,
    pub x: i64,
    pub y: i64,
    pub metrics: LineMetrics,
}

/// 完整绘制计划（按输入行序）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawPlan {
    pub commands: Vec<DrawCommand>,
    /// 行间距（像素）
    pub line_spacing: i64,
    /// 文字块总高度
    pub total_text_height: i64,
    /// 文字块起始 y（可能为负，溢出由调用方负责）
    pub start_y: i64,
}

/// 按显式换行符拆分，保留空行
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

/// 行间距 = floor(font_size * 0.5)
pub fn line_spacing(font_size: u32) -> i64 {
    (font_size / 2) as i64
}

/// 使用已解析字体测量并排版
pub fn plan_layout(font: &ResolvedFont, text: &str, width: u32, height: u32) -> DrawPlan {
    let measured: Vec<(&str, LineMetrics)> = split_lines(text)
        .into_iter()
        .map(|line| (line, font.measure(line)))
        .collect();
    for (i, (line, m)) in measured.iter().enumerate() {
        tracing::debug!(
            "行 {}: {:?} 宽={} 高={} 偏移=({}, {})",
            i,
            line,
            m.width,
            m.height,
            m.left,
            m.top
        );
    }
    compute_plan(&measured, font.size(), width, height)
}

/// 纯排版计算：给定每行的测量结果，求每行左上角坐标
pub fn compute_plan(
    lines: &[(&str, LineMetrics)],
    font_size: u32,
    width: u32,
    height: u32,
) -> DrawPlan {
    let spacing = line_spacing(font_size);
    let count = lines.len() as i64;

    let total_text_height: i64 = lines
        .iter()
        .map(|(_, m)| m.height as i64)
        .sum::<i64>()
        + spacing * (count - 1).max(0);

    // floor 除法，文字溢出画布时 start_y 为负
    let start_y = (height as i64 - total_text_height).div_euclid(2);

    let mut current_y = start_y;
    let mut commands = Vec::with_capacity(lines.len());
    for (text, metrics) in lines {
        let x = (width as i64 - metrics.width as i64).div_euclid(2);
        commands.push(DrawCommand {
            text: (*text).to_string(),
            x,
            y: current_y,
            metrics: *metrics,
        });
        current_y += metrics.height as i64 + spacing;
    }

    DrawPlan {
        commands,
        line_spacing: spacing,
        total_text_height,
        start_y,
    }
}

#[cfg(test)]
mod tests {
    use super::{LineMetrics, compute_plan, line_spacing, split_lines};

    fn m(width: u32, height: u32) -> LineMetrics {
        LineMetrics {
            width,
            height,
            left: 0,
            top: 0,
        }
    }

    #[test]
    fn split_keeps_empty_lines() {
        assert_eq!(split_lines(""), vec![""]);
        assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b", ""]);
    }

    #[test]
    fn spacing_is_half_font_size_floored() {
        assert_eq!(line_spacing(50), 25);
        assert_eq!(line_spacing(21), 10);
        assert_eq!(line_spacing(18), 9);
        assert_eq!(line_spacing(1), 0);
    }

    #[test]
    fn single_line_has_no_spacing_term() {
        let plan = compute_plan(&[("Hello", m(60, 14))], 20, 200, 100);
        assert_eq!(plan.total_text_height, 14);
        assert_eq!(plan.start_y, 43);
        assert_eq!(plan.commands.len(), 1);
        assert_eq!(plan.commands[0].x, 70);
        assert_eq!(plan.commands[0].y, 43);
    }

    #[test]
    fn two_lines_stack_with_spacing() {
        let plan = compute_plan(&[("A", m(12, 15)), ("B", m(11, 14))], 20, 200, 100);
        assert_eq!(plan.line_spacing, 10);
        assert_eq!(plan.total_text_height, 15 + 14 + 10);
        let (a, b) = (&plan.commands[0], &plan.commands[1]);
        assert_eq!(a.y, plan.start_y);
        assert_eq!(b.y, a.y + 15 + 10);
        assert_eq!(a.x, 94);
        assert_eq!(b.x, 94);
    }

    #[test]
    fn empty_text_centers_zero_sized_line() {
        let plan = compute_plan(&[("", LineMetrics::default())], 50, 1080, 360);
        assert_eq!(plan.total_text_height, 0);
        assert_eq!(plan.commands[0].x, 540);
        assert_eq!(plan.commands[0].y, 180);
    }

    #[test]
    fn overflowing_block_starts_above_canvas() {
        let plan = compute_plan(&[("x", m(300, 80)), ("y", m(10, 80))], 40, 100, 100);
        assert_eq!(plan.total_text_height, 180);
        assert_eq!(plan.start_y, -40);
        // 比画布更宽的行同样不做裁剪，x 取 floor
        assert_eq!(plan.commands[0].x, -100);
    }

    #[test]
    fn odd_remainders_floor_toward_negative_infinity() {
        let plan = compute_plan(&[("x", m(101, 11))], 10, 100, 10);
        assert_eq!(plan.start_y, -1);
        assert_eq!(plan.commands[0].x, -1);
    }

    #[test]
    fn fitting_block_stays_inside_canvas() {
        for height in [20u32, 21, 57, 100] {
            for h in [0u32, 1, 7, 19] {
                let plan = compute_plan(&[("x", m(5, h))], 12, 30, height);
                assert!(plan.start_y >= 0);
                assert!(plan.start_y + plan.total_text_height <= height as i64);
            }
        }
    }
}
