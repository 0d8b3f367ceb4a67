use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

use super::font::ResolvedFont;
use super::layout::DrawPlan;
use crate::error::RenderError;

/// 按覆盖率把颜色混合到画布上，越界像素直接丢弃
pub(crate) fn blend_pixel(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let a = coverage.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    if a >= 1.0 {
        *dst = color;
        return;
    }
    let inv = 1.0 - a;
    for c in 0..3 {
        dst.0[c] = (color.0[c] as f32 * a + dst.0[c] as f32 * inv).round() as u8;
    }
}

/// 填充背景后按绘制计划逐行绘制
pub fn rasterize(
    width: u32,
    height: u32,
    bg_color: [u8; 3],
    text_color: [u8; 3],
    font: &ResolvedFont,
    plan: &DrawPlan,
) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(width, height, Rgb(bg_color));
    let color = Rgb(text_color);
    for cmd in &plan.commands {
        if cmd.metrics.width == 0 || cmd.metrics.height == 0 {
            continue;
        }
        font.draw(&mut canvas, &cmd.text, &cmd.metrics, cmd.x, cmd.y, color);
    }
    canvas
}

/// 无损编码为 8 位 RGB PNG
pub fn encode_png(canvas: &RgbImage, optimize_speed: bool) -> Result<Vec<u8>, RenderError> {
    let (width, height) = canvas.dimensions();
    let mut out = Vec::with_capacity((width as usize) * (height as usize));
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        if optimize_speed {
            encoder.set_compression(png::Compression::Fast);
            encoder.set_filter(png::FilterType::NoFilter);
        } else {
            encoder.set_compression(png::Compression::Default);
            encoder.set_filter(png::FilterType::Paeth);
        }
        let mut writer = encoder.write_header()?;
        writer.write_image_data(canvas.as_raw())?;
        writer.finish()?;
    }
    Ok(out)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// 先写临时文件再原子改名，失败时不会在目标位置留下半成品
pub fn write_file_atomic(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    let tmp = partial_path(path);
    let result = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(RenderError::Io(format!("{}: {e}", path.display())));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{blend_pixel, encode_png, write_file_atomic};
    use image::{Rgb, RgbImage};

    #[test]
    fn blend_clips_out_of_bounds_and_mixes_partial_coverage() {
        let mut canvas = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        blend_pixel(&mut canvas, -1, 0, Rgb([255, 255, 255]), 1.0);
        blend_pixel(&mut canvas, 2, 1, Rgb([255, 255, 255]), 1.0);
        assert!(canvas.pixels().all(|p| p.0 == [0, 0, 0]));

        blend_pixel(&mut canvas, 1, 1, Rgb([200, 100, 0]), 0.5);
        assert_eq!(canvas.get_pixel(1, 1).0, [100, 50, 0]);
    }

    #[test]
    fn png_bytes_decode_to_the_same_pixels() {
        let mut canvas = RgbImage::from_pixel(7, 5, Rgb([10, 20, 30]));
        canvas.put_pixel(3, 2, Rgb([250, 1, 2]));
        for optimize_speed in [false, true] {
            let bytes = encode_png(&canvas, optimize_speed).expect("encode png");
            let decoded = image::load_from_memory(&bytes)
                .expect("decode png")
                .to_rgb8();
            assert_eq!(decoded, canvas);
        }
    }

    #[test]
    fn atomic_write_leaves_no_partial_file() {
        let dir = std::env::temp_dir().join(format!("tib-out-{}", uuid::Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let target = dir.join("out.png");
        write_file_atomic(&target, b"abc").expect("write");
        assert_eq!(std::fs::read(&target).expect("read back"), b"abc");
        assert!(!dir.join("out.png.part").exists());

        let missing_dir = dir.join("nope").join("out.png");
        assert!(write_file_atomic(&missing_dir, b"abc").is_err());
        assert!(!missing_dir.exists());
        let _ = std::fs::remove_dir_all(dir);
    }
}
