//! 本地渲染工具：不启动 HTTP 服务，直接把文本渲染为 PNG。
//!
//! 请求体与 `POST /api/generate` 相同（JSON），可来自 `--input` 文件、`--text` 参数或标准输入。

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use text_image_backend::features::image::{RenderRequest, TextImageRenderer};
use text_image_backend::{AppConfig, config::ImageRenderConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 最小日志：仅在需要调试时启用（例如 RUST_LOG=debug）。
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args = Args::parse(std::env::args().skip(1).collect())?;
    if args.help {
        print_help();
        return Ok(());
    }

    // 配置文件缺失或损坏时退回默认配置，本地工具不应因此无法使用
    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("加载配置失败，使用默认配置: {}", e);
        AppConfig::default()
    });

    let mut req = read_request(&args)?;
    if let Some(w) = args.width {
        req.width = w;
    }
    if let Some(h) = args.height {
        req.height = h;
    }
    if let Some(s) = args.font_size {
        req.font_size = s;
    }

    let mut renderer = TextImageRenderer::from_config(&config);
    if let Some(font) = args.font_path {
        renderer = TextImageRenderer::new(
            renderer.resolver().with_custom_font(font),
            renderer.options(),
        );
    }

    let rendered = renderer.render_to_file(&req, &args.out_path)?;
    println!(
        "已写入: {} ({}x{}, {} 行, 字体={:?}@{}px, {} 字节)",
        args.out_path.display(),
        rendered.width,
        rendered.height,
        rendered.line_count,
        rendered.font_origin,
        rendered.font_size,
        rendered.png.len()
    );
    Ok(())
}

fn read_request(args: &Args) -> Result<RenderRequest, Box<dyn std::error::Error>> {
    if let Some(text) = args.text.as_deref() {
        return Ok(RenderRequest::new(text));
    }
    let raw = match args.input.as_ref() {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    if raw.trim().is_empty() {
        return Err("未提供请求：请使用 --input、--text 或通过标准输入传入 JSON".into());
    }
    Ok(serde_json::from_str(&raw)?)
}

struct Args {
    help: bool,
    input: Option<PathBuf>,
    text: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
    font_size: Option<i64>,
    font_path: Option<PathBuf>,
    out_path: PathBuf,
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Self, String> {
        let mut args = Self {
            help: false,
            input: None,
            text: None,
            width: None,
            height: None,
            font_size: None,
            font_path: None,
            out_path: PathBuf::from("output.png"),
        };

        let mut it = argv.into_iter();
        while let Some(a) = it.next() {
            match a.as_str() {
                "-h" | "--help" => args.help = true,
                "--input" => args.input = Some(PathBuf::from(require_value(&a, it.next())?)),
                "--text" => args.text = Some(require_value(&a, it.next())?),
                "--width" => args.width = Some(parse_int(&a, it.next())?),
                "--height" => args.height = Some(parse_int(&a, it.next())?),
                "--font-size" => args.font_size = Some(parse_int(&a, it.next())?),
                "--font" => args.font_path = Some(PathBuf::from(require_value(&a, it.next())?)),
                "--out" => args.out_path = PathBuf::from(require_value(&a, it.next())?),
                // 裸参数视为请求文件路径
                other if !other.starts_with('-') && args.input.is_none() => {
                    args.input = Some(PathBuf::from(other));
                }
                other => return Err(format!("未知参数: {other}（使用 --help 查看用法）")),
            }
        }
        Ok(args)
    }
}

fn require_value(flag: &str, value: Option<String>) -> Result<String, String> {
    value.ok_or_else(|| format!("参数 {flag} 缺少取值"))
}

fn parse_int(flag: &str, value: Option<String>) -> Result<i64, String> {
    let raw = require_value(flag, value)?;
    raw.trim()
        .parse()
        .map_err(|_| format!("参数 {flag} 需要整数，收到 {raw:?}"))
}

fn print_help() {
    let defaults = ImageRenderConfig::default();
    println!(
        r#"render_text（本地文字图片渲染工具）

用法：
  cargo run --bin render_text -- --text "第一行\n第二行" --out out.png
  echo '{{"text":"Hello","width":200,"height":100,"font_size":20}}' | cargo run --bin render_text
  cargo run --bin render_text -- request.json --out out.png

常用参数：
  --input FILE        请求 JSON 文件（也可直接作为第一个裸参数）
  --text STR          直接指定文本（其余参数取默认值）
  --width N           覆盖画布宽度
  --height N          覆盖画布高度
  --font-size N       覆盖字号
  --font FILE         优先使用的字体文件（覆盖配置中的自定义字体）
  --out FILE          输出路径（默认 output.png）

画布尺寸上限：{}（config.image.max_dimension）
"#,
        defaults.max_dimension
    );
}

#[cfg(test)]
mod tests {
    use super::Args;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn numeric_overrides_are_parsed() {
        let args = Args::parse(argv(&["--width", "200", "--font-size", " 20 ", "req.json"]))
            .expect("parse args");
        assert_eq!(args.width, Some(200));
        assert_eq!(args.font_size, Some(20));
        assert_eq!(args.input.as_deref(), Some(std::path::Path::new("req.json")));
    }

    #[test]
    fn malformed_numbers_are_reported() {
        let err = Args::parse(argv(&["--width", "abc"])).err().expect("should fail");
        assert!(err.contains("--width"), "{err}");
        assert!(Args::parse(argv(&["--font-size", "x"])).is_err());
        assert!(Args::parse(argv(&["--height", "1.5"])).is_err());
    }

    #[test]
    fn missing_values_and_unknown_flags_are_reported() {
        assert!(Args::parse(argv(&["--out"])).is_err());
        assert!(Args::parse(argv(&["--widht", "10"])).is_err());
    }
}
