use serde::{Deserialize, Serialize};

use super::font::FontOrigin;

/// 文字图片渲染请求
///
/// 除 `text` 外均可省略；尺寸使用有符号整数接收，以便对非正数给出明确的校验错误。
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema, PartialEq, Eq)]
pub struct RenderRequest {
    /// 文本内容，`\n` 为显式换行
    #[schema(example = "Your text here\nSecond line")]
    #[serde(default)]
    pub text: String,
    /// 画布宽度（像素，默认 1080）
    #[schema(example = 1080)]
    #[serde(default = "default_width")]
    pub width: i64,
    /// 画布高度（像素，默认 360）
    #[schema(example = 360)]
    #[serde(default = "default_height")]
    pub height: i64,
    /// 字号（像素，默认 50）
    #[schema(example = 50)]
    #[serde(default = "default_font_size")]
    pub font_size: i64,
    /// 背景色 RGB（默认黑色）
    #[schema(value_type = Vec<u8>, example = json!([0, 0, 0]))]
    #[serde(default = "default_bg_color")]
    pub bg_color: [u8; 3],
    /// 文字颜色 RGB（默认白色）
    #[schema(value_type = Vec<u8>, example = json!([255, 255, 255]))]
    #[serde(default = "default_text_color")]
    pub text_color: [u8; 3],
}

fn default_width() -> i64 {
    1080
}

fn default_height() -> i64 {
    360
}

fn default_font_size() -> i64 {
    50
}

fn default_bg_color() -> [u8; 3] {
    [0, 0, 0]
}

fn default_text_color() -> [u8; 3] {
    [255, 255, 255]
}

impl RenderRequest {
    /// 使用默认参数渲染给定文本
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            text: String::new(),
            width: default_width(),
            height: default_height(),
            font_size: default_font_size(),
            bg_color: default_bg_color(),
            text_color: default_text_color(),
        }
    }
}

/// 生成接口响应
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GenerateResponse {
    pub success: bool,
    /// 静态访问地址
    #[schema(example = "/static/generated-1718000000000-1a2b3c4d.png")]
    pub image_url: String,
    /// data URI 形式的 PNG
    pub image_base64: String,
    /// 生成时间（Unix 毫秒）
    pub timestamp: i64,
    pub width: u32,
    pub height: u32,
    /// 实际使用的字体来源
    pub font_origin: FontOrigin,
}

/// 字体上传表单（multipart/form-data，仅用于文档）
#[derive(Debug, utoipa::ToSchema)]
pub struct UploadFontForm {
    /// TTF/OTF 字体文件
    #[schema(value_type = String, format = Binary)]
    pub font: Vec<u8>,
}

/// 字体上传响应
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UploadFontResponse {
    pub success: bool,
    #[schema(example = "Font uploaded successfully")]
    pub message: String,
    /// 字体的静态访问地址（字体目录不在静态目录下时省略）
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "/static/fonts/custom-font.ttf")]
    pub font_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{GenerateResponse, RenderRequest};
    use crate::features::image::FontOrigin;

    #[test]
    fn omitted_fields_use_defaults() {
        let req: RenderRequest = serde_json::from_str(r#"{ "text": "hi" }"#).expect("parse");
        assert_eq!(req.width, 1080);
        assert_eq!(req.height, 360);
        assert_eq!(req.font_size, 50);
        assert_eq!(req.bg_color, [0, 0, 0]);
        assert_eq!(req.text_color, [255, 255, 255]);
    }

    #[test]
    fn missing_text_is_empty() {
        let req: RenderRequest = serde_json::from_str("{}").expect("parse");
        assert_eq!(req, RenderRequest::default());
    }

    #[test]
    fn color_components_must_fit_in_a_byte() {
        let res: Result<RenderRequest, _> =
            serde_json::from_str(r#"{ "text": "x", "bg_color": [0, 0, 256] }"#);
        assert!(res.is_err());
    }

    #[test]
    fn generate_response_round_trips_font_origin() {
        let resp = GenerateResponse {
            success: true,
            image_url: "/static/generated-1-abcd1234.png".into(),
            image_base64: "data:image/png;base64,".into(),
            timestamp: 1,
            width: 10,
            height: 20,
            font_origin: FontOrigin::Bundled,
        };
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["font_origin"], "bundled");

        let back: GenerateResponse = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back.font_origin, FontOrigin::Bundled);
    }
}
