use std::path::PathBuf;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 应用统一错误类型
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// 请求格式错误（缺少上传字段等）
    #[error("请求错误: {0}")]
    BadRequest(String),

    /// 参数校验错误
    #[error("参数校验错误: {0}")]
    Validation(String),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),

    /// 单次渲染失败
    #[error("{0}")]
    Render(#[from] RenderError),
}

/// 单次渲染请求的致命错误（请求失败，不产生任何输出文件）
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum RenderError {
    /// 画布尺寸非法（非正数或超过上限）
    #[error("画布尺寸非法: {0}")]
    InvalidDimensions(String),

    /// 字号非法
    #[error("字号非法: {0}")]
    InvalidFontSize(String),

    /// PNG 编码失败
    #[error("PNG 编码失败: {0}")]
    Encode(String),

    /// 输出文件写入失败
    #[error("输出文件写入失败: {0}")]
    Io(String),
}

/// 单个字体候选加载失败（可恢复，解析器会继续尝试下一个候选）
#[derive(Error, Debug)]
pub enum FontLoadError {
    /// 文件不存在
    #[error("字体文件不存在: {}", .0.display())]
    Missing(PathBuf),

    /// 文件读取失败
    #[error("读取字体文件失败 '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 文件内容不是可用的 TrueType/OpenType 字体
    #[error("无法解析字体文件: {}", .0.display())]
    Parse(PathBuf),
}

/// RFC7807 风格的错误响应（Problem Details）。
///
/// 所有 API 错误都返回结构化 JSON，content-type = application/problem+json。
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// 问题类型（URI）。若无更细分的类型，可使用 about:blank。
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub type_url: String,

    /// 简短标题，用于概括错误。
    #[schema(example = "Validation Failed")]
    pub title: String,

    /// HTTP 状态码（与响应 status 一致）。
    #[schema(example = 422)]
    pub status: u16,

    /// 人类可读的详细信息。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// 稳定的错误码，用于程序化处理。
    #[schema(example = "RENDER_INVALID_REQUEST")]
    pub code: String,

    /// 与旧版前端兼容：始终为 false。
    pub success: bool,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Render(e) => match e {
                RenderError::InvalidDimensions(_) | RenderError::InvalidFontSize(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                RenderError::Encode(_) | RenderError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn stable_code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Render(e) => match e {
                RenderError::InvalidDimensions(_) | RenderError::InvalidFontSize(_) => {
                    "RENDER_INVALID_REQUEST"
                }
                RenderError::Encode(_) => "IMAGE_ENCODE_FAILED",
                RenderError::Io(_) => "IMAGE_WRITE_FAILED",
            },
        }
    }

    fn title(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::UNPROCESSABLE_ENTITY => "Validation Failed",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let problem = ProblemDetails {
            type_url: "about:blank".to_string(),
            title: self.title().to_string(),
            status: status.as_u16(),
            detail: Some(self.to_string()),
            code: self.stable_code().to_string(),
            success: false,
        };

        let mut res = Json(problem).into_response();
        *res.status_mut() = status;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        res
    }
}

impl From<png::EncodingError> for RenderError {
    fn from(err: png::EncodingError) -> Self {
        RenderError::Encode(err.to_string())
    }
}

/// 请求体无法解析为 JSON 视为请求错误；字段类型或取值非法视为参数校验错误
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => AppError::Validation(e.body_text()),
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, RenderError};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn invalid_dimensions_map_to_unprocessable_entity() {
        let err = AppError::from(RenderError::InvalidDimensions("width=0".into()));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.stable_code(), "RENDER_INVALID_REQUEST");
    }

    #[test]
    fn encode_failure_is_internal_error() {
        let err = AppError::from(RenderError::Encode("boom".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.stable_code(), "IMAGE_ENCODE_FAILED");
    }

    #[test]
    fn io_failures_keep_the_write_error_code() {
        let err = AppError::from(RenderError::Io("out.png: denied".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.stable_code(), "IMAGE_WRITE_FAILED");
    }

    #[test]
    fn problem_response_uses_problem_json_content_type() {
        let res = AppError::BadRequest("No font file uploaded".into()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            res.headers()
                .get(axum::http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/problem+json")
        );
    }
}
