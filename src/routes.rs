use axum::{Router, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::cors::build_cors_layer;
use crate::features::{health::health_check, image::create_image_router, page::index};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// 组装完整路由
///
/// - `/`：生成器页面
/// - `/health`：探活
/// - `{api.prefix}/generate`、`{api.prefix}/upload-font`：业务接口
/// - `/static/*`：生成的图片与上传的字体
/// - `/docs`：Swagger UI
pub fn build_app(state: AppState, config: &AppConfig) -> Router {
    let static_dir = state.static_dir.clone();
    let image_router = create_image_router(config.image.max_font_bytes);

    let app = Router::<AppState>::new()
        .route("/", get(index))
        .route("/health", get(health_check));
    // axum 不允许在根路径 nest，前缀为空或 "/" 时直接合并
    let app = match api_prefix(&config.api.prefix) {
        Some(prefix) => app.nest(&prefix, image_router),
        None => app.merge(image_router),
    };

    let mut app = app
        .nest_service("/static", ServeDir::new(static_dir))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state);

    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    app.layer(TraceLayer::new_for_http())
}

/// 规范化业务接口前缀：补齐开头的 `/`、去掉末尾的 `/`；根路径返回 None
fn api_prefix(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{trimmed}"))
    }
}

#[cfg(test)]
mod tests {
    use super::api_prefix;

    #[test]
    fn root_prefixes_are_merged_instead_of_nested() {
        assert_eq!(api_prefix(""), None);
        assert_eq!(api_prefix("/"), None);
        assert_eq!(api_prefix(" // "), None);
    }

    #[test]
    fn prefixes_are_normalized() {
        assert_eq!(api_prefix("/api").as_deref(), Some("/api"));
        assert_eq!(api_prefix("api/").as_deref(), Some("/api"));
        assert_eq!(api_prefix("/api/v1/").as_deref(), Some("/api/v1"));
    }
}
