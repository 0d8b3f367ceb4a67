use utoipa::OpenApi;
use utoipa::openapi::server::{ServerBuilder, ServerVariableBuilder};

/// 为 Swagger UI 提供正确的“业务接口前缀”Servers 配置。
///
/// - 业务接口默认前缀为 `/api`（对应 `config.api.prefix` / `APP_API__PREFIX`）。
/// - `/health` 不带前缀，因此额外提供 `/` 作为备用 server。
struct ApiServers;

impl utoipa::Modify for ApiServers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let api = ServerBuilder::new()
            .url("{api_prefix}")
            .description(Some("业务接口（默认 /api）"))
            .parameter(
                "api_prefix",
                ServerVariableBuilder::new()
                    .default_value("/api")
                    .description(Some("业务接口前缀：对应 config.api.prefix")),
            )
            .build();

        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径（用于 /health 等不带前缀接口）"))
            .build();

        openapi.servers = Some(vec![api, root]);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::image::handler::generate_image,
        crate::features::image::handler::upload_font,
    ),
    components(schemas(
        crate::error::AppError,
        crate::error::ProblemDetails,
        crate::features::health::handler::HealthResponse,
        crate::features::image::RenderRequest,
        crate::features::image::GenerateResponse,
        crate::features::image::UploadFontForm,
        crate::features::image::UploadFontResponse,
        crate::features::image::FontOrigin,
    )),
    modifiers(&ApiServers),
    tags(
        (
            name = "Image",
            description = "文字图片：多行文本居中渲染为 PNG，以及自定义字体上传。"
        ),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "Text Image Backend API",
        version = env!("CARGO_PKG_VERSION"),
        description = "文字转图片服务（Axum + utoipa）。除 /health 外，业务接口实际挂载在 `config.api.prefix`（默认 /api）下，OpenAPI 的 paths 不包含该前缀。"
    )
)]
pub struct ApiDoc;
