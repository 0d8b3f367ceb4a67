use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};

use crate::config::CorsConfig;

/// 根据配置构建 CORS 中间件
///
/// 方法固定为 GET/POST，仅放行 `Content-Type` 头；`allowed_origins` 含 `"*"` 时放行任意来源。
pub fn build_cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    if !cors.enabled {
        return None;
    }

    let (any_origin, origins) = parse_allowed_origins(&cors.allowed_origins);
    if !any_origin && origins.is_empty() {
        tracing::warn!("CORS 已启用但 allowed_origins 为空，已跳过启用");
        return None;
    }

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Some(if any_origin {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    })
}

fn parse_allowed_origins(values: &[String]) -> (bool, Vec<HeaderValue>) {
    let mut any = false;
    let mut origins = Vec::new();
    for raw in values {
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }
        if value == "*" {
            any = true;
            continue;
        }
        match HeaderValue::from_str(value) {
            Ok(v) => origins.push(v),
            Err(_) => tracing::warn!("CORS allowed_origins 含无效值，已忽略: {}", value),
        }
    }
    (any, origins)
}

#[cfg(test)]
mod tests {
    use super::{build_cors_layer, parse_allowed_origins};
    use crate::config::CorsConfig;

    #[test]
    fn disabled_config_builds_no_layer() {
        let cors = CorsConfig {
            enabled: false,
            allowed_origins: vec!["*".to_string()],
        };
        assert!(build_cors_layer(&cors).is_none());
    }

    #[test]
    fn blank_origins_skip_layer() {
        let cors = CorsConfig {
            enabled: true,
            allowed_origins: vec!["  ".to_string()],
        };
        assert!(build_cors_layer(&cors).is_none());
    }

    #[test]
    fn wildcard_is_detected_among_explicit_origins() {
        let (any, origins) =
            parse_allowed_origins(&["https://a.example".to_string(), " * ".to_string()]);
        assert!(any);
        assert_eq!(origins.len(), 1);
    }
}
