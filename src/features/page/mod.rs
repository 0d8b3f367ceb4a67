use axum::response::Html;

/// 生成器页面（表单 + 字体上传 + API 用法说明）
const INDEX_HTML: &str = include_str!("../../../assets/index.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
