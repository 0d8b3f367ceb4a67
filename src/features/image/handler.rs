use std::time::Instant;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, rejection::JsonRejection},
    routing::post,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as base64_engine};
use chrono::Utc;
use uuid::Uuid;

use super::font::is_loadable_font;
use super::renderer::write_file_atomic;
use super::types::{GenerateResponse, RenderRequest, UploadFontForm, UploadFontResponse};
use crate::{error::AppError, state::AppState};

/// 上传表单中的字体字段名
const FONT_FIELD: &str = "font";

#[utoipa::path(
    post,
    path = "/generate",
    summary = "生成文字图片",
    description = "按换行拆分文本，逐行水平居中、整体垂直居中绘制到指定尺寸的画布上，返回 PNG 的静态地址与 base64。",
    request_body = RenderRequest,
    responses(
        (status = 200, description = "生成成功", body = GenerateResponse),
        (status = 400, description = "请求体不是合法 JSON", body = AppError),
        (status = 422, description = "参数非法", body = AppError),
        (status = 500, description = "渲染或编码失败", body = AppError)
    ),
    tag = "Image"
)]
pub async fn generate_image(
    State(state): State<AppState>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let t_total = Instant::now();

    // 颜色分量越界、尺寸不是整数等同样以 problem+json 返回
    let Json(req) = payload.map_err(|rejection| {
        tracing::warn!("生成请求解析失败: {}", rejection.body_text());
        AppError::from(rejection)
    })?;

    // 参数非法时直接失败，不占用渲染许可
    state.renderer.validate(&req)?;

    let _permit = state
        .render_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| AppError::Internal(format!("获取渲染信号量失败: {e}")))?;
    let wait_ms = t_total.elapsed().as_millis();

    let timestamp = Utc::now().timestamp_millis();
    let short_id = Uuid::new_v4().simple().to_string();
    let file_name = format!("generated-{timestamp}-{}.png", &short_id[..8]);
    let output_path = state.static_dir.join(&file_name);

    // 字体加载、栅格化与 PNG 编码均为 CPU/磁盘阻塞操作，移出 tokio worker。
    let renderer = state.renderer.clone();
    let rendered = tokio::task::spawn_blocking(move || renderer.render_to_file(&req, &output_path))
        .await
        .map_err(|e| AppError::Internal(format!("阻塞渲染任务执行失败: {e}")))??;

    let image_base64 = format!(
        "data:image/png;base64,{}",
        base64_engine.encode(&rendered.png)
    );

    tracing::info!(
        "生成图片 {}: 等待许可={}ms, 总耗时={}ms",
        file_name,
        wait_ms,
        t_total.elapsed().as_millis()
    );

    Ok(Json(GenerateResponse {
        success: true,
        image_url: format!("/static/{file_name}"),
        image_base64,
        timestamp,
        width: rendered.width,
        height: rendered.height,
        font_origin: rendered.font_origin,
    }))
}

#[utoipa::path(
    post,
    path = "/upload-font",
    summary = "上传自定义字体",
    description = "multipart 字段 `font` 上传 TTF/OTF 字体，覆盖此前上传的自定义字体，后续渲染优先使用。",
    request_body(content = UploadFontForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "上传成功", body = UploadFontResponse),
        (status = 400, description = "缺少字体文件", body = AppError),
        (status = 422, description = "文件不是可用字体", body = AppError)
    ),
    tag = "Image"
)]
pub async fn upload_font(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadFontResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("无法解析上传表单: {e}")))?
    {
        if field.name() != Some(FONT_FIELD) {
            continue;
        }
        let upload_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("读取上传文件失败: {e}")))?;
        if data.is_empty() {
            return Err(AppError::BadRequest("No font file uploaded".into()));
        }
        if !is_loadable_font(&data) {
            return Err(AppError::Validation(format!(
                "上传的文件不是可用的字体: {}",
                upload_name.as_deref().unwrap_or("<unnamed>")
            )));
        }

        let target = state.custom_font_path.clone();
        let size = data.len();
        tokio::task::spawn_blocking(move || write_file_atomic(&target, &data))
            .await
            .map_err(|e| AppError::Internal(format!("阻塞写入任务执行失败: {e}")))??;

        tracing::info!(
            "自定义字体已更新: {:?} ({} 字节) -> {}",
            upload_name,
            size,
            state.custom_font_path.display()
        );

        return Ok(Json(UploadFontResponse {
            success: true,
            message: "Font uploaded successfully".to_string(),
            font_path: state.custom_font_url.clone(),
        }));
    }

    Err(AppError::BadRequest("No font file uploaded".into()))
}

pub fn create_image_router(max_font_bytes: usize) -> Router<AppState> {
    Router::new().route("/generate", post(generate_image)).route(
        "/upload-font",
        post(upload_font).layer(DefaultBodyLimit::max(max_font_bytes)),
    )
}
