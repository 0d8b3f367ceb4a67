use crate::config::AppConfig;
use crate::error::AppError;
use std::fs;
use std::path::Path;

/// 执行启动检查
///
/// 1. 检查并创建 static / uploads / fonts 目录
/// 2. 检查字体候选（仅告警，不阻断启动）
pub fn run_startup_checks(config: &AppConfig) -> Result<(), AppError> {
    tracing::info!("🔍 开始执行启动检查...");

    let res = &config.resources;
    for dir in [res.static_path(), res.uploads_path(), res.fonts_path()] {
        ensure_dir(&dir)?;
    }

    check_font_resources(config);

    tracing::info!("✅ 启动检查完成");
    Ok(())
}

/// 确保目录存在
fn ensure_dir(path: &Path) -> Result<(), AppError> {
    if path.is_dir() {
        tracing::info!("✅ 目录已存在: {:?}", path);
        return Ok(());
    }
    tracing::warn!("📁 未找到目录，正在创建: {:?}", path);
    fs::create_dir_all(path)
        .map_err(|e| AppError::Internal(format!("创建目录 {} 失败: {e}", path.display())))?;
    tracing::info!("✅ 目录创建成功: {:?}", path);
    Ok(())
}

/// 记录各字体候选是否存在
fn check_font_resources(config: &AppConfig) {
    let res = &config.resources;

    let custom = res.custom_font_path();
    if custom.is_file() {
        tracing::info!("自定义字体已存在: {}", custom.display());
    }

    let bundled = res.bundled_font_path();
    if bundled.is_file() {
        tracing::info!("默认字体已存在: {}", bundled.display());
    } else {
        tracing::warn!("⚠️ 未找到默认字体: {}", bundled.display());
    }

    let available = res
        .system_fonts
        .iter()
        .filter(|p| Path::new(p).is_file())
        .count();
    if available == 0 {
        tracing::warn!("⚠️ 系统字体候选均不存在，未上传字体时将使用内置点阵字体");
    } else {
        tracing::info!("系统字体候选可用 {}/{}", available, res.system_fonts.len());
    }
}
