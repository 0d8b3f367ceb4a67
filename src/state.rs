use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::AppConfig;
use crate::features::image::TextImageRenderer;

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 文字图片渲染器（只读，内部不缓存字体句柄）
    pub renderer: Arc<TextImageRenderer>,
    /// 控制并发渲染的信号量（限制 CPU 密集型任务数量）
    pub render_semaphore: Arc<Semaphore>,
    /// 生成图片的输出目录（对外以 /static 提供）
    pub static_dir: PathBuf,
    /// 自定义字体的固定位置（上传覆盖写入）
    pub custom_font_path: PathBuf,
    /// 自定义字体的对外 URL
    pub custom_font_url: Option<String>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            renderer: Arc::new(TextImageRenderer::from_config(config)),
            render_semaphore: Arc::new(Semaphore::new(config.image.effective_parallelism())),
            static_dir: config.resources.static_path(),
            custom_font_path: config.resources.custom_font_path(),
            custom_font_url: config.resources.custom_font_url(),
        }
    }
}
