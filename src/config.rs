use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 配置文件路径环境变量
const CONFIG_PATH_ENV: &str = "APP_CONFIG";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }
    fn default_port() -> u16 {
        8081
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

/// 资源目录与字体候选配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcesConfig {
    /// 静态资源目录（生成的图片、字体均对外以 /static 提供）
    #[serde(default = "ResourcesConfig::default_static_dir")]
    pub static_dir: String,
    /// 通用上传目录
    #[serde(default = "ResourcesConfig::default_uploads_dir")]
    pub uploads_dir: String,
    /// 字体上传目录
    #[serde(default = "ResourcesConfig::default_fonts_dir")]
    pub fonts_dir: String,
    /// 自定义字体文件名（每次上传覆盖）
    #[serde(default = "ResourcesConfig::default_custom_font_file")]
    pub custom_font_file: String,
    /// 随服务分发的默认字体（位于 static_dir 下）
    #[serde(default = "ResourcesConfig::default_bundled_font")]
    pub bundled_font: String,
    /// 系统字体候选（按顺序尝试）
    #[serde(default = "ResourcesConfig::default_system_fonts")]
    pub system_fonts: Vec<String>,
}

impl ResourcesConfig {
    fn default_static_dir() -> String {
        "./static".to_string()
    }
    fn default_uploads_dir() -> String {
        "./uploads".to_string()
    }
    fn default_fonts_dir() -> String {
        "./static/fonts".to_string()
    }
    fn default_custom_font_file() -> String {
        "custom-font.ttf".to_string()
    }
    fn default_bundled_font() -> String {
        "NotoSansDevanagari.ttf".to_string()
    }
    fn default_system_fonts() -> Vec<String> {
        vec![
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string(),
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf".to_string(),
        ]
    }

    /// 静态目录
    pub fn static_path(&self) -> PathBuf {
        PathBuf::from(&self.static_dir)
    }

    /// 上传目录
    pub fn uploads_path(&self) -> PathBuf {
        PathBuf::from(&self.uploads_dir)
    }

    /// 字体目录
    pub fn fonts_path(&self) -> PathBuf {
        PathBuf::from(&self.fonts_dir)
    }

    /// 自定义字体的固定位置
    pub fn custom_font_path(&self) -> PathBuf {
        self.fonts_path().join(&self.custom_font_file)
    }

    /// 默认字体的位置
    pub fn bundled_font_path(&self) -> PathBuf {
        self.static_path().join(&self.bundled_font)
    }

    /// 自定义字体的对外 URL（字体目录不在静态目录下时为 None）
    pub fn custom_font_url(&self) -> Option<String> {
        public_static_url(&self.static_path(), &self.custom_font_path())
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            static_dir: Self::default_static_dir(),
            uploads_dir: Self::default_uploads_dir(),
            fonts_dir: Self::default_fonts_dir(),
            custom_font_file: Self::default_custom_font_file(),
            bundled_font: Self::default_bundled_font(),
            system_fonts: Self::default_system_fonts(),
        }
    }
}

/// 将静态目录下的文件映射为 `/static/...` URL
pub fn public_static_url(static_dir: &Path, file: &Path) -> Option<String> {
    let rel = file
        .strip_prefix(static_dir)
        .ok()
        .or_else(|| file.strip_prefix(static_dir.strip_prefix(".").ok()?).ok())?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(format!("/static/{}", parts.join("/")))
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API 路由前缀
    #[serde(default = "ApiConfig::default_prefix")]
    pub prefix: String,
}

impl ApiConfig {
    fn default_prefix() -> String {
        "/api".to_string()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: Self::default_prefix(),
        }
    }
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 是否启用 CORS
    #[serde(default = "CorsConfig::default_enabled")]
    pub enabled: bool,
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    fn default_enabled() -> bool {
        true
    }
    fn default_allowed_origins() -> Vec<String> {
        vec!["*".to_string()]
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            allowed_origins: Self::default_allowed_origins(),
        }
    }
}

/// 图片渲染配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRenderConfig {
    /// 是否优先编码速度（PNG 使用快速压缩、不做行过滤）
    #[serde(default)]
    pub optimize_speed: bool,
    /// 并发渲染许可数（0=自动，取 CPU 核心数）
    #[serde(default)]
    pub max_parallel: u32,
    /// 画布宽/高上限（像素）
    #[serde(default = "ImageRenderConfig::default_max_dimension")]
    pub max_dimension: u32,
    /// 字体上传大小上限（字节）
    #[serde(default = "ImageRenderConfig::default_max_font_bytes")]
    pub max_font_bytes: usize,
}

impl ImageRenderConfig {
    fn default_max_dimension() -> u32 {
        8192
    }
    fn default_max_font_bytes() -> usize {
        20 * 1024 * 1024
    }

    /// 实际并发许可数
    pub fn effective_parallelism(&self) -> usize {
        match self.max_parallel {
            0 => num_cpus::get(),
            m => m as usize,
        }
    }
}

impl Default for ImageRenderConfig {
    fn default() -> Self {
        Self {
            optimize_speed: false,
            max_parallel: 0,
            max_dimension: Self::default_max_dimension(),
            max_font_bytes: Self::default_max_font_bytes(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub resources: ResourcesConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// CORS 配置
    #[serde(default)]
    pub cors: CorsConfig,
    /// 图片渲染配置
    #[serde(default)]
    pub image: ImageRenderConfig,
}

impl AppConfig {
    /// 从配置文件加载配置，支持环境变量覆盖
    ///
    /// 配置文件可缺省（全部使用默认值）。环境变量以 `APP_` 为前缀、`__` 分隔层级，
    /// 例如 `APP_SERVER__PORT=9000`、`APP_RESOURCES__SYSTEM_FONTS=/a.ttf,/b.ttf`。
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();

        tracing::info!("正在从 {:?} 加载配置文件", config_path);

        let builder = ConfigBuilder::builder()
            .add_source(File::from(config_path.as_path()).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("resources.system_fonts")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = builder.try_deserialize()?;

        tracing::debug!(
            "配置加载完成: static_dir = {}, 系统字体候选 {} 个",
            config.resources.static_dir,
            config.resources.system_fonts.len()
        );

        Ok(config)
    }

    /// 获取全局配置单例
    pub fn global() -> &'static AppConfig {
        CONFIG.get().expect("配置未初始化，请先调用 init_global()")
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<(), ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(())
    }

    /// 获取配置文件路径
    fn get_config_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ResourcesConfig, public_static_url};
    use std::path::Path;

    #[test]
    fn defaults_serve_static_under_api_prefix() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.api.prefix, "/api");
        assert_eq!(
            cfg.resources.custom_font_path(),
            Path::new("./static/fonts/custom-font.ttf")
        );
        assert_eq!(
            cfg.resources.bundled_font_path(),
            Path::new("./static/NotoSansDevanagari.ttf")
        );
        assert_eq!(cfg.resources.system_fonts.len(), 2);
    }

    #[test]
    fn custom_font_url_is_under_static() {
        let res = ResourcesConfig::default();
        assert_eq!(
            res.custom_font_url().as_deref(),
            Some("/static/fonts/custom-font.ttf")
        );
    }

    #[test]
    fn public_static_url_rejects_paths_outside_static_dir() {
        assert_eq!(
            public_static_url(Path::new("./static"), Path::new("/tmp/x.png")),
            None
        );
        assert_eq!(
            public_static_url(Path::new("static"), Path::new("static/generated-1.png")).as_deref(),
            Some("/static/generated-1.png")
        );
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: AppConfig = serde_json::from_str(r#"{ "server": { "port": 9000 } }"#)
            .expect("parse partial config");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.image.max_dimension, 8192);
    }
}
