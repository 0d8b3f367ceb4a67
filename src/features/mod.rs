/// 健康检查
pub mod health;
/// 文字图片渲染（核心）
pub mod image;
/// 生成器页面
pub mod page;
