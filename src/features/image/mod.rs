mod builtin_font;
pub mod font;
pub mod handler;
pub mod layout;
pub mod renderer;
mod service;
mod types;

pub use font::{BUILTIN_FALLBACK_SIZE, FontCandidate, FontOrigin, FontResolver, ResolvedFont};
pub use handler::create_image_router;
pub use layout::{DrawCommand, DrawPlan, LineMetrics, compute_plan, plan_layout, split_lines};
pub use renderer::{encode_png, rasterize};
pub use service::{CanvasSpec, RenderOptions, RenderedImage, TextImageRenderer};
pub use types::{GenerateResponse, RenderRequest, UploadFontForm, UploadFontResponse};
