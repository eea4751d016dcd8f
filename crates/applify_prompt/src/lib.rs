mod inquire_renderer;
mod plugin;

pub use inquire_renderer::InquireRenderer;
pub use plugin::*;
