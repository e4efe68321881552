//! Template renderers.

mod handlebars;
mod security;

pub use handlebars::HandlebarsRenderer;
pub use security::SecurityOverlay;
