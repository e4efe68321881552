//! Infrastructure adapters for devman.
//!
//! This crate implements the ports defined in `devman_core::application::ports`.
//! It contains all external dependencies and I/O operations:
//!
//! - [`filesystem`]: local and in-memory filesystem adapters
//! - [`renderer`]: Handlebars rendering and the security tooling overlay
//! - [`template_store`]: built-in sets, template directories, git fetching and the registry
//! - [`project_manifest`]: `.devman/devman.toml` written into generated projects

pub mod filesystem;
pub mod project_manifest;
pub mod renderer;
pub mod template_store;

// Re-export commonly used adapters
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use project_manifest::ProjectManifest;
pub use renderer::{HandlebarsRenderer, SecurityOverlay};
pub use template_store::{
    BuiltinTemplates, FilesystemTemplateLoader, GitFetcher, RemoteTemplate, TemplateFetcher,
    TemplateRegistry,
};
