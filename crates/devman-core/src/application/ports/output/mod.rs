//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `devman-adapters` crate provides implementations.

use crate::domain::{RenderContext, TemplateSet, TemplateSummary};
use crate::error::DevmanResult;
use std::path::Path;

/// What currently occupies a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Missing,
    File,
    Directory,
    /// Sockets, devices and anything else that is neither.
    Other,
}

/// Port for filesystem operations.
///
/// Implemented by:
/// - `devman_adapters::filesystem::LocalFilesystem` (production)
/// - `devman_adapters::filesystem::MemoryFilesystem` (testing)
///
/// Contents are raw bytes; classification into text or binary happens in
/// the core.
pub trait Filesystem: Send + Sync {
    /// Report what is at `path` without following it further.
    fn probe(&self, path: &Path) -> DevmanResult<PathKind>;

    /// Read a whole file.
    fn read(&self, path: &Path) -> DevmanResult<Vec<u8>>;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> DevmanResult<()>;

    /// Create or truncate a file with `contents`.
    fn write_file(&self, path: &Path, contents: &[u8]) -> DevmanResult<()>;

    /// Remove a single file.
    fn remove_file(&self, path: &Path) -> DevmanResult<()>;

    fn exists(&self, path: &Path) -> bool {
        !matches!(self.probe(path), Ok(PathKind::Missing) | Err(_))
    }
}

/// A single rendered output file. `path` is still unvalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: String,
    pub contents: Vec<u8>,
}

impl RenderedFile {
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Port for template rendering.
///
/// Implemented by:
/// - `devman_adapters::renderer::HandlebarsRenderer`
/// - `devman_adapters::renderer::SecurityOverlay` (decorates another renderer)
pub trait TemplateRenderer: Send + Sync {
    /// Render every file of `template` with `context`.
    ///
    /// Files whose path renders away (an empty segment) are omitted. Invalid
    /// syntax or an undefined variable is a render error.
    fn render(
        &self,
        template: &TemplateSet,
        context: &RenderContext,
    ) -> DevmanResult<Vec<RenderedFile>>;
}

/// Port for locating template sets.
///
/// Implemented by:
/// - `devman_adapters::template_store::BuiltinTemplates`
/// - `devman_adapters::template_store::TemplateRegistry` (builtin, local and git)
pub trait TemplateSource: Send + Sync {
    /// Resolve a selector (name, path or URL) to a template set.
    fn resolve(&self, selector: &str) -> DevmanResult<TemplateSet>;

    /// List the template sets this source knows by name.
    fn list(&self) -> DevmanResult<Vec<TemplateSummary>>;
}
