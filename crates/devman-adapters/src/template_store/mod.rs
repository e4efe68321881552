//! Template sources: built-in sets, template directories and remote
//! repositories, unified behind [`TemplateRegistry`].

pub mod builtin;
pub mod git;
pub mod loader;
pub mod registry;

pub use builtin::BuiltinTemplates;
pub use git::{GitFetcher, TemplateFetcher};
pub use loader::FilesystemTemplateLoader;
pub use registry::{RemoteTemplate, TemplateRegistry};
