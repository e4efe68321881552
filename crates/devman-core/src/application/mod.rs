//! Application layer for devman.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (Snapshotter, Planner, ScaffoldService, TemplateService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! business rules itself. Those live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

pub use services::{
    BinaryComparison, Generation, GenerationRequest, Planner, ScaffoldService, Snapshotter,
    TemplateInfo, TemplateService, WriteReport,
};

pub use ports::{Filesystem, PathKind, RenderedFile, TemplateRenderer, TemplateSource};

pub use error::ApplicationError;
