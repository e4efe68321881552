//! Core domain layer for devman.
//!
//! This module contains pure business logic with no I/O. Rendering and
//! filesystem access are reached through ports defined in the application
//! layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or process calls
//! - **Few crates**: std, thiserror, serde (for persisted shapes) and hex
//! - **Immutable entities**: All domain objects are Clone + PartialEq
//! - **Rich domain model**: Behavior lives in entities, not services

pub mod entities;
pub mod error;
pub mod value_objects;

mod validation;

pub use entities::{
    ContextValue, FileKind, FileRecord, Plan, PlanEntry, PlanReport, PlanStatus, PlanSummary,
    ProjectConfig, ProjectConfigBuilder, RelativePath, RenderContext, SecurityConfig, Snapshot,
    TemplateBody, TemplateFile, TemplateId, TemplateSet, TemplateSummary, VariableKind,
    VariableSpec,
    project::slugify,
};

pub use error::{DomainError, ErrorCategory};

pub use value_objects::{ContainerType, DatabaseType, ProjectType, PythonVersion};

pub use validation::ProjectValidator;
