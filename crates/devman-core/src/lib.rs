//! devman core - generation planning behind ports and adapters.
//!
//! This crate provides the domain and application layers for the devman
//! project scaffolding tool, following hexagonal (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            devman-cli (CLI)             │
//! │      (Implements Driving Ports)         │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  ScaffoldService ─► Snapshotter         │
//! │                  └► Planner             │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │       Application Ports (Traits)        │
//! │ (Driven: Source, Renderer, Filesystem)  │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     devman-adapters (Infrastructure)    │
//! │ (Handlebars, Registry, LocalFilesystem) │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (ProjectConfig, TemplateSet, Snapshot,  │
//! │  Plan)                                  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use devman_core::prelude::*;
//!
//! let config = ProjectConfig::builder("my-api").build()?;
//! let service = ScaffoldService::new(source, renderer, filesystem);
//!
//! let generation = service.prepare(&GenerationRequest {
//!     template: "devenv".into(),
//!     destination: "./my-api".into(),
//!     context: config.to_context(),
//!     force: false,
//! })?;
//!
//! if !generation.plan.has_conflicts() {
//!     service.apply(&generation)?;
//! }
//! ```

pub mod domain;

pub mod application;

pub mod error;

/// Public API - what external crates should use.
pub mod prelude {
    pub use crate::application::{
        BinaryComparison, Generation, GenerationRequest, Planner, ScaffoldService, Snapshotter,
        TemplateInfo, TemplateService, WriteReport,
        ports::{Filesystem, PathKind, RenderedFile, TemplateRenderer, TemplateSource},
    };
    pub use crate::domain::{
        ContainerType, DatabaseType, Plan, PlanEntry, PlanStatus, ProjectConfig, ProjectType,
        PythonVersion, RelativePath, RenderContext, SecurityConfig, Snapshot, TemplateId,
        TemplateSet,
    };
    pub use crate::error::{DevmanError, DevmanResult, ErrorCategory};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
