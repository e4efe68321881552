pub mod common;
pub mod context;
pub mod plan;
pub mod project;
pub mod snapshot;
pub mod template;

pub use crate::domain::DomainError;
pub use common::RelativePath;
pub use context::{ContextValue, RenderContext, VariableKind};
pub use plan::{Plan, PlanEntry, PlanReport, PlanStatus, PlanSummary};
pub use project::{ProjectConfig, ProjectConfigBuilder, SecurityConfig};
pub use snapshot::{FileKind, FileRecord, Snapshot};
pub use template::{
    TemplateBody, TemplateFile, TemplateId, TemplateSet, TemplateSummary, VariableSpec,
};
