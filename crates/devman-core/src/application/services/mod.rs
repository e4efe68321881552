//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "plan a project" or "list templates".

pub mod planner;
pub mod scaffold_service;
pub mod snapshot_service;
pub mod template_service;

pub use planner::{BinaryComparison, Planner};
pub use scaffold_service::{Generation, GenerationRequest, ScaffoldService, WriteReport};
pub use snapshot_service::Snapshotter;
pub use template_service::{TemplateInfo, TemplateService};
