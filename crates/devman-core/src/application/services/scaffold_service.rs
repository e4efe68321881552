//! Scaffold Service - main application orchestrator.
//!
//! This service coordinates the generation workflow:
//! 1. Resolve the template set for a selector
//! 2. Snapshot it with the request context (in memory)
//! 3. Plan the snapshot against the destination
//! 4. On request, write the plan, reusing the same snapshot
//!
//! It implements the driving port (incoming) and uses driven ports (outgoing).

use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{Filesystem, TemplateRenderer, TemplateSource},
        services::{
            planner::{BinaryComparison, Planner},
            snapshot_service::Snapshotter,
        },
    },
    domain::{
        Plan, PlanStatus, RelativePath, RenderContext, Snapshot, entities::plan::NOTE_IDENTICAL,
    },
    error::DevmanResult,
};

/// Everything needed to compute one plan.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Template selector: builtin name, registered name, path or URL.
    pub template: String,
    pub destination: PathBuf,
    pub context: RenderContext,
    pub force: bool,
}

/// A snapshot together with the plan computed from it.
#[derive(Debug, Clone)]
pub struct Generation {
    pub snapshot: Snapshot,
    pub plan: Plan,
}

/// Outcome of the write phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Files created or overwritten.
    pub written: Vec<RelativePath>,
    /// Files already identical on disk.
    pub unchanged: Vec<RelativePath>,
    /// Files left alone because they differ and force was off.
    pub conflicts: Vec<RelativePath>,
}

/// Main scaffolding service.
pub struct ScaffoldService {
    source: Box<dyn TemplateSource>,
    renderer: Box<dyn TemplateRenderer>,
    filesystem: Box<dyn Filesystem>,
    comparison: BinaryComparison,
}

impl ScaffoldService {
    /// Create a new scaffold service with the given adapters.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let service = ScaffoldService::new(
    ///     Box::new(registry),   // impl TemplateSource
    ///     Box::new(renderer),   // impl TemplateRenderer
    ///     Box::new(filesystem), // impl Filesystem
    /// );
    /// ```
    pub fn new(
        source: Box<dyn TemplateSource>,
        renderer: Box<dyn TemplateRenderer>,
        filesystem: Box<dyn Filesystem>,
    ) -> Self {
        Self {
            source,
            renderer,
            filesystem,
            comparison: BinaryComparison::default(),
        }
    }

    pub fn with_binary_comparison(mut self, comparison: BinaryComparison) -> Self {
        self.comparison = comparison;
        self
    }

    /// Resolve, snapshot and plan. Never writes.
    #[instrument(
        skip_all,
        fields(
            template = %request.template,
            destination = %request.destination.display(),
            force = request.force
        )
    )]
    pub fn prepare(&self, request: &GenerationRequest) -> DevmanResult<Generation> {
        let template = self.source.resolve(&request.template)?;
        info!(template = %template.id, "Template resolved");

        let snapshot =
            Snapshotter::new(self.renderer.as_ref()).snapshot(&template, &request.context)?;
        let plan = Planner::new(self.filesystem.as_ref())
            .with_comparison(self.comparison)
            .plan(&snapshot, &request.destination, request.force)?;

        info!(
            files = plan.entries().len(),
            conflicts = plan.conflicts().len(),
            "Plan ready"
        );
        Ok(Generation { snapshot, plan })
    }

    /// Write a prepared generation.
    ///
    /// Writes `create` entries and `overwrite` entries whose content differs.
    /// Conflicts are never touched. On failure, files created during this
    /// call are removed (best effort) and the original error is returned.
    #[instrument(skip_all, fields(destination = %generation.plan.destination().display()))]
    pub fn apply(&self, generation: &Generation) -> DevmanResult<WriteReport> {
        let destination = generation.plan.destination();
        let mut report = WriteReport::default();
        let mut created: Vec<PathBuf> = Vec::new();

        match self.write_entries(generation, destination, &mut report, &mut created) {
            Ok(()) => {
                info!(
                    written = report.written.len(),
                    unchanged = report.unchanged.len(),
                    conflicts = report.conflicts.len(),
                    "Write complete"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "Write failed, attempting rollback");
                self.rollback(&created);
                Err(e)
            }
        }
    }

    /// Convenience for callers that always write: prepare then apply.
    pub fn generate(&self, request: &GenerationRequest) -> DevmanResult<(Generation, WriteReport)> {
        let generation = self.prepare(request)?;
        let report = self.apply(&generation)?;
        Ok((generation, report))
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    fn write_entries(
        &self,
        generation: &Generation,
        destination: &Path,
        report: &mut WriteReport,
        created: &mut Vec<PathBuf>,
    ) -> DevmanResult<()> {
        self.filesystem.create_dir_all(destination)?;

        for entry in generation.plan.entries() {
            match entry.status {
                PlanStatus::SkipIdentical => {
                    report.unchanged.push(entry.path.clone());
                    continue;
                }
                PlanStatus::SkipExists => {
                    report.conflicts.push(entry.path.clone());
                    continue;
                }
                PlanStatus::Overwrite if entry.note == NOTE_IDENTICAL => {
                    report.unchanged.push(entry.path.clone());
                    continue;
                }
                PlanStatus::Create | PlanStatus::Overwrite => {}
            }

            let record = generation.snapshot.get(&entry.path).ok_or_else(|| {
                ApplicationError::ValidationFailed(format!(
                    "plan entry '{}' has no snapshot file",
                    entry.path
                ))
            })?;

            let target = destination.join(entry.path.to_path_buf());
            if let Some(parent) = target.parent() {
                self.filesystem.create_dir_all(parent)?;
            }
            self.filesystem.write_file(&target, &record.to_bytes()?)?;

            if entry.status == PlanStatus::Create {
                created.push(target);
            }
            report.written.push(entry.path.clone());
        }

        Ok(())
    }

    /// Best-effort removal of files this run created.
    fn rollback(&self, created: &[PathBuf]) {
        for path in created.iter().rev() {
            if let Err(e) = self.filesystem.remove_file(path) {
                warn!(error = %e, path = %path.display(), "Rollback failed");
            }
        }
        info!(removed = created.len(), "Rollback finished");
    }
}
