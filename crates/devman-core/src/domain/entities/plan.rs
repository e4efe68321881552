//! Generation plan: how every snapshot file relates to a destination.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::entities::{
    common::RelativePath,
    snapshot::{FileRecord, Snapshot},
    template::TemplateId,
};

pub const NOTE_IDENTICAL: &str = "identical content";
pub const NOTE_USE_FORCE: &str = "use --force to overwrite";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanStatus {
    Create,
    SkipIdentical,
    SkipExists,
    Overwrite,
}

impl PlanStatus {
    pub const ALL: [Self; 4] = [
        Self::Create,
        Self::SkipIdentical,
        Self::SkipExists,
        Self::Overwrite,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::SkipIdentical => "skip-identical",
            Self::SkipExists => "skip-exists",
            Self::Overwrite => "overwrite",
        }
    }

    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::SkipIdentical | Self::SkipExists)
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub path: RelativePath,
    pub status: PlanStatus,
    pub size: u64,
    pub note: String,
}

impl PlanEntry {
    pub fn new(path: RelativePath, status: PlanStatus, size: u64, note: impl Into<String>) -> Self {
        Self {
            path,
            status,
            size,
            note: note.into(),
        }
    }
}

/// Classification of a snapshot against one destination.
///
/// Invariants: entries are sorted by path and `conflicts` is exactly the
/// sorted set of `skip-exists` paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    destination: PathBuf,
    template: TemplateId,
    force: bool,
    entries: Vec<PlanEntry>,
    conflicts: Vec<RelativePath>,
}

impl Plan {
    pub fn new(
        destination: impl Into<PathBuf>,
        template: TemplateId,
        force: bool,
        mut entries: Vec<PlanEntry>,
    ) -> Self {
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        let conflicts = entries
            .iter()
            .filter(|e| e.status == PlanStatus::SkipExists)
            .map(|e| e.path.clone())
            .collect();

        Self {
            destination: destination.into(),
            template,
            force,
            entries,
            conflicts,
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn template(&self) -> &TemplateId {
        &self.template
    }

    pub fn force(&self) -> bool {
        self.force
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn conflicts(&self) -> &[RelativePath] {
        &self.conflicts
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn count(&self, status: PlanStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            destination: self.destination.display().to_string(),
            template: self.template.to_string(),
            total_files: self.entries.len(),
            create: self.count(PlanStatus::Create),
            skip_identical: self.count(PlanStatus::SkipIdentical),
            skip_exists: self.count(PlanStatus::SkipExists),
            overwrite: self.count(PlanStatus::Overwrite),
            conflicts: self.conflicts.len(),
        }
    }

    /// JSON-ready export of this plan together with the files it covers.
    pub fn report<'a>(&'a self, snapshot: &'a Snapshot) -> PlanReport<'a> {
        PlanReport {
            destination: self.destination.display().to_string(),
            template: self.template.to_string(),
            force: self.force,
            plan: &self.entries,
            files: snapshot.files(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub destination: String,
    pub template: String,
    pub total_files: usize,
    pub create: usize,
    pub skip_identical: usize,
    pub skip_exists: usize,
    pub overwrite: usize,
    pub conflicts: usize,
}

#[derive(Debug, Serialize)]
pub struct PlanReport<'a> {
    pub destination: String,
    pub template: String,
    pub force: bool,
    pub plan: &'a [PlanEntry],
    pub files: &'a BTreeMap<RelativePath, FileRecord>,
}
