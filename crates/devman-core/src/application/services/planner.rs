//! Planner - classifies a snapshot against a destination directory.
//!
//! Read-only: the planner probes and reads the destination but never
//! writes. Running it twice on an unchanged destination yields the same
//! plan.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    application::{
        ApplicationError,
        ports::{Filesystem, PathKind},
    },
    domain::{
        FileRecord, Plan, PlanEntry, PlanStatus, RelativePath, Snapshot,
        entities::plan::{NOTE_IDENTICAL, NOTE_USE_FORCE},
    },
    error::{DevmanError, DevmanResult},
};

/// How files that are not text on both sides are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BinaryComparison {
    /// Byte-for-byte equality.
    #[default]
    Exact,
    /// Equal sizes count as identical. Cheaper, but blind to edits that
    /// keep the length.
    SizeOnly,
}

impl BinaryComparison {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::SizeOnly => "size-only",
        }
    }
}

impl fmt::Display for BinaryComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BinaryComparison {
    type Err = DevmanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "size-only" | "size_only" | "size" => Ok(Self::SizeOnly),
            other => Err(DevmanError::configuration(format!(
                "unknown binary comparison '{other}' (expected exact or size-only)"
            ))),
        }
    }
}

pub struct Planner<'a> {
    filesystem: &'a dyn Filesystem,
    comparison: BinaryComparison,
}

impl<'a> Planner<'a> {
    pub fn new(filesystem: &'a dyn Filesystem) -> Self {
        Self {
            filesystem,
            comparison: BinaryComparison::default(),
        }
    }

    pub fn with_comparison(mut self, comparison: BinaryComparison) -> Self {
        self.comparison = comparison;
        self
    }

    /// Compare `snapshot` against `destination`.
    ///
    /// # Errors
    ///
    /// - `DestinationNotDirectory` if the destination exists as a non-directory
    /// - `Filesystem` if an existing file cannot be read
    #[instrument(skip_all, fields(destination = %destination.display(), force))]
    pub fn plan(&self, snapshot: &Snapshot, destination: &Path, force: bool) -> DevmanResult<Plan> {
        let destination_exists = match self.filesystem.probe(destination)? {
            PathKind::Missing => false,
            PathKind::Directory => true,
            PathKind::File | PathKind::Other => {
                return Err(ApplicationError::DestinationNotDirectory {
                    path: destination.to_path_buf(),
                }
                .into());
            }
        };

        let mut entries = Vec::with_capacity(snapshot.len());
        for (path, record) in snapshot.iter() {
            let size = record.raw_size();
            let target = destination.join(path.to_path_buf());

            let existing = if destination_exists {
                self.filesystem.probe(&target)?
            } else {
                PathKind::Missing
            };

            let entry = match existing {
                PathKind::Missing => PlanEntry::new(path.clone(), PlanStatus::Create, size, ""),
                PathKind::File => {
                    let current = self.filesystem.read(&target)?;
                    self.classify(path.clone(), size, self.is_identical(record, &current), force)
                }
                PathKind::Directory | PathKind::Other => {
                    self.classify(path.clone(), size, false, force)
                }
            };

            debug!(path = %entry.path, status = %entry.status, "Planned file");
            entries.push(entry);
        }

        let plan = Plan::new(destination, snapshot.template().clone(), force, entries);
        debug!(
            files = plan.entries().len(),
            conflicts = plan.conflicts().len(),
            "Plan complete"
        );
        Ok(plan)
    }

    fn classify(&self, path: RelativePath, size: u64, identical: bool, force: bool) -> PlanEntry {
        match (identical, force) {
            (true, false) => PlanEntry::new(path, PlanStatus::SkipIdentical, size, ""),
            (true, true) => PlanEntry::new(path, PlanStatus::Overwrite, size, NOTE_IDENTICAL),
            (false, false) => PlanEntry::new(path, PlanStatus::SkipExists, size, NOTE_USE_FORCE),
            (false, true) => PlanEntry::new(path, PlanStatus::Overwrite, size, ""),
        }
    }

    fn is_identical(&self, record: &FileRecord, current: &[u8]) -> bool {
        let current_text = std::str::from_utf8(current).ok();

        match (record.content(), current_text) {
            // Text on both sides: exact string equality, no normalization.
            (Some(expected), Some(actual)) => expected == actual,
            _ => match self.comparison {
                BinaryComparison::Exact => record
                    .payload()
                    .is_some_and(|payload| payload == hex::encode(current)),
                // A text file on disk never matches a binary record.
                BinaryComparison::SizeOnly => {
                    current_text.is_none() && record.raw_size() == current.len() as u64
                }
            },
        }
    }
}
