//! `.devman/devman.toml`: what a project was generated from.
//!
//! ```toml
//! [devman]
//! version = "0.1.0"
//! created_at = "2026-01-01T00:00:00Z"
//! updated_at = "2026-01-01T00:00:00Z"
//!
//! [project]
//! name = "my-api"
//! # ... the full ProjectConfig
//!
//! [templates]
//! selector = "devenv"
//!
//! [generation]
//! last_generated = "2026-01-01T00:00:00Z"
//! generated_files = ["devenv.nix", "justfile"]
//! ```

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use devman_core::{
    application::ApplicationError,
    domain::ProjectConfig,
    error::{DevmanError, DevmanResult},
};

pub const DEVMAN_DIR: &str = ".devman";
pub const MANIFEST_FILE: &str = "devman.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSection {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatesSection {
    /// Selector the project was generated from.
    pub selector: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_generated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub generated_files: Vec<String>,
}

/// Contents of `.devman/devman.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub devman: ToolSection,
    pub project: ProjectConfig,
    pub templates: TemplatesSection,
    #[serde(default)]
    pub generation: GenerationSection,
}

impl ProjectManifest {
    pub fn new(project: ProjectConfig, selector: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            devman: ToolSection {
                version: env!("CARGO_PKG_VERSION").to_string(),
                created_at: now,
                updated_at: now,
            },
            project,
            templates: TemplatesSection {
                selector: selector.into(),
            },
            generation: GenerationSection::default(),
        }
    }

    /// Manifest location for a project rooted at `project_dir`.
    pub fn path_in(project_dir: &Path) -> PathBuf {
        project_dir.join(DEVMAN_DIR).join(MANIFEST_FILE)
    }

    /// Read the manifest of the project at `project_dir`.
    ///
    /// # Errors
    ///
    /// - [`ApplicationError::ManifestNotFound`] if there is none
    /// - a configuration error if it does not parse or holds an invalid project
    #[instrument(skip_all, fields(dir = %project_dir.display()))]
    pub fn load(project_dir: &Path) -> DevmanResult<Self> {
        let path = Self::path_in(project_dir);
        let raw = fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DevmanError::from(ApplicationError::ManifestNotFound {
                path: path.clone(),
            }),
            _ => ApplicationError::filesystem(&path, e.to_string()).into(),
        })?;

        let manifest: Self = toml::from_str(&raw).map_err(|e| {
            DevmanError::configuration(format!("malformed {}: {e}", path.display()))
        })?;
        manifest.project.validate().map_err(|e| {
            DevmanError::configuration(format!("invalid project in {}: {e}", path.display()))
        })?;

        debug!(selector = %manifest.templates.selector, "Loaded project manifest");
        Ok(manifest)
    }

    /// Write the manifest under `project_dir`, returning its path.
    pub fn save(&self, project_dir: &Path) -> DevmanResult<PathBuf> {
        let path = Self::path_in(project_dir);
        let raw = toml::to_string_pretty(self).map_err(|e| DevmanError::Internal {
            message: format!("cannot serialize project manifest: {e}"),
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DevmanError::from(ApplicationError::filesystem(parent, e.to_string()))
            })?;
        }
        fs::write(&path, raw)
            .map_err(|e| DevmanError::from(ApplicationError::filesystem(&path, e.to_string())))?;

        debug!(path = %path.display(), "Saved project manifest");
        Ok(path)
    }

    /// Record a generation run.
    pub fn mark_generated(&mut self, files: impl IntoIterator<Item = String>) {
        let now = Utc::now();
        self.generation.last_generated = Some(now);
        self.generation.generated_files = files.into_iter().collect();
        self.devman.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devman_core::domain::{ContainerType, DatabaseType};
    use devman_core::error::ErrorCategory;
    use tempfile::TempDir;

    fn project() -> ProjectConfig {
        ProjectConfig::builder("my-api")
            .container_type(ContainerType::Docker)
            .database(Some(DatabaseType::Sqlite))
            .dependencies(["pydantic>=2"])
            .build()
            .unwrap()
    }

    #[test]
    fn saves_and_loads_back() {
        let tmp = TempDir::new().unwrap();
        let mut manifest = ProjectManifest::new(project(), "devenv");
        manifest.mark_generated(["justfile".to_string(), "devenv.nix".to_string()]);

        let path = manifest.save(tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join(".devman/devman.toml"));

        let loaded = ProjectManifest::load(tmp.path()).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.project.database(), Some(DatabaseType::Sqlite));
        assert_eq!(loaded.generation.generated_files.len(), 2);
    }

    #[test]
    fn project_without_database_round_trips() {
        let tmp = TempDir::new().unwrap();
        let config = ProjectConfig::builder("plain-lib").build().unwrap();
        ProjectManifest::new(config.clone(), "gh:org/repo")
            .save(tmp.path())
            .unwrap();

        let loaded = ProjectManifest::load(tmp.path()).unwrap();
        assert_eq!(loaded.project, config);
        assert_eq!(loaded.templates.selector, "gh:org/repo");
        assert!(loaded.generation.last_generated.is_none());
    }

    #[test]
    fn missing_manifest_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = ProjectManifest::load(tmp.path()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn malformed_manifest_is_a_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let path = ProjectManifest::path_in(tmp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[devman]\nversion = ").unwrap();

        let err = ProjectManifest::load(tmp.path()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
