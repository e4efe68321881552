//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only sees the values the commands
//! hand it (security options, binary comparison mode).
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `DEVMAN_<SECTION>__<KEY>`, e.g.
//!    `DEVMAN_PLAN__BINARY_COMPARISON=size-only`
//! 3. Config file: `--config FILE`, otherwise `<config dir>/config.toml`
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use devman_core::prelude::{BinaryComparison, SecurityConfig};

pub const ENV_PREFIX: &str = "DEVMAN";
pub const CONFIG_FILE: &str = "config.toml";
pub const REGISTRY_FILE: &str = "registry.json";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default values for new projects.
    pub defaults: Defaults,
    /// Output settings.
    pub output: OutputConfig,
    /// Template lookup and caching.
    pub templates: TemplateConfig,
    /// Planner settings.
    pub plan: PlanConfig,
    /// Security tooling written into new projects.
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub python_version: String,
    pub project_type: String,
    pub container_type: String,
    pub template: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            python_version: "3.11".into(),
            project_type: "api".into(),
            container_type: "devenv".into(),
            template: "devenv".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Extra directories holding template sets, searched by name.
    pub search_paths: Vec<PathBuf>,
    /// Where remote templates are cloned (default: the user cache dir).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Registry of remote templates (default: `<config dir>/registry.json`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub binary_comparison: BinaryComparison,
}

impl AppConfig {
    /// Load configuration, layering file and environment over defaults.
    ///
    /// `config_file` is the path the user passed via `--config`; `None`
    /// uses [`Self::config_path`].  A missing file is not an error, a
    /// malformed one is.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let path = config_file.cloned().unwrap_or_else(Self::config_path);

        let defaults =
            Config::try_from(&Self::default()).context("failed to encode built-in defaults")?;

        Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.as_path()).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .and_then(|merged| merged.try_deserialize())
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Directory holding `config.toml` and `registry.json`.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `~/.devman`.
    pub fn config_dir() -> PathBuf {
        directories::ProjectDirs::from("dev", "devman", "devman")
            .map(|d| d.config_dir().to_path_buf())
            .or_else(|| dirs::home_dir().map(|home| home.join(".devman")))
            .unwrap_or_else(|| PathBuf::from(".devman"))
    }

    /// Path to the default configuration file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    /// The config file actually in use for this invocation.
    pub fn active_path(config_file: Option<&Path>) -> PathBuf {
        config_file
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path)
    }

    pub fn registry_file(&self) -> PathBuf {
        self.templates
            .registry_file
            .clone()
            .unwrap_or_else(|| Self::config_dir().join(REGISTRY_FILE))
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.templates.cache_dir.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("dev", "devman", "devman")
                .map(|d| d.cache_dir().join("templates"))
                .unwrap_or_else(|| Self::config_dir().join("cache"))
        })
    }

    /// Configured search paths followed by `<config dir>/templates`.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.templates.search_paths.clone();
        paths.push(Self::config_dir().join("templates"));
        paths
    }
}
