//! Domain value objects: ProjectType, ContainerType, DatabaseType, PythonVersion.
//!
//! # Design
//!
//! These are pure value types with equality-by-value and no identity. Each
//! one owns its string representation and its `FromStr` parser so the CLI,
//! the config file and the project manifest all agree on spelling.
//!
//! # Adding New Variants
//!
//! 1. Add the enum variant here
//! 2. Add the `as_str` arm, the `FromStr` arm and the `ALL` entry here
//! 3. Add default dependencies in `entities/project.rs` if the variant needs any

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── ProjectType ──────────────────────────────────────────────────────────────

/// The kind of Python project to scaffold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    #[default]
    Api,
    Web,
    Cli,
    Ml,
    Lib,
}

impl ProjectType {
    pub const ALL: [Self; 5] = [Self::Api, Self::Web, Self::Cli, Self::Ml, Self::Lib];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Web => "web",
            Self::Cli => "cli",
            Self::Ml => "ml",
            Self::Lib => "lib",
        }
    }

    /// One-line description used by `devman list`.
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Api => "FastAPI REST API",
            Self::Web => "Flask web application",
            Self::Cli => "Command line interface",
            Self::Ml => "Machine learning project",
            Self::Lib => "Python library",
        }
    }

    pub const fn features(&self) -> &'static str {
        match self {
            Self::Api => "FastAPI, uvicorn, async",
            Self::Web => "Flask, templates, static files",
            Self::Cli => "Typer, rich, entry points",
            Self::Ml => "scikit-learn, jupyter, data tools",
            Self::Lib => "Publishing ready, minimal deps",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "web" => Ok(Self::Web),
            "cli" => Ok(Self::Cli),
            "ml" => Ok(Self::Ml),
            "lib" | "library" => Ok(Self::Lib),
            other => Err(DomainError::UnknownValue {
                field: "project type",
                value: other.to_string(),
                expected: "api, web, cli, ml, lib",
            }),
        }
    }
}

// ── ContainerType ────────────────────────────────────────────────────────────

/// How the generated project is containerised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerType {
    #[default]
    Devenv,
    Docker,
    Nixos,
    None,
}

impl ContainerType {
    pub const ALL: [Self; 4] = [Self::Devenv, Self::Docker, Self::Nixos, Self::None];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Devenv => "devenv",
            Self::Docker => "docker",
            Self::Nixos => "nixos",
            Self::None => "none",
        }
    }

    pub const fn uses_containers(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "devenv" => Ok(Self::Devenv),
            "docker" => Ok(Self::Docker),
            "nixos" | "nix" => Ok(Self::Nixos),
            "none" => Ok(Self::None),
            other => Err(DomainError::UnknownValue {
                field: "container type",
                value: other.to_string(),
                expected: "devenv, docker, nixos, none",
            }),
        }
    }
}

// ── DatabaseType ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    #[default]
    Postgresql,
    Sqlite,
}

impl DatabaseType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postgresql => "postgresql",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(Self::Postgresql),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(DomainError::UnknownValue {
                field: "database type",
                value: other.to_string(),
                expected: "postgresql, sqlite",
            }),
        }
    }
}

// ── PythonVersion ────────────────────────────────────────────────────────────

/// A supported CPython minor version (`3.9` through `3.13`).
///
/// Invariant: always `3.<minor>` with `minor` in the supported range.
/// Enforced at construction; serde goes through the same check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PythonVersion {
    minor: u8,
}

impl PythonVersion {
    pub const SUPPORTED_MINORS: std::ops::RangeInclusive<u8> = 9..=13;

    /// Version without dots, e.g. `311` for `3.11`.
    pub fn short(&self) -> String {
        format!("3{}", self.minor)
    }

    pub fn minor(&self) -> u8 {
        self.minor
    }
}

impl Default for PythonVersion {
    fn default() -> Self {
        Self { minor: 11 }
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "3.{}", self.minor)
    }
}

impl FromStr for PythonVersion {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || DomainError::UnsupportedPythonVersion {
            version: s.to_string(),
        };

        let minor = s.strip_prefix("3.").ok_or_else(unsupported)?;
        // Reject "3.011", "3.+9" and friends that `parse` would accept.
        if minor.is_empty() || minor.starts_with('0') || !minor.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(unsupported());
        }
        let minor: u8 = minor.parse().map_err(|_| unsupported())?;

        if Self::SUPPORTED_MINORS.contains(&minor) {
            Ok(Self { minor })
        } else {
            Err(unsupported())
        }
    }
}

impl TryFrom<String> for PythonVersion {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PythonVersion> for String {
    fn from(value: PythonVersion) -> Self {
        value.to_string()
    }
}
