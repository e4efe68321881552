//! Validated project options and the render context derived from them.

use crate::domain::{
    entities::context::RenderContext,
    error::DomainError,
    validation::ProjectValidator,
    value_objects::{ContainerType, DatabaseType, ProjectType, PythonVersion},
};
use serde::{Deserialize, Serialize};

const BASE_RUFF_SELECT: &[&str] = &["E", "F", "I", "N", "W", "UP"];
const SECURITY_RUFF_SELECT: &[&str] = &["S", "B", "A", "C4", "T20", "SIM", "PIE", "PL"];
const SECURITY_RUFF_IGNORE: &[&str] = &["S101", "S311"];

// ── SecurityConfig ───────────────────────────────────────────────────────────

/// Which security tooling configuration to generate.
///
/// Only configuration files are produced; nothing here runs a scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub enabled: bool,
    pub enable_pre_commit: bool,
    pub enable_dependency_scan: bool,
    pub enable_secret_detection: bool,
    pub enable_security_linting: bool,
    pub enable_vulnerability_scan: bool,
    pub bandit_enabled: bool,
    pub safety_enabled: bool,

    pub pre_commit_hooks_version: String,
    pub ruff_version: String,
    pub mypy_version: String,
    pub bandit_version: String,
    pub detect_secrets_version: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_pre_commit: true,
            enable_dependency_scan: true,
            enable_secret_detection: true,
            enable_security_linting: true,
            enable_vulnerability_scan: true,
            bandit_enabled: true,
            safety_enabled: true,
            pre_commit_hooks_version: "v4.5.0".into(),
            ruff_version: "v0.1.0".into(),
            mypy_version: "v1.7.0".into(),
            bandit_version: "1.7.5".into(),
            detect_secrets_version: "v1.4.0".into(),
        }
    }
}

impl SecurityConfig {
    /// Security tooling switched off entirely.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Dev dependencies the enabled tooling needs, in install order.
    pub fn tool_dependencies(&self) -> Vec<&'static str> {
        if !self.enabled {
            return Vec::new();
        }

        let mut tools = Vec::new();
        if self.enable_pre_commit {
            tools.push("pre-commit");
        }
        if self.bandit_enabled {
            tools.push("bandit[toml]");
        }
        if self.safety_enabled {
            tools.push("safety");
        }
        if self.enable_dependency_scan {
            tools.extend(["pip-audit", "pip-tools"]);
        }
        tools
    }

    fn lints(&self) -> bool {
        self.enabled && self.enable_security_linting
    }
}

// ── ProjectConfig ────────────────────────────────────────────────────────────

/// Validated options for one generated project.
///
/// Invariants (enforced by [`ProjectConfigBuilder::build`] and
/// [`ProjectConfig::validate`]):
/// - `name` passes project name validation
/// - `package_name` is a Python identifier that is not a keyword
/// - dependency lists contain no duplicates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    name: String,
    project_slug: String,
    package_name: String,
    python_version: PythonVersion,
    project_type: ProjectType,
    container_type: ContainerType,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    dev_dependencies: Vec<String>,
    #[serde(default)]
    local_dependencies: Vec<String>,
    #[serde(default)]
    database: Option<DatabaseType>,
    #[serde(default)]
    use_redis: bool,
    #[serde(default)]
    use_celery: bool,
    #[serde(default)]
    security: SecurityConfig,
}

impl ProjectConfig {
    pub fn builder(name: impl Into<String>) -> ProjectConfigBuilder {
        ProjectConfigBuilder::new(name)
    }

    /// Re-check invariants on a config that did not come from the builder
    /// (e.g. one read back from a project manifest).
    pub fn validate(&self) -> Result<(), DomainError> {
        ProjectValidator::validate_project_name(&self.name)?;
        ProjectValidator::validate_package_name(&self.package_name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_slug(&self) -> &str {
        &self.project_slug
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn python_version(&self) -> &PythonVersion {
        &self.python_version
    }

    pub fn project_type(&self) -> ProjectType {
        self.project_type
    }

    pub fn container_type(&self) -> ContainerType {
        self.container_type
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn dev_dependencies(&self) -> &[String] {
        &self.dev_dependencies
    }

    pub fn local_dependencies(&self) -> &[String] {
        &self.local_dependencies
    }

    pub fn database(&self) -> Option<DatabaseType> {
        self.database
    }

    pub fn use_redis(&self) -> bool {
        self.use_redis
    }

    pub fn use_celery(&self) -> bool {
        self.use_celery
    }

    pub fn security(&self) -> &SecurityConfig {
        &self.security
    }

    /// Build the render context every built-in template understands.
    pub fn to_context(&self) -> RenderContext {
        let mut ruff_select = to_strings(BASE_RUFF_SELECT);
        let mut ruff_ignore = Vec::new();
        if self.security.lints() {
            ruff_select.extend(to_strings(SECURITY_RUFF_SELECT));
            ruff_ignore.extend(to_strings(SECURITY_RUFF_IGNORE));
        }

        RenderContext::new()
            .with("name", self.name.as_str())
            .with("project_slug", self.project_slug.as_str())
            .with("package_name", self.package_name.as_str())
            .with("python_version", self.python_version.to_string())
            .with("python_version_short", self.python_version.short())
            .with("project_type", self.project_type.as_str())
            .with("container_type", self.container_type.as_str())
            .with("use_containers", self.container_type.uses_containers())
            .with("use_database", self.database.is_some())
            .with(
                "database_type",
                self.database.map(|db| db.as_str()).unwrap_or(""),
            )
            .with("use_redis", self.use_redis)
            .with("use_celery", self.use_celery)
            .with("dependencies", self.dependencies.clone())
            .with("dev_dependencies", self.dev_dependencies.clone())
            .with("local_dependencies", self.local_dependencies.clone())
            .with("ruff_select", ruff_select)
            .with("ruff_ignore", ruff_ignore)
    }
}

// ── Builder ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ProjectConfigBuilder {
    name: String,
    python_version: PythonVersion,
    project_type: ProjectType,
    container_type: ContainerType,
    dependencies: Vec<String>,
    dev_dependencies: Vec<String>,
    local_dependencies: Vec<String>,
    database: Option<DatabaseType>,
    use_redis: bool,
    use_celery: bool,
    security: SecurityConfig,
}

impl ProjectConfigBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            python_version: PythonVersion::default(),
            project_type: ProjectType::default(),
            container_type: ContainerType::default(),
            dependencies: Vec::new(),
            dev_dependencies: Vec::new(),
            local_dependencies: Vec::new(),
            database: None,
            use_redis: false,
            use_celery: false,
            security: SecurityConfig::default(),
        }
    }

    pub fn python_version(mut self, version: PythonVersion) -> Self {
        self.python_version = version;
        self
    }

    pub fn project_type(mut self, project_type: ProjectType) -> Self {
        self.project_type = project_type;
        self
    }

    pub fn container_type(mut self, container_type: ContainerType) -> Self {
        self.container_type = container_type;
        self
    }

    pub fn dependencies(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn dev_dependencies(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.dev_dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn local_dependencies(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.local_dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn database(mut self, database: Option<DatabaseType>) -> Self {
        self.database = database;
        self
    }

    pub fn redis(mut self, enabled: bool) -> Self {
        self.use_redis = enabled;
        self
    }

    pub fn celery(mut self, enabled: bool) -> Self {
        self.use_celery = enabled;
        self
    }

    pub fn security(mut self, security: SecurityConfig) -> Self {
        self.security = security;
        self
    }

    pub fn build(self) -> Result<ProjectConfig, DomainError> {
        ProjectValidator::validate_project_name(&self.name)?;

        let project_slug = slugify(&self.name);
        let package_name = project_slug.replace('-', "_");
        ProjectValidator::validate_package_name(&package_name)?;

        let mut runtime = default_dependencies(self.project_type);
        if let Some(database) = self.database {
            if database == DatabaseType::Postgresql {
                runtime.push("psycopg2-binary>=2.9.0");
            }
            runtime.push("sqlalchemy>=2.0.0");
        }
        if self.use_redis {
            runtime.push("redis>=5.0.0");
        }
        if self.use_celery {
            runtime.extend(["celery>=5.3.0", "redis>=5.0.0"]);
        }

        let mut dev = default_dev_dependencies(self.project_type);
        dev.extend(self.security.tool_dependencies());

        Ok(ProjectConfig {
            name: self.name,
            project_slug,
            package_name,
            python_version: self.python_version,
            project_type: self.project_type,
            container_type: self.container_type,
            dependencies: merge_unique(&runtime, self.dependencies),
            dev_dependencies: merge_unique(&dev, self.dev_dependencies),
            local_dependencies: merge_unique(&[], self.local_dependencies),
            database: self.database,
            use_redis: self.use_redis,
            use_celery: self.use_celery,
            security: self.security,
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Lowercase, replace runs outside `[a-z0-9_-]` with `-`, collapse and trim.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().to_lowercase().chars() {
        let keep = c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-';
        let next = if keep { c } else { '-' };
        if next == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(next);
    }

    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        "project".to_string()
    } else {
        trimmed.to_string()
    }
}

fn default_dependencies(project_type: ProjectType) -> Vec<&'static str> {
    match project_type {
        ProjectType::Api => vec!["fastapi>=0.104.0", "uvicorn[standard]>=0.24.0"],
        ProjectType::Web => vec!["flask>=3.0.0", "jinja2>=3.1.0"],
        ProjectType::Cli => vec!["typer[all]>=0.12.0", "rich>=13.0.0"],
        ProjectType::Ml => vec![
            "numpy>=1.24.0",
            "pandas>=2.0.0",
            "scikit-learn>=1.3.0",
            "matplotlib>=3.7.0",
        ],
        ProjectType::Lib => Vec::new(),
    }
}

fn default_dev_dependencies(project_type: ProjectType) -> Vec<&'static str> {
    let mut dev = vec!["pytest>=7.4.0", "pytest-cov>=4.1.0", "ruff>=0.1.0", "mypy>=1.7.0"];
    match project_type {
        ProjectType::Api => dev.extend(["httpx>=0.25.0", "pytest-asyncio>=0.21.0"]),
        ProjectType::Web => dev.push("pytest-flask>=1.3.0"),
        ProjectType::Ml => dev.extend(["jupyter>=1.0.0", "ipykernel>=6.25.0"]),
        ProjectType::Cli | ProjectType::Lib => {}
    }
    dev
}

/// Defaults first, then user entries; first occurrence wins.
fn merge_unique(defaults: &[&str], user: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(defaults.len() + user.len());
    for dep in defaults
        .iter()
        .map(|d| d.to_string())
        .chain(user.into_iter().map(|d| d.trim().to_string()))
    {
        if !dep.is_empty() && !merged.contains(&dep) {
            merged.push(dep);
        }
    }
    merged
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
