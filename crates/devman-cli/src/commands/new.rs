//! Implementation of the `devman new` command.
//!
//! Responsibility: translate CLI arguments into a `ProjectConfig`, let the
//! core service plan the generation, show the plan and write it. No
//! business logic lives here.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info, instrument};

use devman_adapters::ProjectManifest;
use devman_core::{domain::DomainError, error::DevmanError, prelude::*};

use crate::{
    cli::{ContainerKind, DatabaseKind, NewArgs, ProjectArgs, ProjectKind, global::GlobalArgs},
    commands,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute the `devman new` command.
///
/// Dispatch sequence:
/// 1. Validate the project name and resolve the destination
/// 2. Build the project configuration from flags and config defaults
/// 3. Snapshot the template and plan against the destination
/// 4. Show the plan; stop here on `--dry-run`
/// 5. Write, record `.devman/devman.toml` and print next steps
/// 6. Fail with exit code 1 if files were left as conflicts
#[instrument(skip_all, fields(project = %args.project.name))]
pub fn execute(
    args: NewArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let project = build_project(&args.project, &config)?;
    let destination = resolve_destination(&args.project)?;
    let selector = template_selector(&args.project, &config);

    debug!(
        project_type = %project.project_type(),
        container_type = %project.container_type(),
        python = %project.python_version(),
        template = %selector,
        destination = %destination.display(),
        "Project resolved"
    );

    let service = commands::scaffold_service(&config, project.security().clone())?;
    let request = GenerationRequest {
        template: selector.clone(),
        destination: destination.clone(),
        context: project.to_context(),
        force: args.force,
    };

    let generation = commands::prepare(&service, &request, &output)?;
    commands::show_plan(&generation, &output)?;

    if args.dry_run {
        output.info("Dry run: no files were written")?;
        return Ok(());
    }

    output.header(&format!("Creating '{}'...", project.name()))?;
    info!(destination = %destination.display(), "Generation started");
    let report = commands::write(&service, &generation, &output)?;

    let manifest_path = record_manifest(project, &selector, &destination, &generation.plan)?;
    debug!(manifest = %manifest_path.display(), "Manifest saved");

    if !report.conflicts.is_empty() {
        return Err(commands::conflicts_error(&generation.plan));
    }

    output.success(&format!("Project ready at {}", destination.display()))?;
    if !global.quiet {
        print_next_steps(&destination, &generation.plan, &output)?;
    }

    Ok(())
}

/// Write `.devman/devman.toml`, keeping the creation time of an earlier run.
fn record_manifest(
    project: ProjectConfig,
    selector: &str,
    destination: &Path,
    plan: &Plan,
) -> CliResult<PathBuf> {
    let mut manifest = ProjectManifest::new(project, selector);
    if let Ok(previous) = ProjectManifest::load(destination) {
        manifest.devman.created_at = previous.devman.created_at;
    }
    manifest.mark_generated(commands::generated_files(plan));
    Ok(manifest.save(destination)?)
}

fn print_next_steps(destination: &Path, plan: &Plan, output: &OutputManager) -> CliResult<()> {
    output.print("")?;
    output.print("Next steps:")?;
    output.print(&format!("  cd {}", destination.display()))?;

    let owns = |path: &str| plan.entries().iter().any(|e| e.path.as_str() == path);
    if owns("devenv.nix") {
        output.print("  devenv shell")?;
    }
    if owns("justfile") {
        output.print("  just --list")?;
    }
    if owns("docker-compose.yml") {
        output.print("  docker compose up --build")?;
    }
    Ok(())
}

// ── Project construction (shared with `demo`) ─────────────────────────────────

/// Flags override config defaults. A bad flag is a user error; a bad
/// default is a configuration error.
pub(crate) fn build_project(args: &ProjectArgs, config: &AppConfig) -> CliResult<ProjectConfig> {
    validate_project_name(&args.name)?;

    let python_version = match &args.python {
        Some(version) => PythonVersion::from_str(version).map_err(core)?,
        None => config_default(&config.defaults.python_version, "defaults.python_version")?,
    };
    let project_type = match args.kind {
        Some(kind) => convert_kind(kind),
        None => config_default(&config.defaults.project_type, "defaults.project_type")?,
    };
    let container_type = match args.containers {
        Some(kind) => convert_containers(kind),
        None => config_default(&config.defaults.container_type, "defaults.container_type")?,
    };
    let security = if args.no_security {
        SecurityConfig::disabled()
    } else {
        config.security.clone()
    };

    ProjectConfig::builder(&args.name)
        .python_version(python_version)
        .project_type(project_type)
        .container_type(container_type)
        .database(args.database.map(convert_database))
        .redis(args.redis)
        .celery(args.celery)
        .dependencies(args.deps.iter().cloned())
        .dev_dependencies(args.dev_deps.iter().cloned())
        .local_dependencies(args.local_deps.iter().cloned())
        .security(security)
        .build()
        .map_err(core)
}

/// `--dir`, otherwise `./NAME`.
pub(crate) fn resolve_destination(args: &ProjectArgs) -> CliResult<PathBuf> {
    let destination = args
        .dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(".").join(&args.name));

    if destination.is_file() {
        return Err(CliError::InvalidInput {
            message: format!("'{}' is a file, not a directory", destination.display()),
            source: None,
        });
    }
    Ok(destination)
}

pub(crate) fn template_selector(args: &ProjectArgs, config: &AppConfig) -> String {
    args.template
        .clone()
        .unwrap_or_else(|| config.defaults.template.clone())
}

fn validate_project_name(name: &str) -> CliResult<()> {
    if name.is_empty() {
        return Err(CliError::InvalidProjectName {
            name: name.into(),
            reason: "name cannot be empty".into(),
        });
    }
    if name.starts_with('.') {
        return Err(CliError::InvalidProjectName {
            name: name.into(),
            reason: "name cannot start with '.'".into(),
        });
    }
    if name.contains('/') || name.contains('\\') {
        return Err(CliError::InvalidProjectName {
            name: name.into(),
            reason: "name cannot contain path separators".into(),
        });
    }
    Ok(())
}

fn core(err: DomainError) -> CliError {
    CliError::Core(DevmanError::from(err))
}

fn config_default<T>(value: &str, key: &str) -> CliResult<T>
where
    T: FromStr<Err = DomainError>,
{
    value.parse().map_err(|e: DomainError| CliError::ConfigError {
        message: format!("{key}: {e}"),
        source: Some(Box::new(e)),
    })
}

// ── Type conversions CLI → core ───────────────────────────────────────────────

fn convert_kind(kind: ProjectKind) -> ProjectType {
    match kind {
        ProjectKind::Api => ProjectType::Api,
        ProjectKind::Web => ProjectType::Web,
        ProjectKind::Cli => ProjectType::Cli,
        ProjectKind::Ml => ProjectType::Ml,
        ProjectKind::Lib => ProjectType::Lib,
    }
}

fn convert_containers(kind: ContainerKind) -> ContainerType {
    match kind {
        ContainerKind::Devenv => ContainerType::Devenv,
        ContainerKind::Docker => ContainerType::Docker,
        ContainerKind::Nixos => ContainerType::Nixos,
        ContainerKind::None => ContainerType::None,
    }
}

fn convert_database(kind: DatabaseKind) -> DatabaseType {
    match kind {
        DatabaseKind::Postgresql => DatabaseType::Postgresql,
        DatabaseKind::Sqlite => DatabaseType::Sqlite,
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn args(name: &str) -> ProjectArgs {
        ProjectArgs {
            name: name.into(),
            kind: None,
            python: None,
            containers: None,
            database: None,
            redis: false,
            celery: false,
            deps: vec![],
            dev_deps: vec![],
            local_deps: vec![],
            dir: None,
            template: None,
            no_security: false,
        }
    }

    #[test]
    fn defaults_come_from_config() {
        let project = build_project(&args("my-api"), &AppConfig::default()).unwrap();
        assert_eq!(project.project_type(), ProjectType::Api);
        assert_eq!(project.container_type(), ContainerType::Devenv);
        assert_eq!(project.python_version().to_string(), "3.11");
        assert!(project.security().enabled);
    }

    #[test]
    fn flags_override_config() {
        let mut a = args("tool");
        a.kind = Some(ProjectKind::Cli);
        a.python = Some("3.12".into());
        a.containers = Some(ContainerKind::None);
        a.database = Some(DatabaseKind::Sqlite);
        a.no_security = true;

        let project = build_project(&a, &AppConfig::default()).unwrap();
        assert_eq!(project.project_type(), ProjectType::Cli);
        assert_eq!(project.container_type(), ContainerType::None);
        assert_eq!(project.python_version().to_string(), "3.12");
        assert_eq!(project.database(), Some(DatabaseType::Sqlite));
        assert!(!project.security().enabled);
    }

    #[test]
    fn bad_python_flag_is_user_error() {
        let mut a = args("my-api");
        a.python = Some("2.7".into());
        let err = build_project(&a, &AppConfig::default()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::UserError);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn bad_config_default_is_configuration_error() {
        let mut config = AppConfig::default();
        config.defaults.project_type = "desktop".into();
        let err = build_project(&args("my-api"), &config).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn names_with_separators_are_rejected() {
        assert!(validate_project_name("a/b").is_err());
        assert!(validate_project_name(".hidden").is_err());
        assert!(validate_project_name("").is_err());
        assert!(validate_project_name("my-api").is_ok());
    }

    #[test]
    fn destination_defaults_to_name() {
        assert_eq!(
            resolve_destination(&args("svc")).unwrap(),
            PathBuf::from("./svc")
        );

        let mut a = args("svc");
        a.dir = Some(PathBuf::from("/tmp/elsewhere"));
        assert_eq!(
            resolve_destination(&a).unwrap(),
            PathBuf::from("/tmp/elsewhere")
        );
    }

    #[test]
    fn selector_falls_back_to_default_template() {
        let config = AppConfig::default();
        assert_eq!(template_selector(&args("x"), &config), "devenv");

        let mut a = args("x");
        a.template = Some("gh:org/repo".into());
        assert_eq!(template_selector(&a, &config), "gh:org/repo");
    }
}
