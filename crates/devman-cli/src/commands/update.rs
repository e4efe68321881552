//! `devman update`: regenerate a project from its `.devman/devman.toml`.

use tracing::{info, instrument};

use devman_adapters::ProjectManifest;
use devman_core::prelude::GenerationRequest;

use crate::{
    cli::UpdateArgs,
    commands,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Replays the recorded project and template against the directory.
///
/// Identical files are left alone; files that differ are conflicts unless
/// `--force` is given.
#[instrument(skip_all, fields(dir = %args.dir.display()))]
pub fn execute(args: UpdateArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let mut manifest = ProjectManifest::load(&args.dir)
        .with_cli_context(|| format!("loading manifest from {}", args.dir.display()))?;
    info!(
        project = manifest.project.name(),
        template = %manifest.templates.selector,
        "Manifest loaded"
    );

    let service = commands::scaffold_service(&config, manifest.project.security().clone())?;
    let request = GenerationRequest {
        template: manifest.templates.selector.clone(),
        destination: args.dir.clone(),
        context: manifest.project.to_context(),
        force: args.force,
    };

    let generation = commands::prepare(&service, &request, &output)?;
    commands::show_plan(&generation, &output)?;

    if args.dry_run {
        output.info("Dry run: no files were written")?;
        return Ok(());
    }

    let plan = &generation.plan;
    if plan.entries().iter().all(|e| e.status.is_skip()) {
        if plan.has_conflicts() {
            return Err(commands::conflicts_error(plan));
        }
        output.success("Project is up to date")?;
        return Ok(());
    }

    if !args.yes && !args.force && !commands::confirm("Apply these changes?")? {
        return Err(CliError::Cancelled);
    }

    let report = commands::write(&service, &generation, &output)?;
    if !report.written.is_empty() {
        manifest.mark_generated(commands::generated_files(plan));
        manifest
            .save(&args.dir)
            .with_cli_context(|| "saving project manifest")?;
    }

    if !report.conflicts.is_empty() {
        return Err(commands::conflicts_error(plan));
    }
    output.success(&format!("Updated {}", args.dir.display()))?;
    Ok(())
}
