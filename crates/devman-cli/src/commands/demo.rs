//! `devman demo`: plan a project and show it, never writing anything.

use tracing::instrument;

use devman_core::prelude::GenerationRequest;

use crate::{
    cli::DemoArgs,
    commands::{
        self,
        new::{build_project, resolve_destination, template_selector},
    },
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

/// Conflicts are reported in the plan but are not an error here.
#[instrument(skip_all, fields(project = %args.project.name))]
pub fn execute(args: DemoArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let project = build_project(&args.project, &config)?;
    let destination = resolve_destination(&args.project)?;

    let service = commands::scaffold_service(&config, project.security().clone())?;
    let request = GenerationRequest {
        template: template_selector(&args.project, &config),
        destination,
        context: project.to_context(),
        force: args.force,
    };

    let generation = commands::prepare(&service, &request, &output)?;
    commands::show_plan(&generation, &output)?;

    if generation.plan.has_conflicts() {
        output.warning("Some files differ; `devman new --force` would overwrite them")?;
    }
    output.info("Demo only: nothing was written")?;
    Ok(())
}
