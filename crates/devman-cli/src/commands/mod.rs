//! Command handlers plus the wiring they share: building adapters from the
//! configuration, showing a plan and running the write phase.

pub mod completions;
pub mod config;
pub mod demo;
pub mod init;
pub mod list;
pub mod new;
pub mod template;
pub mod update;

use tracing::{debug, info};

use devman_adapters::{
    GitFetcher, HandlebarsRenderer, LocalFilesystem, SecurityOverlay, TemplateRegistry,
};
use devman_core::prelude::*;

use crate::{
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// The registry every command resolves selectors through.
pub(crate) fn template_registry(config: &AppConfig) -> CliResult<TemplateRegistry> {
    let registry = TemplateRegistry::load(
        config.registry_file(),
        Box::new(GitFetcher::new(config.cache_dir())),
    )?
    .with_search_paths(config.search_paths());
    debug!(
        registry = %registry.registry_file().display(),
        search_paths = registry.search_paths().len(),
        "Template registry ready"
    );
    Ok(registry)
}

/// Registry + Handlebars (with security overlay) + local filesystem.
pub(crate) fn scaffold_service(
    config: &AppConfig,
    security: SecurityConfig,
) -> CliResult<ScaffoldService> {
    let renderer = SecurityOverlay::new(HandlebarsRenderer::new(), security);
    Ok(ScaffoldService::new(
        Box::new(template_registry(config)?),
        Box::new(renderer),
        Box::new(LocalFilesystem::new()),
    )
    .with_binary_comparison(config.plan.binary_comparison))
}

/// Snapshot and plan behind a spinner.
pub(crate) fn prepare(
    service: &ScaffoldService,
    request: &GenerationRequest,
    output: &OutputManager,
) -> CliResult<Generation> {
    let spinner = output.spinner(format!("Rendering '{}'...", request.template));
    let generation = service.prepare(request);
    spinner.finish_and_clear();
    Ok(generation?)
}

/// The plan as a table, or the JSON plan export with `--output-format json`.
pub(crate) fn show_plan(generation: &Generation, output: &OutputManager) -> CliResult<()> {
    if output.is_json() {
        return output.json(&generation.plan.report(&generation.snapshot));
    }
    output.plan(&generation.plan)?;
    Ok(())
}

/// Run the write phase and report what happened.
pub(crate) fn write(
    service: &ScaffoldService,
    generation: &Generation,
    output: &OutputManager,
) -> CliResult<WriteReport> {
    let spinner = output.spinner("Writing files...");
    let report = service.apply(generation);
    spinner.finish_and_clear();
    let report = report?;

    info!(
        written = report.written.len(),
        unchanged = report.unchanged.len(),
        conflicts = report.conflicts.len(),
        "Write phase finished"
    );
    output.success(&format!(
        "{} file(s) written, {} unchanged",
        report.written.len(),
        report.unchanged.len()
    ))?;
    Ok(report)
}

/// Every path the template owns, for the project manifest.
pub(crate) fn generated_files(plan: &Plan) -> Vec<String> {
    plan.entries().iter().map(|e| e.path.to_string()).collect()
}

pub(crate) fn conflicts_error(plan: &Plan) -> CliError {
    CliError::Conflicts {
        count: plan.conflicts().len(),
        destination: plan.destination().to_path_buf(),
        paths: plan.conflicts().iter().map(ToString::to_string).collect(),
    }
}

/// Ask for confirmation when attached to a terminal; non-interactive runs
/// proceed.
pub(crate) fn confirm(prompt: &str) -> CliResult<bool> {
    use std::io::IsTerminal;

    if !std::io::stdin().is_terminal() {
        return Ok(true);
    }
    prompt_user(prompt)
}

#[cfg(feature = "interactive")]
fn prompt_user(prompt: &str) -> CliResult<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()
        .map_err(|e| CliError::IoError {
            message: "failed to read confirmation input".into(),
            source: e.into(),
        })
}

#[cfg(not(feature = "interactive"))]
fn prompt_user(prompt: &str) -> CliResult<bool> {
    use std::io::{self, Write};

    print!("{prompt} [Y/n] ");
    io::stdout().flush().map_err(|e| CliError::IoError {
        message: "failed to flush stdout".into(),
        source: e,
    })?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| CliError::IoError {
            message: "failed to read confirmation input".into(),
            source: e,
        })?;

    let input = input.trim().to_ascii_lowercase();
    Ok(input.is_empty() || input == "y" || input == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn plan_with(statuses: &[(&str, PlanStatus)]) -> Plan {
        let entries = statuses
            .iter()
            .map(|(path, status)| {
                PlanEntry::new(RelativePath::try_new(path).unwrap(), *status, 1, "")
            })
            .collect();
        Plan::new(
            "/dest",
            TemplateId::new("devenv", "0.1.0").unwrap(),
            false,
            entries,
        )
    }

    #[test]
    fn conflicts_error_carries_sorted_paths() {
        let plan = plan_with(&[
            ("z.txt", PlanStatus::SkipExists),
            ("a.txt", PlanStatus::Create),
            ("b.txt", PlanStatus::SkipExists),
        ]);
        match conflicts_error(&plan) {
            CliError::Conflicts {
                count,
                destination,
                paths,
            } => {
                assert_eq!(count, 2);
                assert_eq!(destination, PathBuf::from("/dest"));
                assert_eq!(paths, vec!["b.txt", "z.txt"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn generated_files_cover_every_entry() {
        let plan = plan_with(&[
            ("justfile", PlanStatus::SkipIdentical),
            (".envrc", PlanStatus::Create),
        ]);
        assert_eq!(generated_files(&plan), vec![".envrc", "justfile"]);
    }

    #[test]
    fn registry_uses_configured_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.templates.registry_file = Some(tmp.path().join("registry.json"));
        config.templates.cache_dir = Some(tmp.path().join("cache"));
        config.templates.search_paths = vec![tmp.path().join("templates")];

        let registry = template_registry(&config).unwrap();
        assert_eq!(registry.registry_file(), tmp.path().join("registry.json"));
        assert_eq!(registry.search_paths()[0], tmp.path().join("templates"));
        assert_eq!(registry.entries().count(), 0);
    }
}
