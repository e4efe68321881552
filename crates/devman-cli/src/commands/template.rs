//! `devman template`: manage the remote template registry and edited
//! copies of the built-in sets.

use tabled::Tabled;
use tracing::{info, instrument};

use devman_adapters::RemoteTemplate;
use devman_core::prelude::TemplateService;

use crate::{
    cli::TemplateCommands,
    commands,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[derive(Tabled)]
struct RegistryRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Ref")]
    reference: String,
    #[tabled(rename = "Subdirectory")]
    subdirectory: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&RemoteTemplate> for RegistryRow {
    fn from(entry: &RemoteTemplate) -> Self {
        Self {
            name: entry.name.clone(),
            url: entry.url.clone(),
            reference: entry.reference_or_default().to_string(),
            subdirectory: entry.subdirectory.clone().unwrap_or_default(),
            description: entry.description.clone(),
        }
    }
}

#[derive(Tabled)]
struct VariableRow {
    #[tabled(rename = "Variable")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
}

#[instrument(skip_all)]
pub fn execute(cmd: TemplateCommands, config: AppConfig, output: OutputManager) -> CliResult<()> {
    match cmd {
        TemplateCommands::Add {
            name,
            url,
            reference,
            subdirectory,
            description,
            force,
        } => {
            let mut registry = commands::template_registry(&config)?;
            let entry = RemoteTemplate {
                reference,
                subdirectory,
                description,
                ..RemoteTemplate::new(&name, &url)
            };
            registry.add(entry, force)?;
            info!(name = %name, url = %url, "Template registered");
            output.success(&format!("Registered '{name}' -> {url}"))?;
        }

        TemplateCommands::Remove { name } => {
            let mut registry = commands::template_registry(&config)?;
            let removed = registry.remove(&name)?;
            info!(name = %removed.name, "Template removed");
            output.success(&format!("Removed '{}' ({})", removed.name, removed.url))?;
        }

        TemplateCommands::List => {
            let registry = commands::template_registry(&config)?;
            let entries: Vec<&RemoteTemplate> = registry.entries().collect();
            if output.is_json() {
                output.json(&entries)?;
            } else if entries.is_empty() {
                output.info("No templates registered. Add one with `devman template add`")?;
            } else {
                output.header("Registered templates:")?;
                output.table(entries.into_iter().map(RegistryRow::from))?;
            }
        }

        TemplateCommands::Update { name: Some(name) } => {
            let registry = commands::template_registry(&config)?;
            let checkout = registry.update(&name)?;
            output.success(&format!("Updated '{name}' ({})", checkout.display()))?;
        }

        TemplateCommands::Update { name: None } => {
            let registry = commands::template_registry(&config)?;
            let results = registry.update_all();
            if results.is_empty() {
                output.info("No templates registered. Add one with `devman template add`")?;
                return Ok(());
            }

            let mut first_error = None;
            for (name, result) in results {
                match result {
                    Ok(_) => output.success(&format!("Updated '{name}'"))?,
                    Err(e) => {
                        output.warning(&format!("Could not update '{name}': {e}"))?;
                        first_error.get_or_insert(e);
                    }
                }
            }
            if let Some(e) = first_error {
                return Err(e.into());
            }
        }

        TemplateCommands::Export { name, force } => {
            let registry = commands::template_registry(&config)?;
            let dir = registry.export_builtin(&name, force)?;
            info!(name = %name, dir = %dir.display(), "Built-in template exported");
            output.success(&format!("Exported '{name}' to {}", dir.display()))?;
            output.print("Edit the files there; devman uses them in place of the built-in set")?;
        }

        TemplateCommands::Show { selector } => {
            let service = TemplateService::new(Box::new(commands::template_registry(&config)?));
            let set = service.resolve(&selector)?;
            output.header(&format!("{} - {}", set.id, set.description))?;
            output.table(set.variables.iter().map(|v| VariableRow {
                name: v.name.clone(),
                kind: v.kind.to_string(),
            }))?;
            output.print(&format!("{} file(s)", set.files.len()))?;
        }
    }

    Ok(())
}
