//! Implementation of the `devman list` command.

use serde::Serialize;
use tabled::Tabled;

use devman_core::prelude::{ProjectType, TemplateInfo, TemplateService};

use crate::{
    cli::{ListArgs, ListFormat},
    commands,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Origin")]
    origin: String,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Tabled, Serialize)]
struct TypeRow {
    #[tabled(rename = "Type")]
    name: &'static str,
    #[tabled(rename = "Description")]
    description: &'static str,
    #[tabled(rename = "Features")]
    features: &'static str,
}

pub fn execute(args: ListArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    if args.types {
        return list_types(args.format, &output);
    }

    let service = TemplateService::new(Box::new(commands::template_registry(&config)?));
    let templates = service.list()?;

    match args.format {
        ListFormat::Table => {
            output.header("Available templates:")?;
            output.table(templates.into_iter().map(|t| TemplateRow {
                name: t.name,
                origin: t.origin,
                description: t.description,
            }))?;
        }
        // JSON goes to stdout even with --quiet so pipes stay parseable.
        ListFormat::Json => output.json(&templates)?,
        ListFormat::List => {
            for t in &templates {
                println!("{}", t.name);
            }
        }
        ListFormat::Csv => print!("{}", templates_csv(&templates)),
    }

    Ok(())
}

fn list_types(format: ListFormat, output: &OutputManager) -> CliResult<()> {
    let rows: Vec<TypeRow> = ProjectType::ALL
        .iter()
        .map(|t| TypeRow {
            name: t.as_str(),
            description: t.description(),
            features: t.features(),
        })
        .collect();

    match format {
        ListFormat::Table => {
            output.header("Project types:")?;
            output.table(rows)?;
        }
        ListFormat::Json => output.json(&rows)?,
        ListFormat::List => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
        ListFormat::Csv => {
            println!("type,description,features");
            for row in &rows {
                println!(
                    "{},{},{}",
                    row.name,
                    csv_field(row.description),
                    csv_field(row.features)
                );
            }
        }
    }
    Ok(())
}

fn templates_csv(templates: &[TemplateInfo]) -> String {
    let mut out = String::from("name,origin,description\n");
    for t in templates {
        out.push_str(&format!(
            "{},{},{}\n",
            csv_field(&t.name),
            csv_field(&t.origin),
            csv_field(&t.description)
        ));
    }
    out
}

/// Quote a field when it holds a comma, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
