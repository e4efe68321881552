//! Output management and formatting.

use std::io::{self, IsTerminal};
use std::time::Duration;

use clap::ValueEnum;
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use devman_core::prelude::{Plan, PlanStatus};

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// One plan entry for table display.
#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Note")]
    note: String,
}

/// Manages CLI output based on configuration.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags and loaded config.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        // The flag wins over `output.format`; Auto then becomes Human (TTY)
        // or Plain (piped/redirected).
        let requested = match args.output_format {
            OutputFormat::Auto => {
                OutputFormat::from_str(&config.output.format, true).unwrap_or_default()
            }
            explicit => explicit,
        };
        let resolved_format = if requested == OutputFormat::Auto {
            if io::stdout().is_terminal() {
                OutputFormat::Human
            } else {
                OutputFormat::Plain
            }
        } else {
            requested
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color
                || config.output.no_color
                || resolved_format != OutputFormat::Human,
            term: Term::stdout(),
        }
    }

    /// Human-oriented text is dropped when quiet or when stdout carries JSON.
    fn silent(&self) -> bool {
        self.quiet || self.resolved_format == OutputFormat::Json
    }

    // ── Public write methods ───────────────────────────────────────────────

    /// Generic message; suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.silent() {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.silent() {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2713} {msg}") // ✓
        } else {
            format!("{} {}", "\u{2713}".green().bold(), msg.green())
        };
        self.term.write_line(&line)
    }

    /// Error indicator: `✗ <msg>`.  *Not* suppressed in quiet mode, errors
    /// must always be visible.
    pub fn error(&self, msg: &str) -> io::Result<()> {
        let line = if self.no_color {
            format!("\u{2717} {msg}") // ✗
        } else {
            format!("{} {}", "\u{2717}".red().bold(), msg.red())
        };
        self.term.write_line(&line)
    }

    /// Warning indicator: `⚠ <msg>`.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        if self.silent() {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{26a0} {msg}") // ⚠
        } else {
            format!("{} {}", "\u{26a0}".yellow().bold(), msg.yellow())
        };
        self.term.write_line(&line)
    }

    /// Informational indicator: `ℹ <msg>`.
    pub fn info(&self, msg: &str) -> io::Result<()> {
        if self.silent() {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2139} {msg}") // ℹ
        } else {
            format!("{} {}", "\u{2139}".blue().bold(), msg.blue())
        };
        self.term.write_line(&line)
    }

    /// Bold cyan header line.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.silent() {
            return Ok(());
        }
        let line = if self.no_color {
            text.to_owned()
        } else {
            text.cyan().bold().to_string()
        };
        self.term.write_line(&line)
    }

    /// Pretty JSON on stdout, regardless of quiet mode.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> CliResult<()> {
        let json = serde_json::to_string_pretty(value).map_err(|e| CliError::InvalidInput {
            message: format!("cannot encode output as JSON: {e}"),
            source: Some(Box::new(e)),
        })?;
        self.term.write_line(&json)?;
        Ok(())
    }

    /// Any `Tabled` rows as a rounded table.
    pub fn table<T: Tabled>(&self, rows: impl IntoIterator<Item = T>) -> io::Result<()> {
        if self.silent() {
            return Ok(());
        }
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        self.term.write_line(&table.to_string())
    }

    /// The plan as a table followed by a one-line summary.
    pub fn plan(&self, plan: &Plan) -> io::Result<()> {
        if self.silent() {
            return Ok(());
        }
        self.header(&format!(
            "Plan for {} ({})",
            plan.destination().display(),
            plan.template()
        ))?;

        let rows: Vec<PlanRow> = plan
            .entries()
            .iter()
            .map(|e| PlanRow {
                path: e.path.to_string(),
                status: e.status.to_string(),
                size: format_size(e.size),
                note: e.note.clone(),
            })
            .collect();
        self.table(rows)?;
        self.term.write_line(&self.plan_summary(plan))
    }

    fn plan_summary(&self, plan: &Plan) -> String {
        let count = |status: PlanStatus| plan.count(status).to_string();
        if self.no_color {
            format!(
                "{} to create, {} identical, {} to overwrite, {} conflicts",
                count(PlanStatus::Create),
                count(PlanStatus::SkipIdentical),
                count(PlanStatus::Overwrite),
                count(PlanStatus::SkipExists),
            )
        } else {
            format!(
                "{} to create, {} identical, {} to overwrite, {} conflicts",
                count(PlanStatus::Create).green(),
                count(PlanStatus::SkipIdentical).dimmed(),
                count(PlanStatus::Overwrite).yellow(),
                count(PlanStatus::SkipExists).red(),
            )
        }
    }

    /// A ticking spinner on interactive human output, hidden otherwise.
    pub fn spinner(&self, msg: impl Into<String>) -> ProgressBar {
        if self.silent() || self.resolved_format != OutputFormat::Human {
            return ProgressBar::hidden();
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner());
        spinner.set_message(msg.into());
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// `true` if ANSI colours are enabled.
    pub fn supports_color(&self) -> bool {
        !self.no_color
    }

    /// `true` if quiet mode suppresses most output.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// The resolved (non-Auto) output format.
    pub fn format(&self) -> OutputFormat {
        self.resolved_format
    }

    pub fn is_json(&self) -> bool {
        self.resolved_format == OutputFormat::Json
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
