//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "devman",
    bin_name = "devman",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{26a1} Plan-first scaffolding for Python devenv projects",
    long_about = "devman renders a template set in memory, compares it with the \
                  destination and shows the plan before anything is written.",
    after_help = "EXAMPLES:\n\
        \x20 devman new my-api --type api --containers docker --database postgresql\n\
        \x20 devman demo my-cli --type cli --output-format json\n\
        \x20 devman update --dir ./my-api\n\
        \x20 devman completions bash > /usr/share/bash-completion/completions/devman",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new project from a template.
    #[command(
        visible_alias = "n",
        about = "Create a new project",
        after_help = "EXAMPLES:\n\
            \x20 devman new my-api\n\
            \x20 devman new my-cli --type cli --python 3.12 --containers none\n\
            \x20 devman new svc --deps httpx --deps pydantic --dir ./services/svc\n\
            \x20 devman new my-api --template gh:org/python-template --dry-run"
    )]
    New(NewArgs),

    /// Show what `new` would do without writing anything.
    #[command(
        about = "Preview the generation plan",
        after_help = "EXAMPLES:\n\
            \x20 devman demo my-api\n\
            \x20 devman demo my-api --dir ./existing --output-format json"
    )]
    Demo(DemoArgs),

    /// Regenerate a project from its `.devman/devman.toml`.
    #[command(
        about = "Update an existing project",
        after_help = "EXAMPLES:\n\
            \x20 devman update\n\
            \x20 devman update --dir ./my-api --dry-run\n\
            \x20 devman update --force --yes"
    )]
    Update(UpdateArgs),

    /// List available templates.
    #[command(
        visible_alias = "ls",
        about = "List available templates",
        after_help = "EXAMPLES:\n\
            \x20 devman list\n\
            \x20 devman list --format json\n\
            \x20 devman list --types"
    )]
    List(ListArgs),

    /// Manage the remote template registry.
    #[command(
        about = "Manage registered templates",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 devman template add fastapi https://github.com/org/fastapi-template.git\n\
            \x20 devman template add ml git@github.com:org/templates.git --subdirectory ml\n\
            \x20 devman template show devenv\n\
            \x20 devman template remove fastapi"
    )]
    Template(TemplateCommands),

    /// Initialise a devman configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 devman init\n\
            \x20 devman init --force\n\
            \x20 devman --config ./devman.toml init"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 devman completions bash > ~/.local/share/bash-completion/completions/devman\n\
            \x20 devman completions zsh  > ~/.zfunc/_devman\n\
            \x20 devman completions fish > ~/.config/fish/completions/devman.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the devman configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 devman config get defaults.python_version\n\
            \x20 devman config list\n\
            \x20 devman config path"
    )]
    Config(ConfigCommands),
}

// ── project options (new / demo) ──────────────────────────────────────────────

/// Options describing the project to generate.
#[derive(Debug, Clone, Args)]
pub struct ProjectArgs {
    /// Project name.
    #[arg(value_name = "NAME", help = "Project name")]
    pub name: String,

    /// Project type (defaults to `defaults.project_type`).
    #[arg(short = 't', long = "type", value_name = "TYPE", value_enum)]
    pub kind: Option<ProjectKind>,

    /// Python version, e.g. 3.12 (defaults to `defaults.python_version`).
    #[arg(short = 'p', long = "python", value_name = "VERSION")]
    pub python: Option<String>,

    /// Container strategy (defaults to `defaults.container_type`).
    #[arg(long = "containers", value_name = "KIND", value_enum)]
    pub containers: Option<ContainerKind>,

    /// Add a database.
    #[arg(short = 'd', long = "database", value_name = "DB", value_enum)]
    pub database: Option<DatabaseKind>,

    /// Add Redis.
    #[arg(long = "redis")]
    pub redis: bool,

    /// Add Celery (implies Redis as the broker).
    #[arg(long = "celery")]
    pub celery: bool,

    /// Extra runtime dependencies.
    #[arg(long = "deps", value_name = "SPEC", value_delimiter = ',')]
    pub deps: Vec<String>,

    /// Extra development dependencies.
    #[arg(long = "dev-deps", value_name = "SPEC", value_delimiter = ',')]
    pub dev_deps: Vec<String>,

    /// Local path dependencies, wired through `[tool.uv.sources]`.
    #[arg(long = "local-deps", value_name = "NAME", value_delimiter = ',')]
    pub local_deps: Vec<String>,

    /// Target directory (default: `./NAME`).
    #[arg(short = 'D', long = "dir", value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Template selector: builtin name, registered name, `gh:org/repo`,
    /// git URL or local directory.
    #[arg(long = "template", value_name = "SELECTOR")]
    pub template: Option<String>,

    /// Skip the security tooling overlay.
    #[arg(long = "no-security")]
    pub no_security: bool,
}

// ── new ───────────────────────────────────────────────────────────────────────

/// Arguments for `devman new`.
#[derive(Debug, Args)]
pub struct NewArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Overwrite files that differ from the template.
    #[arg(short = 'f', long = "force", help = "Overwrite conflicting files")]
    pub force: bool,

    /// Preview the plan without writing any files.
    #[arg(long = "dry-run", help = "Show the plan without writing")]
    pub dry_run: bool,
}

// ── demo ──────────────────────────────────────────────────────────────────────

/// Arguments for `devman demo`.
#[derive(Debug, Args)]
pub struct DemoArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Plan as if `--force` were given.
    #[arg(short = 'f', long = "force", help = "Plan with overwrites enabled")]
    pub force: bool,
}

// ── update ────────────────────────────────────────────────────────────────────

/// Arguments for `devman update`.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Project directory containing `.devman/devman.toml`.
    #[arg(short = 'D', long = "dir", value_name = "PATH", default_value = ".")]
    pub dir: PathBuf,

    /// Overwrite files that differ from the template.
    #[arg(short = 'f', long = "force", help = "Overwrite conflicting files")]
    pub force: bool,

    /// Preview the plan without writing any files.
    #[arg(long = "dry-run", help = "Show the plan without writing")]
    pub dry_run: bool,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long = "yes", help = "Do not ask for confirmation")]
    pub yes: bool,
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `devman list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// List project types instead of template sets.
    #[arg(long = "types", help = "Show project types")]
    pub types: bool,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One name per line.
    List,
    /// JSON array.
    Json,
    /// CSV rows.
    Csv,
}

// ── template subcommands ──────────────────────────────────────────────────────

/// Subcommands for `devman template`.
#[derive(Debug, Subcommand)]
pub enum TemplateCommands {
    /// Register a remote template repository.
    Add {
        /// Name to register the template under.
        name: String,
        /// Git URL (`https://`, `git@github.com:`, `git@gitlab.com:`, `git+...`).
        url: String,
        /// Branch or tag to check out (default: main).
        #[arg(long = "ref", value_name = "REF")]
        reference: Option<String>,
        /// Template directory inside the repository.
        #[arg(long = "subdirectory", value_name = "DIR")]
        subdirectory: Option<String>,
        /// One-line description shown by `devman list`.
        #[arg(long = "description", default_value = "")]
        description: String,
        /// Replace an existing entry with the same name.
        #[arg(short = 'f', long = "force")]
        force: bool,
    },
    /// Unregister a template and drop its cached checkout.
    Remove {
        /// Registered name.
        name: String,
    },
    /// List registered templates.
    List,
    /// Pull the latest version of registered templates into the cache.
    Update {
        /// Registered name; all registered templates when omitted.
        name: Option<String>,
    },
    /// Copy a built-in template set into the templates directory for editing.
    ///
    /// The copy is used instead of the built-in set from then on.
    Export {
        /// Built-in set to copy.
        #[arg(default_value = "devenv")]
        name: String,
        /// Replace an existing copy.
        #[arg(short = 'f', long = "force")]
        force: bool,
    },
    /// Show the variables a template declares.
    Show {
        /// Template selector.
        selector: String,
    },
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `devman init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `devman completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `devman config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `defaults.python_version`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── value enums ───────────────────────────────────────────────────────────────

/// Project types accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum ProjectKind {
    Api,
    Web,
    Cli,
    Ml,
    #[value(alias = "library")]
    Lib,
}

impl std::fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api => write!(f, "api"),
            Self::Web => write!(f, "web"),
            Self::Cli => write!(f, "cli"),
            Self::Ml => write!(f, "ml"),
            Self::Lib => write!(f, "lib"),
        }
    }
}

/// Container strategies accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum ContainerKind {
    Devenv,
    Docker,
    #[value(alias = "nix")]
    Nixos,
    None,
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Devenv => write!(f, "devenv"),
            Self::Docker => write!(f, "docker"),
            Self::Nixos => write!(f, "nixos"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Databases accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum DatabaseKind {
    #[value(alias = "postgres", alias = "pg")]
    Postgresql,
    Sqlite,
}

impl std::fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgresql => write!(f, "postgresql"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
