//! Template sets compiled into the binary.
//!
//! Bodies live under `templates/` in this crate and are embedded with
//! `include_str!`, so a built `devman` needs nothing on disk.

use std::{fs, path::Path};

use tracing::{debug, instrument};

use devman_core::{
    application::{ApplicationError, ports::TemplateSource},
    domain::{TemplateFile, TemplateId, TemplateSet, TemplateSummary, VariableKind},
    error::{DevmanError, DevmanResult},
};

use super::loader::{FileEntry, FileType, MANIFEST_FILE, TemplateManifest, TemplateSection};

pub const DEVENV: &str = "devenv";
pub const BUILTIN_ORIGIN: &str = "builtin";

macro_rules! body {
    ($path:literal) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/", $path))
    };
}

const DEVENV_VARIABLES: &[(&str, VariableKind)] = &[
    ("name", VariableKind::Text),
    ("project_slug", VariableKind::Text),
    ("package_name", VariableKind::Text),
    ("python_version", VariableKind::Text),
    ("python_version_short", VariableKind::Text),
    ("project_type", VariableKind::Text),
    ("container_type", VariableKind::Text),
    ("use_containers", VariableKind::Flag),
    ("use_database", VariableKind::Flag),
    ("database_type", VariableKind::Text),
    ("use_redis", VariableKind::Flag),
    ("use_celery", VariableKind::Flag),
    ("dependencies", VariableKind::List),
    ("dev_dependencies", VariableKind::List),
    ("local_dependencies", VariableKind::List),
    ("ruff_select", VariableKind::List),
    ("ruff_ignore", VariableKind::List),
];

/// One compiled-in file: where its body lives under `templates/<set>/`,
/// the output path expression and how it is treated.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinFile {
    pub source: &'static str,
    pub path: &'static str,
    pub file_type: FileType,
    pub body: &'static str,
}

const fn hbs(source: &'static str, path: &'static str, body: &'static str) -> BuiltinFile {
    BuiltinFile {
        source,
        path,
        file_type: FileType::Template,
        body,
    }
}

const DEVENV_FILES: &[BuiltinFile] = &[
    hbs("devenv.nix.hbs", "devenv.nix", body!("devenv/devenv.nix.hbs")),
    hbs("justfile.hbs", "justfile", body!("devenv/justfile.hbs")),
    hbs("pyproject.toml.hbs", "pyproject.toml", body!("devenv/pyproject.toml.hbs")),
    BuiltinFile {
        source: "envrc",
        path: ".envrc",
        file_type: FileType::Literal,
        body: body!("devenv/envrc"),
    },
    hbs(
        "Dockerfile.hbs",
        r#"{{#if (eq container_type "docker")}}Dockerfile{{/if}}"#,
        body!("devenv/Dockerfile.hbs"),
    ),
    hbs(
        "docker-compose.yml.hbs",
        r#"{{#if (eq container_type "docker")}}docker-compose.yml{{/if}}"#,
        body!("devenv/docker-compose.yml.hbs"),
    ),
    hbs(
        "container.nix.hbs",
        r#"{{#if (eq container_type "nixos")}}container.nix{{/if}}"#,
        body!("devenv/container.nix.hbs"),
    ),
    hbs(
        "python/__init__.py.hbs",
        "src/{{package_name}}/__init__.py",
        body!("devenv/python/__init__.py.hbs"),
    ),
    hbs(
        "python/main.py.hbs",
        r#"src/{{package_name}}/{{#if (eq project_type "api")}}main.py{{/if}}"#,
        body!("devenv/python/main.py.hbs"),
    ),
    hbs(
        "python/app.py.hbs",
        r#"src/{{package_name}}/{{#if (eq project_type "web")}}app.py{{/if}}"#,
        body!("devenv/python/app.py.hbs"),
    ),
    hbs(
        "python/cli.py.hbs",
        r#"src/{{package_name}}/{{#if (eq project_type "cli")}}cli.py{{/if}}"#,
        body!("devenv/python/cli.py.hbs"),
    ),
    BuiltinFile {
        source: "python/tests_init.py",
        path: "tests/__init__.py",
        file_type: FileType::Literal,
        body: "",
    },
    hbs(
        "python/test_main.py.hbs",
        "tests/test_main.py",
        body!("devenv/python/test_main.py.hbs"),
    ),
];

/// The `devenv` Python project set: devenv/just/uv tooling, optional
/// container files and a starter package for the chosen project type.
pub fn devenv() -> DevmanResult<TemplateSet> {
    let mut set = TemplateSet::new(
        TemplateId::new(DEVENV, env!("CARGO_PKG_VERSION"))?,
        "Python project with devenv, just and uv",
    );
    for (name, kind) in DEVENV_VARIABLES {
        set = set.with_variable(*name, *kind);
    }
    for file in DEVENV_FILES {
        set = set.with_file(match file.file_type {
            FileType::Template => TemplateFile::template(file.path, file.body),
            FileType::Literal => TemplateFile::literal(file.path, file.body),
        });
    }
    Ok(set)
}

/// Write a built-in set into `dir` as an editable template directory.
///
/// Bodies keep their names under `templates/<set>/`; `template.toml` maps
/// each one to its output path, so loading `dir` yields the same set.
#[instrument(skip_all, fields(name = %name, dir = %dir.display()))]
pub fn export(name: &str, dir: &Path) -> DevmanResult<()> {
    let (set, files) = match name {
        DEVENV => (devenv()?, DEVENV_FILES),
        _ => {
            return Err(ApplicationError::TemplateNotFound {
                selector: name.to_string(),
            }
            .into());
        }
    };

    let manifest = TemplateManifest {
        template: TemplateSection {
            name: set.id.name().to_string(),
            version: set.id.version().to_string(),
            description: set.description.clone(),
        },
        variables: set.variables.iter().map(|v| (v.name.clone(), v.kind)).collect(),
        files: files
            .iter()
            .map(|file| FileEntry {
                source: Some(file.source.to_string()),
                path: file.path.to_string(),
                file_type: file.file_type,
            })
            .collect(),
    };
    let raw = toml::to_string_pretty(&manifest).map_err(|e| DevmanError::Internal {
        message: format!("cannot serialize template manifest: {e}"),
    })?;

    write(&dir.join(MANIFEST_FILE), raw.as_bytes())?;
    for file in files {
        write(&dir.join(file.source), file.body.as_bytes())?;
    }
    debug!(files = files.len(), "Exported built-in template set");
    Ok(())
}

fn write(path: &Path, contents: &[u8]) -> DevmanResult<()> {
    let io_error =
        |e: std::io::Error| DevmanError::from(ApplicationError::filesystem(path, e.to_string()));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, contents).map_err(io_error)
}

/// Source over the compiled-in template sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl BuiltinTemplates {
    pub fn new() -> Self {
        Self
    }

    pub fn names() -> &'static [&'static str] {
        &[DEVENV]
    }

    pub fn get(name: &str) -> DevmanResult<Option<TemplateSet>> {
        match name {
            DEVENV => devenv().map(Some),
            _ => Ok(None),
        }
    }
}

impl TemplateSource for BuiltinTemplates {
    #[instrument(skip(self))]
    fn resolve(&self, selector: &str) -> DevmanResult<TemplateSet> {
        Self::get(selector)?.ok_or_else(|| {
            ApplicationError::TemplateNotFound {
                selector: selector.to_string(),
            }
            .into()
        })
    }

    fn list(&self) -> DevmanResult<Vec<TemplateSummary>> {
        Ok(vec![TemplateSummary {
            name: DEVENV.to_string(),
            description: devenv()?.description,
            origin: BUILTIN_ORIGIN.to_string(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::HandlebarsRenderer;
    use devman_core::application::ports::{RenderedFile, TemplateRenderer};
    use devman_core::domain::{
        ContainerType, DatabaseType, ProjectConfig, ProjectType, SecurityConfig,
    };

    fn render(config: &ProjectConfig) -> Vec<RenderedFile> {
        let set = devenv().unwrap();
        let context = config.to_context();
        set.validate().unwrap();
        set.validate_context(&context).unwrap();
        HandlebarsRenderer::new().render(&set, &context).unwrap()
    }

    fn paths(files: &[RenderedFile]) -> Vec<&str> {
        files.iter().map(|f| f.path.as_str()).collect()
    }

    fn text<'a>(files: &'a [RenderedFile], path: &str) -> &'a str {
        let file = files.iter().find(|f| f.path == path).unwrap();
        std::str::from_utf8(&file.contents).unwrap()
    }

    #[test]
    fn default_api_project_files() {
        let config = ProjectConfig::builder("my-api").build().unwrap();
        let files = render(&config);
        assert_eq!(
            paths(&files),
            vec![
                "devenv.nix",
                "justfile",
                "pyproject.toml",
                ".envrc",
                "src/my_api/__init__.py",
                "src/my_api/main.py",
                "tests/__init__.py",
                "tests/test_main.py",
            ]
        );
        assert!(text(&files, "devenv.nix").contains("containers.my-api"));
        assert!(text(&files, "justfile").contains("uv run fastapi dev src/my_api/main.py"));
    }

    #[test]
    fn docker_cli_project_files() {
        let config = ProjectConfig::builder("tool")
            .project_type(ProjectType::Cli)
            .container_type(ContainerType::Docker)
            .build()
            .unwrap();
        let files = render(&config);
        let paths = paths(&files);
        assert!(paths.contains(&"Dockerfile"));
        assert!(paths.contains(&"docker-compose.yml"));
        assert!(paths.contains(&"src/tool/cli.py"));
        assert!(!paths.contains(&"src/tool/main.py"));
        assert!(!paths.contains(&"container.nix"));
        assert!(text(&files, "pyproject.toml").contains("tool = \"tool.cli:main\""));
    }

    #[test]
    fn nixos_web_project_files() {
        let config = ProjectConfig::builder("site")
            .project_type(ProjectType::Web)
            .container_type(ContainerType::Nixos)
            .build()
            .unwrap();
        let files = render(&config);
        let paths = paths(&files);
        assert!(paths.contains(&"container.nix"));
        assert!(paths.contains(&"src/site/app.py"));
        assert!(!paths.contains(&"Dockerfile"));
        assert!(text(&files, "container.nix").contains("allowedTCPPorts = [ 5000 ]"));
    }

    #[test]
    fn pyproject_lists_dependencies_and_ruff_rules() {
        let config = ProjectConfig::builder("svc")
            .python_version("3.12".parse().unwrap())
            .database(Some(DatabaseType::Postgresql))
            .local_dependencies(["shared-lib"])
            .security(SecurityConfig::disabled())
            .build()
            .unwrap();
        let files = render(&config);
        let pyproject = text(&files, "pyproject.toml");

        assert!(pyproject.contains("    \"fastapi>=0.104.0\",\n"));
        assert!(pyproject.contains("    \"psycopg2-binary>=2.9.0\",\n"));
        assert!(pyproject.contains("requires-python = \">=3.12\""));
        assert!(pyproject.contains("target-version = \"py312\""));
        assert!(pyproject.contains(r#"select = ["E", "F", "I", "N", "W", "UP"]"#));
        assert!(!pyproject.contains("ignore = ["));
        assert!(pyproject.contains("shared-lib = { path = \"../shared-lib\", editable = true }"));
    }

    #[test]
    fn pyproject_parses_as_toml() {
        let config = ProjectConfig::builder("svc").redis(true).build().unwrap();
        let files = render(&config);
        let parsed: toml::Value = toml::from_str(text(&files, "pyproject.toml")).unwrap();
        assert_eq!(parsed["project"]["name"].as_str(), Some("svc"));
        assert_eq!(
            parsed["tool"]["ruff"]["lint"]["ignore"].as_array().map(Vec::len),
            Some(2)
        );
    }

    #[test]
    fn docker_compose_services_follow_options() {
        let config = ProjectConfig::builder("svc")
            .container_type(ContainerType::Docker)
            .database(Some(DatabaseType::Postgresql))
            .redis(true)
            .build()
            .unwrap();
        let files = render(&config);
        let compose: serde_yaml::Value =
            serde_yaml::from_str(text(&files, "docker-compose.yml")).unwrap();
        let services = compose["services"].as_mapping().unwrap();
        assert_eq!(services.len(), 3);
        assert!(compose["volumes"].as_mapping().is_some());
    }

    #[test]
    fn exported_set_loads_back_identically() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join(DEVENV);
        export(DEVENV, &dir).unwrap();

        assert!(dir.join("python/main.py.hbs").is_file());
        assert!(dir.join("envrc").is_file());

        let original = devenv().unwrap();
        let loaded = crate::template_store::loader::load_dir(&dir).unwrap();
        assert_eq!(loaded.id, original.id);
        assert_eq!(loaded.description, original.description);

        let sorted = |mut files: Vec<TemplateFile>| {
            files.sort_by(|a, b| a.path.cmp(&b.path));
            files
        };
        assert_eq!(sorted(loaded.files), sorted(original.files));

        let mut variables = original.variables.clone();
        variables.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(loaded.variables, variables);
    }

    #[test]
    fn export_of_unknown_set_is_not_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = export("nope", tmp.path()).unwrap_err();
        assert_eq!(err.category(), devman_core::error::ErrorCategory::NotFound);
        assert!(!tmp.path().join(MANIFEST_FILE).exists());
    }

    #[test]
    fn source_resolves_and_lists_devenv() {
        let source = BuiltinTemplates::new();
        assert_eq!(source.resolve(DEVENV).unwrap().id.name(), DEVENV);
        assert!(source.resolve("nope").is_err());

        let listed = source.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].origin, BUILTIN_ORIGIN);
    }
}
