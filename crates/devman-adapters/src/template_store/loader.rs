//! Filesystem-based template loader.
//!
//! Reads template sets from directories carrying a `template.toml` manifest.
//!
//! # Directory layout expected
//!
//! ```text
//! templates/
//! ├── fastapi-service/
//! │   ├── template.toml              ← manifest (required)
//! │   ├── pyproject.toml.hbs         ← ".hbs" is stripped, always rendered
//! │   ├── LICENSE                    ← literal (no "{{")
//! │   └── src/
//! │       └── {{package_name}}/
//! │           └── __init__.py
//! └── flask-site/
//!     └── template.toml
//! ```
//!
//! # `template.toml` format
//!
//! ```toml
//! [template]
//! name        = "fastapi-service"
//! version     = "1.0.0"
//! description = "FastAPI service"     # optional
//!
//! # Variables the context must provide, by kind: text | flag | list
//! [variables]
//! name         = "text"
//! use_redis    = "flag"
//! dependencies = "list"
//!
//! # Optional: override per-file handling.
//! # If omitted, text files containing {{ are rendered, others copied.
//! [[files]]
//! path = "LICENSE"
//! type = "literal"                    # literal | template
//!
//! # A body stored under another name; `path` is the output path expression.
//! [[files]]
//! source = "Dockerfile.hbs"
//! path   = '{{#if (eq container_type "docker")}}Dockerfile{{/if}}'
//! type   = "template"
//! ```

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use devman_core::{
    domain::{DomainError, TemplateFile, TemplateId, TemplateSet, VariableKind},
    error::DevmanResult,
};

pub const MANIFEST_FILE: &str = "template.toml";
const TEMPLATE_SUFFIX: &str = ".hbs";

// ── Manifest types ────────────────────────────────────────────────────────────

/// Deserialised representation of a `template.toml` file.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TemplateManifest {
    pub template: TemplateSection,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableKind>,
    /// Explicit per-file overrides, keyed by path relative to the template root.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileEntry>,
}

/// `[template]` section: identity of the template.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TemplateSection {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
}

/// One entry under `[[files]]`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FileEntry {
    /// File under the template root holding the body, when it is not
    /// stored at `path` itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub path: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
}

impl FileEntry {
    fn key(&self) -> String {
        normalize_path(self.source.as_deref().unwrap_or(&self.path))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Copied verbatim.
    Literal,
    /// Rendered through the template engine.
    Template,
}

impl TemplateManifest {
    pub fn parse(raw: &str, origin: &Path) -> Result<Self, DomainError> {
        toml::from_str(raw).map_err(|e| {
            DomainError::InvalidTemplate(format!("failed to parse '{}': {e}", origin.display()))
        })
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Loads [`TemplateSet`]s from the subdirectories of one search path.
///
/// Subdirectories without a valid `template.toml` emit a `WARN` log and are
/// skipped; they do not prevent other templates from loading.
#[derive(Debug, Clone)]
pub struct FilesystemTemplateLoader {
    templates_dir: PathBuf,
}

impl FilesystemTemplateLoader {
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
        }
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Load every valid template under the search path.
    ///
    /// A missing search path yields no templates rather than an error.
    #[instrument(skip(self), fields(dir = %self.templates_dir.display()))]
    pub fn load_all(&self) -> DevmanResult<Vec<TemplateSet>> {
        if !self.templates_dir.is_dir() {
            debug!("search path does not exist");
            return Ok(Vec::new());
        }

        let read_dir = fs::read_dir(&self.templates_dir).map_err(|e| {
            DomainError::InvalidTemplate(format!(
                "failed to read templates directory '{}': {e}",
                self.templates_dir.display()
            ))
        })?;

        let mut templates = Vec::new();
        for entry in read_dir.flatten() {
            let path = entry.path();
            if !path.join(MANIFEST_FILE).is_file() {
                continue;
            }

            match load_dir(&path) {
                Ok(template) => {
                    debug!(id = %template.id, "loaded template");
                    templates.push(template);
                }
                Err(e) => {
                    warn!(
                        dir   = %path.display(),
                        error = %e,
                        "skipping template directory due to load error"
                    );
                }
            }
        }

        templates.sort_by(|a, b| a.id.name().cmp(b.id.name()));
        debug!(count = templates.len(), "finished loading templates");
        Ok(templates)
    }

    /// Find a template by name.
    pub fn find(&self, name: &str) -> DevmanResult<Option<TemplateSet>> {
        Ok(self
            .load_all()?
            .into_iter()
            .find(|template| template.id.name() == name))
    }
}

/// Whether `dir` looks like a template directory.
pub fn is_template_dir(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).is_file()
}

/// Load a single template set from `dir`.
///
/// # Errors
///
/// Returns [`DomainError::InvalidTemplate`] if `template.toml` is missing or
/// malformed, or a file cannot be read.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_dir(dir: &Path) -> DevmanResult<TemplateSet> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let raw = fs::read_to_string(&manifest_path).map_err(|e| {
        DomainError::InvalidTemplate(format!(
            "failed to read '{}': {e}",
            manifest_path.display()
        ))
    })?;
    let manifest = TemplateManifest::parse(&raw, &manifest_path)?;

    let id = TemplateId::new(&manifest.template.name, &manifest.template.version)?;
    let mut template = TemplateSet::new(id, manifest.template.description.clone());
    for (name, kind) in &manifest.variables {
        template = template.with_variable(name.clone(), *kind);
    }

    let overrides: HashMap<String, &FileEntry> =
        manifest.files.iter().map(|f| (f.key(), f)).collect();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in walker {
        let entry =
            entry.map_err(|e| DomainError::InvalidTemplate(format!("directory walk error: {e}")))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry.path().strip_prefix(dir).map_err(|_| {
            DomainError::InvalidTemplate(format!(
                "failed to relativise '{}' against '{}'",
                entry.path().display(),
                dir.display()
            ))
        })?;
        let path = normalize_path(&rel.to_string_lossy());
        if path == MANIFEST_FILE {
            continue;
        }

        let bytes = fs::read(entry.path()).map_err(|e| {
            DomainError::InvalidTemplate(format!("failed to read file '{path}': {e}"))
        })?;
        template.files.push(classify(path, bytes, &overrides));
    }

    debug!(files = template.files.len(), "loaded template directory");
    Ok(template)
}

/// Decide how one file is treated.
///
/// Non-UTF-8 content is always binary. Otherwise a manifest override wins,
/// then the `.hbs` suffix, then `{{` auto-detection. An override with a
/// `source` also renames the file.
fn classify(path: String, bytes: Vec<u8>, overrides: &HashMap<String, &FileEntry>) -> TemplateFile {
    let renamed = overrides
        .get(&path)
        .filter(|entry| entry.source.is_some())
        .map(|entry| normalize_path(&entry.path));

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => return TemplateFile::binary(renamed.unwrap_or(path), e.into_bytes()),
    };

    let (output, forced) = match (renamed, path.strip_suffix(TEMPLATE_SUFFIX)) {
        (Some(output), _) => (output, false),
        (None, Some(stripped)) if !stripped.is_empty() => (stripped.to_string(), true),
        (None, _) => (path.clone(), false),
    };

    let file_type = overrides
        .get(&path)
        .or_else(|| overrides.get(&output))
        .map(|entry| entry.file_type)
        .unwrap_or(if forced || text.contains("{{") {
            FileType::Template
        } else {
            FileType::Literal
        });

    match file_type {
        FileType::Template => TemplateFile::template(output, text),
        FileType::Literal => TemplateFile::literal(output, text),
    }
}

fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use devman_core::domain::TemplateBody;
    use tempfile::TempDir;

    // ── helpers ───────────────────────────────────────────────────────────

    const MANIFEST: &str = r#"
[template]
name = "svc"
version = "1.0.0"
description = "A service"

[variables]
name = "text"
use_redis = "flag"

[[files]]
path = "LICENSE"
type = "literal"
"#;

    fn make_template_dir(
        root: &Path,
        dir: &str,
        manifest: &str,
        files: &[(&str, &[u8])],
    ) -> PathBuf {
        let path = root.join(dir);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(MANIFEST_FILE), manifest).unwrap();
        for (rel, contents) in files {
            let file = path.join(rel);
            fs::create_dir_all(file.parent().unwrap()).unwrap();
            fs::write(file, contents).unwrap();
        }
        path
    }

    fn file<'a>(template: &'a TemplateSet, path: &str) -> &'a TemplateFile {
        template
            .files
            .iter()
            .find(|f| f.path == path)
            .unwrap_or_else(|| panic!("no file {path}"))
    }

    // ── tests ─────────────────────────────────────────────────────────────

    #[test]
    fn loads_manifest_identity_and_variables() {
        let root = TempDir::new().unwrap();
        let dir = make_template_dir(root.path(), "svc", MANIFEST, &[("README.md", b"# {{name}}")]);

        let template = load_dir(&dir).unwrap();
        assert_eq!(template.id.to_string(), "svc@1.0.0");
        assert_eq!(template.description, "A service");
        assert_eq!(template.variables.len(), 2);
        assert!(template.files.iter().all(|f| f.path != MANIFEST_FILE));
    }

    #[test]
    fn classifies_files() {
        let root = TempDir::new().unwrap();
        let dir = make_template_dir(
            root.path(),
            "svc",
            MANIFEST,
            &[
                ("README.md", b"# {{name}}"),
                ("LICENSE", b"{{ not a variable }}"),
                ("plain.txt", b"no braces"),
                ("pyproject.toml.hbs", b"name = \"x\""),
                ("logo.png", &[0x89, 0x50, 0xff, 0xfe]),
                ("src/{{package_name}}/__init__.py", b""),
            ],
        );

        let template = load_dir(&dir).unwrap();
        assert!(file(&template, "README.md").body.is_template());
        assert!(matches!(file(&template, "LICENSE").body, TemplateBody::Literal(_)));
        assert!(matches!(file(&template, "plain.txt").body, TemplateBody::Literal(_)));
        assert!(file(&template, "pyproject.toml").body.is_template());
        assert_eq!(
            file(&template, "logo.png").body,
            TemplateBody::Binary(vec![0x89, 0x50, 0xff, 0xfe])
        );
        assert_eq!(
            file(&template, "src/{{package_name}}/__init__.py").body,
            TemplateBody::Literal(String::new())
        );
    }

    #[test]
    fn source_entries_rename_files() {
        let manifest = format!(
            "{MANIFEST}\n{}",
            r#"[[files]]
source = "docker/Dockerfile.hbs"
path = '{{#if (eq container_type "docker")}}Dockerfile{{/if}}'
type = "template"

[[files]]
source = "raw/notes.txt"
path = "NOTES.md"
type = "literal"
"#
        );
        let root = TempDir::new().unwrap();
        let dir = make_template_dir(
            root.path(),
            "svc",
            &manifest,
            &[
                ("docker/Dockerfile.hbs", b"FROM python:{{python_version}}"),
                ("raw/notes.txt", b"{{ kept as is }}"),
            ],
        );

        let template = load_dir(&dir).unwrap();
        let docker = file(&template, r#"{{#if (eq container_type "docker")}}Dockerfile{{/if}}"#);
        assert!(docker.body.is_template());
        assert_eq!(
            file(&template, "NOTES.md").body,
            TemplateBody::Literal("{{ kept as is }}".into())
        );
        assert!(template.files.iter().all(|f| !f.path.starts_with("docker/")));
    }

    #[test]
    fn git_metadata_is_ignored() {
        let root = TempDir::new().unwrap();
        let dir = make_template_dir(
            root.path(),
            "svc",
            MANIFEST,
            &[(".git/HEAD", b"ref: refs/heads/main"), (".envrc", b"use devenv")],
        );

        let template = load_dir(&dir).unwrap();
        let paths: Vec<_> = template.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec![".envrc"]);
    }

    #[test]
    fn malformed_manifest_is_an_invalid_template() {
        let root = TempDir::new().unwrap();
        let dir = make_template_dir(root.path(), "bad", "[template]\nname = 1", &[]);
        let err = load_dir(&dir).unwrap_err();
        assert_eq!(err.category(), devman_core::error::ErrorCategory::Template);
    }

    #[test]
    fn load_all_skips_invalid_templates() {
        let root = TempDir::new().unwrap();
        make_template_dir(root.path(), "svc", MANIFEST, &[("a.txt", b"a")]);
        make_template_dir(root.path(), "bad", "not toml [", &[]);
        fs::create_dir_all(root.path().join("not-a-template")).unwrap();
        fs::write(root.path().join("stray.txt"), "x").unwrap();

        let loader = FilesystemTemplateLoader::new(root.path());
        let templates = loader.load_all().unwrap();
        assert_eq!(templates.len(), 1);
        assert!(loader.find("svc").unwrap().is_some());
        assert!(loader.find("bad").unwrap().is_none());
    }

    #[test]
    fn missing_search_path_is_empty() {
        let loader = FilesystemTemplateLoader::new("/definitely/not/here");
        assert!(loader.load_all().unwrap().is_empty());
    }
}
