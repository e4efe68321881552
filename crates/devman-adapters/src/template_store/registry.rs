//! Template selector resolution and the remote template registry.
//!
//! A selector is resolved in this order, first match wins:
//!
//! 1. a built-in template set name (`devenv`), preferring an edited copy
//!    under a search path (see [`TemplateRegistry::export_builtin`])
//! 2. `gh:org/repo`, fetched from `https://github.com/org/repo.git`
//! 3. a git URL (`git+…`, `https://…`, `git@github.com:…`, `git@gitlab.com:…`)
//! 4. a name registered with `devman template add`
//! 5. a template directory under one of the configured search paths
//! 6. an existing local directory
//!
//! Registered entries persist as pretty JSON in `registry.json`:
//!
//! ```json
//! {
//!   "fastapi": {
//!     "name": "fastapi",
//!     "url": "https://github.com/org/templates.git",
//!     "ref": "v2",
//!     "subdirectory": "fastapi",
//!     "description": "FastAPI service"
//!   }
//! }
//! ```

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use devman_core::{
    application::{ApplicationError, ports::TemplateSource},
    domain::{TemplateSet, TemplateSummary},
    error::{DevmanError, DevmanResult},
};

use super::{
    builtin::{self, BuiltinTemplates},
    git::{DEFAULT_REF, TemplateFetcher},
    loader::{self, FilesystemTemplateLoader},
};

pub const REGISTRY_FILE: &str = "registry.json";
pub const REGISTRY_ORIGIN: &str = "registry";

const GITHUB_SHORTHAND: &str = "gh:";
const GIT_URL_PREFIXES: &[&str] = &["git+", "https://", "git@github.com:", "git@gitlab.com:"];

/// Whether `s` is a URL the fetcher can clone.
pub fn is_git_url(s: &str) -> bool {
    GIT_URL_PREFIXES.iter().any(|prefix| s.starts_with(prefix))
}

/// Expand `gh:org/repo` to its GitHub clone URL.
pub fn expand_github_shorthand(selector: &str) -> Option<String> {
    selector
        .strip_prefix(GITHUB_SHORTHAND)
        .filter(|repo| !repo.is_empty())
        .map(|repo| format!("https://github.com/{repo}.git"))
}

// ── Entries ───────────────────────────────────────────────────────────────────

/// One registered remote template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTemplate {
    pub name: String,
    pub url: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdirectory: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl RemoteTemplate {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            reference: None,
            subdirectory: None,
            description: String::new(),
        }
    }

    /// The ref to check out, `main` when unset.
    pub fn reference_or_default(&self) -> &str {
        self.reference.as_deref().unwrap_or(DEFAULT_REF)
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Resolves template selectors and manages registered remote templates.
///
/// Constructed once by the caller and passed by reference; there is no
/// process-wide registry.
pub struct TemplateRegistry {
    fetcher: Box<dyn TemplateFetcher>,
    registry_file: PathBuf,
    search_paths: Vec<PathBuf>,
    entries: BTreeMap<String, RemoteTemplate>,
}

impl TemplateRegistry {
    /// Load registered entries from `registry_file`. A missing file is an
    /// empty registry; a malformed one is a configuration error.
    #[instrument(skip_all, fields(file = %registry_file.as_ref().display()))]
    pub fn load(
        registry_file: impl AsRef<Path>,
        fetcher: Box<dyn TemplateFetcher>,
    ) -> DevmanResult<Self> {
        let registry_file = registry_file.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&registry_file) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                DevmanError::configuration(format!(
                    "malformed template registry '{}': {e}",
                    registry_file.display()
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(ApplicationError::filesystem(&registry_file, e.to_string()).into());
            }
        };
        debug!(count = entries.len(), "Loaded template registry");

        Ok(Self {
            fetcher,
            registry_file,
            search_paths: Vec::new(),
            entries,
        })
    }

    pub fn with_search_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.search_paths = paths.into_iter().collect();
        self
    }

    pub fn registry_file(&self) -> &Path {
        &self.registry_file
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Registered entries, sorted by name.
    pub fn entries(&self) -> impl Iterator<Item = &RemoteTemplate> {
        self.entries.values()
    }

    pub fn get(&self, name: &str) -> Option<&RemoteTemplate> {
        self.entries.get(name)
    }

    /// Register a remote template and persist the registry.
    pub fn add(&mut self, entry: RemoteTemplate, force: bool) -> DevmanResult<()> {
        if entry.name.trim().is_empty() {
            return Err(DevmanError::configuration("template name must not be empty"));
        }
        if !is_git_url(&entry.url) {
            return Err(DevmanError::configuration(format!(
                "invalid git URL '{}' (expected one of: {})",
                entry.url,
                GIT_URL_PREFIXES.join(", ")
            )));
        }
        if self.entries.contains_key(&entry.name) && !force {
            return Err(DevmanError::configuration(format!(
                "template '{}' already exists, use --force to overwrite",
                entry.name
            )));
        }

        info!(name = %entry.name, url = %entry.url, "Registering template");
        self.entries.insert(entry.name.clone(), entry);
        self.save()
    }

    /// Unregister a template, clear its cached checkout and persist.
    pub fn remove(&mut self, name: &str) -> DevmanResult<RemoteTemplate> {
        let entry = self.entries.remove(name).ok_or_else(|| {
            DevmanError::configuration(format!("template '{name}' not found in registry"))
        })?;

        self.fetcher
            .evict(&entry.url, entry.reference.as_deref())?;
        self.save()?;
        info!(name, "Removed template from registry");
        Ok(entry)
    }

    /// Refresh the cached checkout of a registered template.
    #[instrument(skip(self))]
    pub fn update(&self, name: &str) -> DevmanResult<PathBuf> {
        let entry = self.entries.get(name).ok_or_else(|| {
            DevmanError::configuration(format!("template '{name}' not found in registry"))
        })?;
        let checkout = self.fetcher.refresh(&entry.url, entry.reference.as_deref())?;
        info!(name, "Template updated");
        Ok(checkout)
    }

    /// Refresh every registered template, one result per entry in name
    /// order. A failure does not stop the others.
    pub fn update_all(&self) -> Vec<(String, DevmanResult<PathBuf>)> {
        self.entries
            .keys()
            .map(|name| (name.clone(), self.update(name)))
            .collect()
    }

    /// Copy a built-in set into the first search path so it can be edited.
    /// From then on the copy is used in place of the compiled-in set.
    #[instrument(skip(self))]
    pub fn export_builtin(&self, name: &str, force: bool) -> DevmanResult<PathBuf> {
        if !BuiltinTemplates::names().contains(&name) {
            return Err(ApplicationError::TemplateNotFound {
                selector: name.to_string(),
            }
            .into());
        }
        let root = self.search_paths.first().ok_or_else(|| {
            DevmanError::configuration("no template search path is configured")
        })?;

        let dir = root.join(name);
        if dir.exists() {
            if !force {
                return Err(DevmanError::configuration(format!(
                    "'{}' already exists, use --force to overwrite",
                    dir.display()
                )));
            }
            fs::remove_dir_all(&dir).map_err(|e| {
                DevmanError::from(ApplicationError::filesystem(&dir, e.to_string()))
            })?;
        }

        builtin::export(name, &dir)?;
        info!(name, dir = %dir.display(), "Exported built-in template set");
        Ok(dir)
    }

    /// An edited copy of a built-in set under one of the search paths.
    fn builtin_copy(&self, name: &str) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .map(|search_path| search_path.join(name))
            .find(|dir| loader::is_template_dir(dir))
    }

    pub fn save(&self) -> DevmanResult<()> {
        if let Some(parent) = self.registry_file.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DevmanError::from(ApplicationError::filesystem(parent, e.to_string()))
            })?;
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| DevmanError::Internal {
                message: format!("cannot serialize template registry: {e}"),
            })?;
        fs::write(&self.registry_file, json).map_err(|e| {
            DevmanError::from(ApplicationError::filesystem(&self.registry_file, e.to_string()))
        })
    }

    fn fetch_dir(
        &self,
        url: &str,
        reference: Option<&str>,
        subdirectory: Option<&str>,
    ) -> DevmanResult<PathBuf> {
        let checkout = self.fetcher.fetch(url, reference)?;
        match subdirectory {
            Some(sub) => {
                let dir = checkout.join(sub);
                if dir.is_dir() {
                    Ok(dir)
                } else {
                    Err(ApplicationError::TemplateNotFound {
                        selector: format!("{url} (subdirectory '{sub}' not found)"),
                    }
                    .into())
                }
            }
            None => Ok(checkout),
        }
    }

    /// Where `selector` lives on disk, or `None` for built-in sets.
    #[instrument(skip(self))]
    pub fn locate(&self, selector: &str) -> DevmanResult<Option<PathBuf>> {
        if BuiltinTemplates::names().contains(&selector) {
            return Ok(self.builtin_copy(selector));
        }

        if let Some(url) = expand_github_shorthand(selector) {
            return self.fetch_dir(&url, None, None).map(Some);
        }
        if is_git_url(selector) {
            return self.fetch_dir(selector, None, None).map(Some);
        }
        if let Some(entry) = self.entries.get(selector) {
            return self
                .fetch_dir(
                    &entry.url,
                    entry.reference.as_deref(),
                    entry.subdirectory.as_deref(),
                )
                .map(Some);
        }

        for search_path in &self.search_paths {
            let candidate = search_path.join(selector);
            if loader::is_template_dir(&candidate) {
                return Ok(Some(candidate));
            }
        }

        let local = Path::new(selector);
        if local.is_dir() {
            return Ok(Some(local.to_path_buf()));
        }

        Err(ApplicationError::TemplateNotFound {
            selector: selector.to_string(),
        }
        .into())
    }
}

impl TemplateSource for TemplateRegistry {
    fn resolve(&self, selector: &str) -> DevmanResult<TemplateSet> {
        match self.locate(selector)? {
            None => BuiltinTemplates.resolve(selector),
            Some(dir) => {
                debug!(dir = %dir.display(), "Loading template directory");
                loader::load_dir(&dir)
            }
        }
    }

    fn list(&self) -> DevmanResult<Vec<TemplateSummary>> {
        let mut summaries = BuiltinTemplates.list()?;

        summaries.extend(self.entries.values().map(|entry| TemplateSummary {
            name: entry.name.clone(),
            description: entry.description.clone(),
            origin: REGISTRY_ORIGIN.to_string(),
        }));

        for search_path in &self.search_paths {
            let loader = FilesystemTemplateLoader::new(search_path);
            for template in loader.load_all()? {
                summaries.push(TemplateSummary {
                    name: template.id.name().to_string(),
                    description: template.description,
                    origin: search_path.display().to_string(),
                });
            }
        }

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Fetcher serving pre-made checkouts and recording calls.
    #[derive(Clone, Default)]
    struct FakeFetcher {
        checkouts: BTreeMap<String, PathBuf>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl TemplateFetcher for FakeFetcher {
        fn fetch(&self, url: &str, reference: Option<&str>) -> DevmanResult<PathBuf> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("fetch {url}#{}", reference.unwrap_or(DEFAULT_REF)));
            self.checkouts.get(url).cloned().ok_or_else(|| {
                ApplicationError::TemplateNotFound {
                    selector: url.to_string(),
                }
                .into()
            })
        }

        fn evict(&self, url: &str, _: Option<&str>) -> DevmanResult<()> {
            self.calls.lock().unwrap().push(format!("evict {url}"));
            Ok(())
        }

        fn refresh(&self, url: &str, reference: Option<&str>) -> DevmanResult<PathBuf> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("refresh {url}#{}", reference.unwrap_or(DEFAULT_REF)));
            self.checkouts.get(url).cloned().ok_or_else(|| {
                ApplicationError::TemplateNotFound {
                    selector: url.to_string(),
                }
                .into()
            })
        }
    }

    fn write_template(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join("template.toml"),
            format!("[template]\nname = \"{name}\"\nversion = \"0.1.0\"\ndescription = \"{name} template\"\n"),
        )
        .unwrap();
        fs::write(dir.join("README.md"), "# {{name}}").unwrap();
    }

    fn registry(tmp: &TempDir, fetcher: FakeFetcher) -> TemplateRegistry {
        TemplateRegistry::load(tmp.path().join("config/registry.json"), Box::new(fetcher)).unwrap()
    }

    #[test]
    fn url_classification() {
        assert!(is_git_url("https://github.com/org/repo.git"));
        assert!(is_git_url("git@gitlab.com:org/repo.git"));
        assert!(is_git_url("git+ssh://host/repo"));
        assert!(!is_git_url("ftp://host/repo"));
        assert!(!is_git_url("devenv"));
        assert_eq!(
            expand_github_shorthand("gh:org/repo").as_deref(),
            Some("https://github.com/org/repo.git")
        );
        assert_eq!(expand_github_shorthand("gh:"), None);
    }

    #[test]
    fn builtin_names_resolve_without_fetching() {
        let tmp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default();
        let calls = fetcher.calls.clone();
        let registry = registry(&tmp, fetcher);

        assert_eq!(registry.resolve("devenv").unwrap().id.name(), "devenv");
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn github_shorthand_is_fetched() {
        let tmp = TempDir::new().unwrap();
        let checkout = tmp.path().join("checkout");
        write_template(&checkout, "remote");
        let fetcher = FakeFetcher {
            checkouts: BTreeMap::from([("https://github.com/org/repo.git".into(), checkout)]),
            ..FakeFetcher::default()
        };
        let calls = fetcher.calls.clone();

        let template = registry(&tmp, fetcher).resolve("gh:org/repo").unwrap();
        assert_eq!(template.id.to_string(), "remote@0.1.0");
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            ["fetch https://github.com/org/repo.git#main"]
        );
    }

    #[test]
    fn registered_entries_use_ref_and_subdirectory() {
        let tmp = TempDir::new().unwrap();
        let checkout = tmp.path().join("checkout");
        write_template(&checkout.join("python"), "py");
        let url = "https://example.com/templates.git";
        let fetcher = FakeFetcher {
            checkouts: BTreeMap::from([(url.into(), checkout)]),
            ..FakeFetcher::default()
        };
        let calls = fetcher.calls.clone();

        let mut registry = registry(&tmp, fetcher);
        registry
            .add(
                RemoteTemplate {
                    reference: Some("v2".into()),
                    subdirectory: Some("python".into()),
                    ..RemoteTemplate::new("py", url)
                },
                false,
            )
            .unwrap();

        assert_eq!(registry.resolve("py").unwrap().id.name(), "py");
        assert_eq!(calls.lock().unwrap()[0], format!("fetch {url}#v2"));

        let mut missing_sub = registry.get("py").unwrap().clone();
        missing_sub.name = "broken".into();
        missing_sub.subdirectory = Some("nope".into());
        registry.add(missing_sub, false).unwrap();
        let err = registry.resolve("broken").unwrap_err();
        assert_eq!(err.category(), devman_core::error::ErrorCategory::NotFound);
    }

    #[test]
    fn search_paths_then_local_directories() {
        let tmp = TempDir::new().unwrap();
        let search = tmp.path().join("templates");
        write_template(&search.join("flask-site"), "flask-site");
        let local = tmp.path().join("elsewhere/custom");
        write_template(&local, "custom");

        let registry = registry(&tmp, FakeFetcher::default()).with_search_paths([search]);
        assert_eq!(registry.resolve("flask-site").unwrap().id.name(), "flask-site");
        assert_eq!(
            registry.resolve(&local.to_string_lossy()).unwrap().id.name(),
            "custom"
        );

        let err = registry.resolve("no-such-template").unwrap_err();
        assert_eq!(err.category(), devman_core::error::ErrorCategory::NotFound);
    }

    #[test]
    fn add_persists_and_rejects_duplicates_and_bad_urls() {
        let tmp = TempDir::new().unwrap();
        let mut first = registry(&tmp, FakeFetcher::default());
        first
            .add(RemoteTemplate::new("svc", "git@github.com:org/svc.git"), false)
            .unwrap();

        let dup = first.add(RemoteTemplate::new("svc", "https://x/y.git"), false);
        assert_eq!(
            dup.unwrap_err().category(),
            devman_core::error::ErrorCategory::Configuration
        );
        first
            .add(RemoteTemplate::new("svc", "https://x/y.git"), true)
            .unwrap();

        let bad = first.add(RemoteTemplate::new("bad", "ftp://x/y"), false);
        assert!(bad.is_err());

        let reloaded = registry(&tmp, FakeFetcher::default());
        let entries: Vec<_> = reloaded.entries().cloned().collect();
        assert_eq!(entries, vec![RemoteTemplate::new("svc", "https://x/y.git")]);
    }

    #[test]
    fn remove_evicts_cache_and_unknown_names_fail() {
        let tmp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default();
        let calls = fetcher.calls.clone();
        let mut registry = registry(&tmp, fetcher);
        registry
            .add(RemoteTemplate::new("svc", "https://x/y.git"), false)
            .unwrap();

        registry.remove("svc").unwrap();
        assert_eq!(calls.lock().unwrap().as_slice(), ["evict https://x/y.git"]);
        assert!(registry.get("svc").is_none());
        assert!(registry.remove("svc").is_err());
    }

    #[test]
    fn update_refreshes_registered_checkouts() {
        let tmp = TempDir::new().unwrap();
        let checkout = tmp.path().join("checkout");
        fs::create_dir_all(&checkout).unwrap();
        let fetcher = FakeFetcher {
            checkouts: BTreeMap::from([("https://x/ok.git".into(), checkout.clone())]),
            ..FakeFetcher::default()
        };
        let calls = fetcher.calls.clone();
        let mut registry = registry(&tmp, fetcher);
        registry
            .add(
                RemoteTemplate {
                    reference: Some("v2".into()),
                    ..RemoteTemplate::new("ok", "https://x/ok.git")
                },
                false,
            )
            .unwrap();
        registry
            .add(RemoteTemplate::new("broken", "https://x/broken.git"), false)
            .unwrap();

        assert_eq!(registry.update("ok").unwrap(), checkout);
        assert_eq!(
            registry.update("nope").unwrap_err().category(),
            devman_core::error::ErrorCategory::Configuration
        );

        let results = registry.update_all();
        let outcome: Vec<_> = results.iter().map(|(n, r)| (n.as_str(), r.is_ok())).collect();
        assert_eq!(outcome, vec![("broken", false), ("ok", true)]);
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            [
                "refresh https://x/ok.git#v2",
                "refresh https://x/broken.git#main",
                "refresh https://x/ok.git#v2",
            ]
        );
    }

    #[test]
    fn exported_builtin_shadows_the_compiled_in_set() {
        let tmp = TempDir::new().unwrap();
        let search = tmp.path().join("templates");
        let registry = registry(&tmp, FakeFetcher::default()).with_search_paths([search.clone()]);

        let dir = registry.export_builtin("devenv", false).unwrap();
        assert_eq!(dir, search.join("devenv"));
        assert_eq!(registry.locate("devenv").unwrap(), Some(dir.clone()));

        fs::write(dir.join("justfile.hbs"), "default:\n    echo {{name}}\n").unwrap();
        let set = registry.resolve("devenv").unwrap();
        let justfile = set.files.iter().find(|f| f.path == "justfile").unwrap();
        assert_eq!(
            justfile.body,
            devman_core::domain::TemplateBody::Template("default:\n    echo {{name}}\n".into())
        );

        let again = registry.export_builtin("devenv", false).unwrap_err();
        assert_eq!(again.category(), devman_core::error::ErrorCategory::Configuration);
        registry.export_builtin("devenv", true).unwrap();
        let restored = fs::read_to_string(dir.join("justfile.hbs")).unwrap();
        assert!(restored.contains("devenv shell"), "{restored}");

        assert!(registry.export_builtin("flask", false).is_err());
    }

    #[test]
    fn export_needs_a_search_path() {
        let tmp = TempDir::new().unwrap();
        let err = registry(&tmp, FakeFetcher::default())
            .export_builtin("devenv", false)
            .unwrap_err();
        assert_eq!(err.category(), devman_core::error::ErrorCategory::Configuration);
    }

    #[test]
    fn malformed_registry_file_is_a_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("registry.json");
        fs::write(&file, "{ not json").unwrap();

        let err = TemplateRegistry::load(&file, Box::new(FakeFetcher::default()))
            .err()
            .unwrap();
        assert_eq!(err.category(), devman_core::error::ErrorCategory::Configuration);
    }

    #[test]
    fn list_combines_all_sources() {
        let tmp = TempDir::new().unwrap();
        let search = tmp.path().join("templates");
        write_template(&search.join("local-one"), "local-one");

        let mut registry = registry(&tmp, FakeFetcher::default()).with_search_paths([search]);
        registry
            .add(RemoteTemplate::new("remote-one", "https://x/y.git"), false)
            .unwrap();

        let origins: Vec<_> = registry
            .list()
            .unwrap()
            .into_iter()
            .map(|s| (s.name, s.origin == "builtin" || s.origin == "registry"))
            .collect();
        assert_eq!(
            origins,
            vec![
                ("devenv".to_string(), true),
                ("remote-one".to_string(), true),
                ("local-one".to_string(), false),
            ]
        );
    }
}
