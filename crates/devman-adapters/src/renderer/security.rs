//! Security tooling overlay.
//!
//! Wraps another renderer and adds configuration for pre-commit, bandit,
//! safety and detect-secrets, plus `security-*` recipes appended to a
//! rendered `justfile`. Nothing here runs a scanner.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, instrument};

use devman_core::{
    application::{
        ApplicationError,
        ports::{RenderedFile, TemplateRenderer},
    },
    domain::{RenderContext, SecurityConfig, TemplateSet},
    error::{DevmanError, DevmanResult},
};

const JUSTFILE: &str = "justfile";

// ── Overlay ──────────────────────────────────────────────────────────────────

/// Renderer decorator contributing security tooling files.
pub struct SecurityOverlay<R> {
    inner: R,
    config: SecurityConfig,
}

impl<R: TemplateRenderer> SecurityOverlay<R> {
    pub fn new(inner: R, config: SecurityConfig) -> Self {
        Self { inner, config }
    }

    /// Files to add, as `(path, contents)`.
    fn overlay_files(&self, template: &TemplateSet) -> DevmanResult<Vec<(&'static str, String)>> {
        let mut files = Vec::new();
        if self.config.enable_pre_commit {
            files.push((".pre-commit-config.yaml", to_yaml(template, &self.pre_commit())?));
        }
        if self.config.bandit_enabled {
            files.push((".bandit", to_yaml(template, &BanditConfig::default())?));
        }
        if self.config.safety_enabled {
            files.push((".safety-policy.yml", to_yaml(template, &SafetyPolicy::default())?));
        }
        if self.config.enable_secret_detection {
            files.push((".secrets.baseline", secrets_baseline(template)?));
        }
        Ok(files)
    }

    fn pre_commit(&self) -> PreCommitConfig {
        let c = &self.config;
        let mut repos = vec![
            Repo::new(
                "https://github.com/pre-commit/pre-commit-hooks",
                &c.pre_commit_hooks_version,
                vec![
                    Hook::id("trailing-whitespace"),
                    Hook::id("end-of-file-fixer"),
                    Hook::id("check-yaml"),
                    Hook::id("check-added-large-files"),
                    Hook::id("check-merge-conflict"),
                    Hook::id("check-toml"),
                    Hook::id("debug-statements"),
                    Hook::id("name-tests-test").args(&["--pytest-test-first"]),
                ],
            ),
            Repo::new(
                "https://github.com/astral-sh/ruff-pre-commit",
                &c.ruff_version,
                vec![Hook::id("ruff").args(&["--fix"]), Hook::id("ruff-format")],
            ),
            Repo::new(
                "https://github.com/pre-commit/mirrors-mypy",
                &c.mypy_version,
                vec![Hook {
                    additional_dependencies: vec!["types-all".into()],
                    ..Hook::id("mypy").args(&["--strict"])
                }],
            ),
        ];

        if c.enable_secret_detection {
            repos.push(Repo::new(
                "https://github.com/Yelp/detect-secrets",
                &c.detect_secrets_version,
                vec![Hook::id("detect-secrets").args(&["--baseline", ".secrets.baseline"])],
            ));
        }
        if c.bandit_enabled {
            repos.push(Repo::new(
                "https://github.com/PyCQA/bandit",
                &c.bandit_version,
                vec![Hook::id("bandit").args(&[
                    "-r",
                    "src/",
                    "-f",
                    "json",
                    "-o",
                    "bandit-report.json",
                ])],
            ));
        }

        PreCommitConfig { repos }
    }

    /// `security-*` recipes in declaration order.
    pub fn justfile_recipes(&self) -> Vec<(&'static str, String)> {
        let c = &self.config;
        let mut recipes = Vec::new();

        if c.enable_pre_commit {
            recipes.push(("security-install-hooks", "pre-commit install".to_string()));
            recipes.push(("security-run-hooks", "pre-commit run --all-files".to_string()));
        }
        if c.bandit_enabled {
            recipes.push((
                "security-bandit",
                "bandit -r src/ -f json -o bandit-report.json".to_string(),
            ));
        }
        if c.safety_enabled {
            recipes.push((
                "security-safety",
                "safety check --json --output safety-report.json".to_string(),
            ));
        }
        if c.enable_dependency_scan {
            recipes.push(("security-dep-scan", "uv pip check".to_string()));
            recipes.push((
                "security-audit",
                "pip-audit --format=json --output=audit-report.json".to_string(),
            ));
        }
        if c.enable_vulnerability_scan {
            recipes.push((
                "security-vuln-scan",
                "python -m pip_audit --format=json --output=vulnerability-report.json".to_string(),
            ));
        }

        let check: Vec<&str> = [
            (c.bandit_enabled, "just security-bandit"),
            (c.safety_enabled, "just security-safety"),
            (c.enable_dependency_scan, "just security-dep-scan"),
            (c.enable_pre_commit, "just security-run-hooks"),
        ]
        .into_iter()
        .filter_map(|(enabled, step)| enabled.then_some(step))
        .collect();
        if !check.is_empty() {
            recipes.push(("security-check", check.join(" && ")));
        }

        recipes
    }

    fn append_recipes(&self, justfile: &mut Vec<u8>) {
        let recipes = self.justfile_recipes();
        if recipes.is_empty() {
            return;
        }

        let mut block = String::new();
        if !justfile.is_empty() && !justfile.ends_with(b"\n") {
            block.push('\n');
        }
        block.push_str("\n# Security\n");
        for (name, command) in recipes {
            block.push_str(&format!("\n{name}:\n    {command}\n"));
        }
        justfile.extend_from_slice(block.as_bytes());
    }
}

impl<R: TemplateRenderer> TemplateRenderer for SecurityOverlay<R> {
    #[instrument(skip_all, fields(template = %template.id))]
    fn render(
        &self,
        template: &TemplateSet,
        context: &RenderContext,
    ) -> DevmanResult<Vec<RenderedFile>> {
        let mut files = self.inner.render(template, context)?;
        if !self.config.enabled {
            return Ok(files);
        }

        let produced: HashSet<String> = files.iter().map(|f| f.path.clone()).collect();
        let mut added = 0usize;
        for (path, contents) in self.overlay_files(template)? {
            if produced.contains(path) {
                debug!(path, "Template already provides file, leaving it alone");
                continue;
            }
            files.push(RenderedFile::new(path, contents));
            added += 1;
        }

        if let Some(justfile) = files.iter_mut().find(|f| f.path == JUSTFILE) {
            self.append_recipes(&mut justfile.contents);
        }

        debug!(added, "Applied security overlay");
        Ok(files)
    }
}

// ── File formats ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PreCommitConfig {
    repos: Vec<Repo>,
}

#[derive(Debug, Serialize)]
struct Repo {
    repo: String,
    rev: String,
    hooks: Vec<Hook>,
}

impl Repo {
    fn new(repo: &str, rev: &str, hooks: Vec<Hook>) -> Self {
        Self {
            repo: repo.to_string(),
            rev: rev.to_string(),
            hooks,
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct Hook {
    id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    additional_dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    args: Vec<String>,
}

impl Hook {
    fn id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    fn args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|a| a.to_string()).collect();
        self
    }
}

#[derive(Debug, Serialize)]
struct BanditConfig {
    tests: Vec<String>,
    skips: Vec<&'static str>,
    exclude_dirs: Vec<&'static str>,
}

impl Default for BanditConfig {
    fn default() -> Self {
        let ranges = [(201, 201), (301, 325), (401, 413), (501, 507), (601, 611), (701, 703)];
        Self {
            tests: ranges
                .into_iter()
                .flat_map(|(from, to)| from..=to)
                .map(|n| format!("B{n}"))
                .collect(),
            // assert statements and shell injection in tests
            skips: vec!["B101", "B601"],
            exclude_dirs: vec!["tests", "venv", ".venv"],
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct SafetyPolicy {
    security: SafetySection,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
struct SafetySection {
    ignore_vulnerabilities: Vec<String>,
    continue_on_vulnerability_error: bool,
}

fn secrets_baseline(template: &TemplateSet) -> DevmanResult<String> {
    let baseline = json!({
        "version": "1.4.0",
        "plugins_used": [
            { "name": "ArtifactoryDetector" },
            { "name": "AWSKeyDetector" },
            { "name": "Base64HighEntropyString", "limit": 4.5 },
            { "name": "BasicAuthDetector" },
            { "name": "CloudantDetector" },
            { "name": "GitHubTokenDetector" },
            { "name": "HexHighEntropyString", "limit": 3.0 },
            { "name": "PrivateKeyDetector" },
            { "name": "SlackDetector" },
            { "name": "StripeDetector" }
        ],
        "filters_used": [
            { "path": "detect_secrets.filters.allowlist.is_line_allowlisted" },
            { "path": "detect_secrets.filters.common.is_baseline_file" }
        ],
        "results": {},
        "generated_at": "2024-01-01T00:00:00Z"
    });

    let mut out = serde_json::to_string_pretty(&baseline)
        .map_err(|e| overlay_error(template, ".secrets.baseline", e))?;
    out.push('\n');
    Ok(out)
}

fn to_yaml<T: Serialize>(template: &TemplateSet, value: &T) -> DevmanResult<String> {
    serde_yaml::to_string(value).map_err(|e| overlay_error(template, "security config", e))
}

fn overlay_error(template: &TemplateSet, what: &str, e: impl std::fmt::Display) -> DevmanError {
    ApplicationError::RenderFailed {
        template: template.id.to_string(),
        reason: format!("{what}: {e}"),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use devman_core::domain::{TemplateFile, TemplateId};

    struct Fixed(Vec<RenderedFile>);

    impl TemplateRenderer for Fixed {
        fn render(&self, _: &TemplateSet, _: &RenderContext) -> DevmanResult<Vec<RenderedFile>> {
            Ok(self.0.clone())
        }
    }

    fn template() -> TemplateSet {
        TemplateSet::new(TemplateId::new("t", "1").unwrap(), "")
            .with_file(TemplateFile::literal("justfile", ""))
    }

    fn render(config: SecurityConfig, base: Vec<RenderedFile>) -> Vec<RenderedFile> {
        SecurityOverlay::new(Fixed(base), config)
            .render(&template(), &RenderContext::new())
            .unwrap()
    }

    fn find<'a>(files: &'a [RenderedFile], path: &str) -> Option<&'a str> {
        files
            .iter()
            .find(|f| f.path == path)
            .map(|f| std::str::from_utf8(&f.contents).unwrap())
    }

    #[test]
    fn adds_all_security_files_by_default() {
        let files = render(SecurityConfig::default(), vec![]);
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![".pre-commit-config.yaml", ".bandit", ".safety-policy.yml", ".secrets.baseline"]
        );
    }

    #[test]
    fn disabled_config_passes_files_through() {
        let base = vec![RenderedFile::new("justfile", "test:\n    pytest\n")];
        let files = render(SecurityConfig::disabled(), base.clone());
        assert_eq!(files, base);
    }

    #[test]
    fn pre_commit_config_lists_optional_repos() {
        let files = render(SecurityConfig::default(), vec![]);
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(find(&files, ".pre-commit-config.yaml").unwrap()).unwrap();
        let repos = yaml["repos"].as_sequence().unwrap();
        assert_eq!(repos.len(), 5);
        assert_eq!(repos[3]["repo"].as_str(), Some("https://github.com/Yelp/detect-secrets"));
        assert_eq!(repos[4]["rev"].as_str(), Some("1.7.5"));
        assert_eq!(repos[2]["hooks"][0]["additional_dependencies"][0].as_str(), Some("types-all"));

        let config = SecurityConfig {
            enable_secret_detection: false,
            bandit_enabled: false,
            ..SecurityConfig::default()
        };
        let files = render(config, vec![]);
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(find(&files, ".pre-commit-config.yaml").unwrap()).unwrap();
        assert_eq!(yaml["repos"].as_sequence().unwrap().len(), 3);
        assert!(find(&files, ".bandit").is_none());
        assert!(find(&files, ".secrets.baseline").is_none());
    }

    #[test]
    fn bandit_config_covers_test_ranges() {
        let files = render(SecurityConfig::default(), vec![]);
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(find(&files, ".bandit").unwrap()).unwrap();
        let tests = yaml["tests"].as_sequence().unwrap();
        assert_eq!(tests.len(), 1 + 25 + 13 + 7 + 11 + 3);
        assert_eq!(tests[0].as_str(), Some("B201"));
        assert_eq!(yaml["skips"][1].as_str(), Some("B601"));
    }

    #[test]
    fn safety_policy_uses_kebab_case_keys() {
        let files = render(SecurityConfig::default(), vec![]);
        let policy = find(&files, ".safety-policy.yml").unwrap();
        assert!(policy.contains("continue-on-vulnerability-error: false"));
    }

    #[test]
    fn secrets_baseline_is_json() {
        let files = render(SecurityConfig::default(), vec![]);
        let baseline: serde_json::Value =
            serde_json::from_str(find(&files, ".secrets.baseline").unwrap()).unwrap();
        assert_eq!(baseline["version"], "1.4.0");
        assert_eq!(baseline["plugins_used"].as_array().unwrap().len(), 10);
    }

    #[test]
    fn template_provided_files_win() {
        let base = vec![RenderedFile::new(".bandit", "custom")];
        let files = render(SecurityConfig::default(), base);
        assert_eq!(find(&files, ".bandit"), Some("custom"));
        assert_eq!(files.iter().filter(|f| f.path == ".bandit").count(), 1);
    }

    #[test]
    fn recipes_are_appended_to_justfile() {
        let base = vec![RenderedFile::new("justfile", "test:\n    pytest")];
        let files = render(SecurityConfig::default(), base);
        let justfile = find(&files, "justfile").unwrap();

        assert!(justfile.starts_with("test:\n    pytest\n"));
        assert!(justfile.contains("security-install-hooks:\n    pre-commit install\n"));
        assert!(justfile.contains(
            "security-check:\n    just security-bandit && just security-safety && just security-dep-scan && just security-run-hooks\n"
        ));
    }

    #[test]
    fn security_check_only_chains_enabled_steps() {
        let config = SecurityConfig {
            bandit_enabled: false,
            enable_pre_commit: false,
            ..SecurityConfig::default()
        };
        let overlay = SecurityOverlay::new(Fixed(vec![]), config);
        let recipes = overlay.justfile_recipes();
        let check = recipes.iter().find(|(name, _)| *name == "security-check").unwrap();
        assert_eq!(check.1, "just security-safety && just security-dep-scan");
        assert!(recipes.iter().all(|(name, _)| *name != "security-bandit"));
    }
}
