//! Remote template fetching through the `git` executable.

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use devman_core::{
    application::ApplicationError,
    error::{DevmanError, DevmanResult},
};

pub const DEFAULT_REF: &str = "main";
const GIT_PLUS: &str = "git+";
const CACHE_KEY_LEN: usize = 12;

/// Brings a remote template repository onto local disk.
pub trait TemplateFetcher: Send + Sync {
    /// Local checkout of `url` at `reference`, fetching it if needed.
    fn fetch(&self, url: &str, reference: Option<&str>) -> DevmanResult<PathBuf>;

    /// Drop the local checkout, if any.
    fn evict(&self, url: &str, reference: Option<&str>) -> DevmanResult<()>;

    /// Bring the local checkout up to date with the remote, fetching it if
    /// it is not cached yet.
    fn refresh(&self, url: &str, reference: Option<&str>) -> DevmanResult<PathBuf>;
}

/// Cache directory name for a repository: first 12 hex chars of
/// SHA-256(`url#ref`), with `ref` defaulting to `main`.
pub fn cache_key(url: &str, reference: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{url}#{}", reference.unwrap_or(DEFAULT_REF)).as_bytes());
    let mut key = hex::encode(hasher.finalize());
    key.truncate(CACHE_KEY_LEN);
    key
}

/// Shallow-clones into `<cache_dir>/<cache_key>` and reuses existing clones.
#[derive(Debug, Clone)]
pub struct GitFetcher {
    cache_dir: PathBuf,
}

impl GitFetcher {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn checkout_path(&self, url: &str, reference: Option<&str>) -> PathBuf {
        self.cache_dir.join(cache_key(url, reference))
    }

    fn clone_into(&self, url: &str, reference: Option<&str>, dest: &Path) -> DevmanResult<()> {
        fs::create_dir_all(&self.cache_dir).map_err(|e| {
            DevmanError::from(ApplicationError::filesystem(&self.cache_dir, e.to_string()))
        })?;

        let mut cmd = Command::new("git");
        cmd.args(["clone", "--depth", "1"]);
        if let Some(reference) = reference {
            cmd.args(["--branch", reference]);
        }
        cmd.arg(clone_url(url)).arg(dest);

        let output = cmd.output().map_err(|e| not_found(url, &format!("cannot run git: {e}")))?;
        if !output.status.success() {
            // A failed clone may leave a partial directory behind.
            let _ = fs::remove_dir_all(dest);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(not_found(url, stderr.trim()));
        }
        Ok(())
    }

    /// `git pull --ff-only` inside an existing checkout.
    fn pull(&self, dest: &Path) -> Result<(), String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(dest)
            .args(["pull", "--ff-only", "--quiet"])
            .output()
            .map_err(|e| format!("cannot run git: {e}"))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }
}

/// The URL handed to `git clone`: the `git+` marker is dropped.
pub fn clone_url(url: &str) -> &str {
    url.strip_prefix(GIT_PLUS).unwrap_or(url)
}

impl TemplateFetcher for GitFetcher {
    #[instrument(skip(self))]
    fn fetch(&self, url: &str, reference: Option<&str>) -> DevmanResult<PathBuf> {
        let dest = self.checkout_path(url, reference);
        if dest.is_dir() {
            debug!(path = %dest.display(), "Using cached template checkout");
            return Ok(dest);
        }

        info!(url, "Cloning template repository");
        self.clone_into(url, reference, &dest)?;
        Ok(dest)
    }

    fn evict(&self, url: &str, reference: Option<&str>) -> DevmanResult<()> {
        let dest = self.checkout_path(url, reference);
        if dest.exists() {
            fs::remove_dir_all(&dest).map_err(|e| {
                DevmanError::from(ApplicationError::filesystem(&dest, e.to_string()))
            })?;
            debug!(path = %dest.display(), "Removed cached template checkout");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    fn refresh(&self, url: &str, reference: Option<&str>) -> DevmanResult<PathBuf> {
        let dest = self.checkout_path(url, reference);
        if dest.is_dir() {
            match self.pull(&dest) {
                Ok(()) => {
                    info!(url, "Updated cached template checkout");
                    return Ok(dest);
                }
                Err(reason) => {
                    warn!(url, reason = %reason, "Pull failed, cloning again");
                    self.evict(url, reference)?;
                }
            }
        }

        info!(url, "Cloning template repository");
        self.clone_into(url, reference, &dest)?;
        Ok(dest)
    }
}

fn not_found(url: &str, reason: &str) -> DevmanError {
    debug!(url, reason, "Template fetch failed");
    ApplicationError::TemplateNotFound {
        selector: format!("{url} ({reason})"),
    }
    .into()
}
