//! Application layer errors.
//!
//! These errors represent failures in orchestration and I/O, not business
//! logic. Business logic errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// The template engine rejected a template or the context.
    #[error("Rendering template '{template}' failed: {reason}")]
    RenderFailed { template: String, reason: String },

    /// No template source could resolve the selector.
    #[error("Template not found: {selector}")]
    TemplateNotFound { selector: String },

    /// No `.devman/devman.toml` in the project directory.
    #[error("Project manifest not found: {}", path.display())]
    ManifestNotFound { path: PathBuf },

    /// Filesystem operation failed.
    #[error("Filesystem error at {}: {reason}", path.display())]
    Filesystem { path: PathBuf, reason: String },

    /// The destination exists but is a file (or something else).
    #[error("Destination is not a directory: {}", path.display())]
    DestinationNotDirectory { path: PathBuf },

    /// Shared adapter state is unusable (poisoned lock).
    #[error("Template store error")]
    StoreLockError,

    /// Validation failed (application-level, not domain).
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl ApplicationError {
    pub fn filesystem(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Filesystem {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::RenderFailed { template, .. } => vec![
                format!("Check the syntax of template '{template}'"),
                "Every {{variable}} used must be declared and provided".into(),
            ],
            Self::TemplateNotFound { selector } => vec![
                format!("No template matches '{selector}'"),
                "Try: devman list to see available templates".into(),
                "Or register one: devman template add <name> <url>".into(),
            ],
            Self::ManifestNotFound { path } => vec![
                format!("Expected a manifest at {}", path.display()),
                "Run devman update from a directory created by devman new".into(),
                "Or point at one with --dir".into(),
            ],
            Self::Filesystem { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have read and write permissions".into(),
            ],
            Self::DestinationNotDirectory { path } => vec![
                format!("'{}' exists and is not a directory", path.display()),
                "Choose another destination with --dir".into(),
            ],
            Self::StoreLockError => vec![
                "The template store is locked".into(),
                "Try again in a moment".into(),
            ],
            Self::ValidationFailed(_) => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RenderFailed { .. } => ErrorCategory::Render,
            Self::TemplateNotFound { .. } | Self::ManifestNotFound { .. } => {
                ErrorCategory::NotFound
            }
            Self::Filesystem { .. } | Self::DestinationNotDirectory { .. } => ErrorCategory::Io,
            Self::StoreLockError => ErrorCategory::Internal,
            Self::ValidationFailed(_) => ErrorCategory::Validation,
        }
    }
}
