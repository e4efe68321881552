//! Unified error handling for devman core.
//!
//! Wraps domain and application errors behind one type with a category
//! (for exit codes and styling) and user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for devman core operations.
#[derive(Debug, Error, Clone)]
pub enum DevmanError {
    /// Errors from the domain layer (invalid options, templates, contexts).
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (rendering, I/O, lookup).
    #[error("{0}")]
    Application(#[from] ApplicationError),

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl DevmanError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {message}"),
                "Run: devman config path to locate the config file".into(),
            ],
            Self::Internal { .. } => vec![
                "This appears to be a bug in devman".into(),
                "Re-run with -vvv and include the log when reporting it".into(),
            ],
        }
    }

    /// Get error category for display and exit codes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::Template => ErrorCategory::Template,
                crate::domain::ErrorCategory::Render => ErrorCategory::Render,
            },
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Error categories for UI display and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Render,
    Template,
    NotFound,
    Io,
    Configuration,
    Internal,
}

impl ErrorCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Render => "render",
            Self::Template => "template",
            Self::NotFound => "not found",
            Self::Io => "io",
            Self::Configuration => "configuration",
            Self::Internal => "internal",
        }
    }
}

/// Convenient result type alias.
pub type DevmanResult<T> = Result<T, DevmanError>;

/// Extension trait for adding context to foreign errors.
pub trait Context<T> {
    fn context(self, msg: impl Into<String>) -> DevmanResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> DevmanResult<T> {
        self.map_err(|e| DevmanError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn categories_follow_the_wrapped_layer() {
        let domain: DevmanError = DomainError::PathEscapesRoot { path: "../x".into() }.into();
        assert_eq!(domain.category(), ErrorCategory::Template);

        let app: DevmanError = ApplicationError::DestinationNotDirectory {
            path: PathBuf::from("/tmp/file"),
        }
        .into();
        assert_eq!(app.category(), ErrorCategory::Io);

        let cfg = DevmanError::configuration("bad toml");
        assert_eq!(cfg.category(), ErrorCategory::Configuration);
        assert!(cfg.suggestions()[0].contains("bad toml"));
    }

    #[test]
    fn context_wraps_foreign_errors_as_internal() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::other("disk on fire"));
        let err = result.context("writing cache").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert!(err.to_string().contains("writing cache: disk on fire"));
    }
}
