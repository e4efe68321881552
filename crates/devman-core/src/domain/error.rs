// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (services hand them back unchanged)
/// - Categorizable (for CLI display and exit codes)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (400-level equivalent)
    // ========================================================================
    #[error("Invalid project name '{name}': {reason}")]
    InvalidProjectName { name: String, reason: String },

    #[error("Invalid package name '{name}': {reason}")]
    InvalidPackageName { name: String, reason: String },

    #[error("Unsupported Python version '{version}'")]
    UnsupportedPythonVersion { version: String },

    #[error("Unknown {field} '{value}' (expected one of: {expected})")]
    UnknownValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    // ========================================================================
    // Template Errors (invalid template sets and output paths)
    // ========================================================================
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Template '{template_id}' has no files")]
    EmptyTemplate { template_id: String },

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("Output path escapes the destination root: {path}")]
    PathEscapesRoot { path: String },

    #[error("Duplicate output path: {path}")]
    DuplicatePath { path: String },

    #[error("Output path '{file}' is also a directory of '{nested}'")]
    FileDirectoryClash { file: String, nested: String },

    // ========================================================================
    // Render Errors (context does not satisfy the template schema)
    // ========================================================================
    #[error("Template '{template_id}' requires variable '{name}', which the context lacks")]
    MissingVariable { template_id: String, name: String },

    #[error("Variable '{name}' must be {expected} for template '{template_id}', got {found}")]
    VariableTypeMismatch {
        template_id: String,
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidProjectName { reason, .. } => vec![
                format!("Project name rejected: {reason}"),
                "Use 2-100 letters, digits, hyphens and underscores".into(),
                "Start with a letter or underscore, do not end with '-' or '_'".into(),
                "Examples: my-api, data_tools, service2".into(),
            ],
            Self::InvalidPackageName { .. } => vec![
                "Package names may only contain letters, digits and underscores".into(),
                "Python keywords cannot be used as package names".into(),
            ],
            Self::UnsupportedPythonVersion { .. } => vec![
                "Supported versions: 3.9, 3.10, 3.11, 3.12, 3.13".into(),
                "Example: devman new my-api --python 3.12".into(),
            ],
            Self::UnknownValue {
                field, expected, ..
            } => vec![format!("Valid values for {field}: {expected}")],
            Self::AbsolutePathNotAllowed { path } | Self::PathEscapesRoot { path } => vec![
                format!("The template produced the output path '{path}'"),
                "Template paths must stay inside the destination directory".into(),
                "Check path expressions and variable values in the template set".into(),
            ],
            Self::DuplicatePath { path } => vec![
                format!("Two template files render to '{path}'"),
                "Make the conditional path expressions mutually exclusive".into(),
            ],
            Self::FileDirectoryClash { file, nested } => vec![
                format!("'{file}' is rendered as a file but '{nested}' needs it to be a directory"),
                "Rename one of the template files or make them mutually exclusive".into(),
            ],
            Self::MissingVariable { name, .. } => vec![
                format!("Provide a value for '{name}'"),
                "Check the [variables] section of the template's template.toml".into(),
            ],
            Self::EmptyTemplate { template_id } => vec![
                format!("Template '{template_id}' is empty or corrupted"),
                "Use a different template or re-fetch it".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidProjectName { .. }
            | Self::InvalidPackageName { .. }
            | Self::UnsupportedPythonVersion { .. }
            | Self::UnknownValue { .. } => ErrorCategory::Validation,
            Self::InvalidTemplate(_)
            | Self::EmptyTemplate { .. }
            | Self::AbsolutePathNotAllowed { .. }
            | Self::PathEscapesRoot { .. }
            | Self::DuplicatePath { .. }
            | Self::FileDirectoryClash { .. } => ErrorCategory::Template,
            Self::MissingVariable { .. } | Self::VariableTypeMismatch { .. } => {
                ErrorCategory::Render
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Template,
    Render,
}
