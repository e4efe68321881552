//! Template set aggregate.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  TemplateSet (Aggregate Root)                               │
//! │  ├── TemplateId (name@version)                              │
//! │  ├── description                                            │
//! │  ├── Vec<VariableSpec> - schema the context must satisfy    │
//! │  └── Vec<TemplateFile>                                      │
//! │       ├── path: template expression ("src/{{package_name}}")│
//! │       └── body: Template | Literal | Binary                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TemplateRenderer (Driven Port, application layer)          │
//! │  └── render(set, ctx) -> Vec<RenderedFile>                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Decisions
//!
//! ### Literal vs Template bodies
//!
//! Literal bodies skip the engine entirely. A LICENSE file full of braces
//! must not be interpreted, and binary assets cannot be.
//!
//! ### Paths are always templates
//!
//! A file path is itself an expression. A segment that renders to an empty
//! string drops the file, which is how conditional files and directories
//! are expressed without a separate condition field.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{
    entities::context::{RenderContext, VariableKind},
    error::DomainError,
};

// ── TemplateId ───────────────────────────────────────────────────────────────

/// Template identifier, displayed as `name@version`.
///
/// Invariant: neither part is empty and the name contains no `@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId {
    name: String,
    version: String,
}

impl TemplateId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let version = version.into();
        if name.is_empty() || version.is_empty() || name.contains('@') || version.contains('@') {
            return Err(DomainError::InvalidTemplate(format!(
                "Invalid template ID '{name}@{version}'. Expected 'name@version'"
            )));
        }
        Ok(Self { name, version })
    }

    /// Parse from `name@version`.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s.split_once('@') {
            Some((name, version)) => Self::new(name, version),
            None => Err(DomainError::InvalidTemplate(format!(
                "Invalid template ID format: {s}. Expected 'name@version'"
            ))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

// ── Variables ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    pub kind: VariableKind,
}

impl VariableSpec {
    pub fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

// ── Files ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateBody {
    /// Rendered through the template engine.
    Template(String),
    /// Emitted verbatim.
    Literal(String),
    /// Emitted verbatim; never decoded.
    Binary(Vec<u8>),
}

impl TemplateBody {
    pub fn is_template(&self) -> bool {
        matches!(self, Self::Template(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Output path expression, slash separated.
    pub path: String,
    pub body: TemplateBody,
}

impl TemplateFile {
    pub fn template(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            body: TemplateBody::Template(body.into()),
        }
    }

    pub fn literal(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            body: TemplateBody::Literal(body.into()),
        }
    }

    pub fn binary(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            body: TemplateBody::Binary(bytes),
        }
    }
}

// ── TemplateSet ──────────────────────────────────────────────────────────────

/// One project skeleton: files plus the variables they expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    pub id: TemplateId,
    pub description: String,
    pub variables: Vec<VariableSpec>,
    pub files: Vec<TemplateFile>,
}

impl TemplateSet {
    pub fn new(id: TemplateId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            variables: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, kind: VariableKind) -> Self {
        self.variables.push(VariableSpec::new(name, kind));
        self
    }

    pub fn with_file(mut self, file: TemplateFile) -> Self {
        self.files.push(file);
        self
    }

    /// Structural checks: at least one file, no variable declared twice.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.files.is_empty() {
            return Err(DomainError::EmptyTemplate {
                template_id: self.id.to_string(),
            });
        }

        let mut seen = HashSet::new();
        for var in &self.variables {
            if !seen.insert(var.name.as_str()) {
                return Err(DomainError::InvalidTemplate(format!(
                    "variable '{}' is declared twice in {}",
                    var.name, self.id
                )));
            }
        }
        Ok(())
    }

    /// Check the context against the declared variables.
    ///
    /// Extra context entries are allowed; a missing or mistyped declared
    /// variable is not.
    pub fn validate_context(&self, context: &RenderContext) -> Result<(), DomainError> {
        for spec in &self.variables {
            let value = context
                .get(&spec.name)
                .ok_or_else(|| DomainError::MissingVariable {
                    template_id: self.id.to_string(),
                    name: spec.name.clone(),
                })?;

            let found = value.kind();
            if found != spec.kind {
                return Err(DomainError::VariableTypeMismatch {
                    template_id: self.id.to_string(),
                    name: spec.name.clone(),
                    expected: spec.kind.as_str(),
                    found: found.as_str(),
                });
            }
        }
        Ok(())
    }
}

/// Listing entry for a template set a source can provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateSummary {
    pub name: String,
    pub description: String,
    /// Where it comes from: `builtin`, `registry` or a local path.
    pub origin: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> TemplateSet {
        TemplateSet::new(TemplateId::new("sample", "1.0.0").unwrap(), "Sample")
            .with_variable("name", VariableKind::Text)
            .with_variable("use_redis", VariableKind::Flag)
            .with_file(TemplateFile::template("README.md", "# {{name}}"))
    }

    #[test]
    fn template_id_parsing() {
        let id = TemplateId::parse("my-template@2.0.0").unwrap();
        assert_eq!(id.name(), "my-template");
        assert_eq!(id.version(), "2.0.0");
        assert_eq!(id.to_string(), "my-template@2.0.0");

        assert!(TemplateId::parse("invalid").is_err());
        assert!(TemplateId::parse("too@many@ats").is_err());
        assert!(TemplateId::parse("@1.0.0").is_err());
    }

    #[test]
    fn validate_rejects_empty_sets() {
        let set = TemplateSet::new(TemplateId::new("empty", "0.1.0").unwrap(), "");
        assert!(matches!(
            set.validate(),
            Err(DomainError::EmptyTemplate { .. })
        ));
    }

    #[test]
    fn validate_rejects_duplicate_variables() {
        let set = sample_set().with_variable("name", VariableKind::Text);
        assert!(set.validate().is_err());
    }

    #[test]
    fn context_must_provide_declared_variables() {
        let ctx = RenderContext::new().with("name", "demo");
        let err = sample_set().validate_context(&ctx).unwrap_err();
        assert_eq!(
            err,
            DomainError::MissingVariable {
                template_id: "sample@1.0.0".into(),
                name: "use_redis".into(),
            }
        );
    }

    #[test]
    fn context_kinds_must_match() {
        let ctx = RenderContext::new()
            .with("name", "demo")
            .with("use_redis", "yes");
        let err = sample_set().validate_context(&ctx).unwrap_err();
        assert!(matches!(
            err,
            DomainError::VariableTypeMismatch {
                expected: "flag",
                found: "text",
                ..
            }
        ));
    }

    #[test]
    fn extra_context_entries_are_fine() {
        let ctx = RenderContext::new()
            .with("name", "demo")
            .with("use_redis", true)
            .with("unused", vec!["x".to_string()]);
        assert!(sample_set().validate_context(&ctx).is_ok());
    }
}
