//! Template Service - template discovery and inspection.
//!
//! Separated from ScaffoldService for single responsibility.

use serde::Serialize;

use crate::{
    application::ports::TemplateSource,
    domain::{TemplateSet, VariableKind},
    error::DevmanResult,
};

/// Information about a template for display purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateInfo {
    pub name: String,
    pub description: String,
    pub origin: String,
}

/// Service for template operations.
pub struct TemplateService {
    source: Box<dyn TemplateSource>,
}

impl TemplateService {
    pub fn new(source: Box<dyn TemplateSource>) -> Self {
        Self { source }
    }

    /// List all templates, sorted by name.
    pub fn list(&self) -> DevmanResult<Vec<TemplateInfo>> {
        let mut infos: Vec<_> = self
            .source
            .list()?
            .into_iter()
            .map(|summary| TemplateInfo {
                name: summary.name,
                description: summary.description,
                origin: summary.origin,
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    /// Resolve a selector to its full template set.
    pub fn resolve(&self, selector: &str) -> DevmanResult<TemplateSet> {
        self.source.resolve(selector)
    }

    /// Declared variables of a template as `(name, kind)` pairs.
    pub fn variables(&self, selector: &str) -> DevmanResult<Vec<(String, VariableKind)>> {
        Ok(self
            .resolve(selector)?
            .variables
            .into_iter()
            .map(|v| (v.name, v.kind))
            .collect())
    }
}
