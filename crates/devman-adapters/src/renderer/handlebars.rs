//! Handlebars-backed renderer.
//!
//! Bodies and paths are both Handlebars templates. Paths are rendered one
//! segment at a time so that a segment rendering to nothing drops the file:
//!
//! ```text
//! {{#if (eq container_type "docker")}}Dockerfile{{/if}}   -> "Dockerfile" or skipped
//! src/{{package_name}}/__init__.py                        -> "src/my_api/__init__.py"
//! ```

use handlebars::{Handlebars, handlebars_helper};
use tracing::{debug, instrument, trace};

use devman_core::{
    application::{
        ApplicationError,
        ports::{RenderedFile, TemplateRenderer},
    },
    domain::{RenderContext, TemplateBody, TemplateSet},
    error::{DevmanError, DevmanResult},
};

handlebars_helper!(contains: |list: Json, item: str| {
    list.as_array()
        .is_some_and(|values| values.iter().any(|v| v.as_str() == Some(item)))
});

/// Renders template sets with Handlebars in strict mode, without HTML escaping.
pub struct HandlebarsRenderer {
    handlebars: Handlebars<'static>,
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        // Undefined variables are errors, not empty strings.
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("contains", Box::new(contains));

        Self { handlebars }
    }

    fn render_str(
        &self,
        template: &TemplateSet,
        what: &str,
        source: &str,
        context: &RenderContext,
    ) -> DevmanResult<String> {
        self.handlebars
            .render_template(source, context)
            .map_err(|e| render_error(template, what, e))
    }

    /// Render a path expression. `None` means a segment rendered empty.
    fn render_path(
        &self,
        template: &TemplateSet,
        path: &str,
        context: &RenderContext,
    ) -> DevmanResult<Option<String>> {
        let mut rendered = Vec::new();
        for segment in split_path_template(path) {
            let value = if segment.contains("{{") {
                self.render_str(template, path, segment, context)?
            } else {
                segment.to_string()
            };

            let value = value.trim();
            if value.is_empty() {
                trace!(path, "Path segment rendered empty, skipping file");
                return Ok(None);
            }
            rendered.push(value.to_string());
        }
        Ok(Some(rendered.join("/")))
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    #[instrument(skip_all, fields(template = %template.id, files = template.files.len()))]
    fn render(
        &self,
        template: &TemplateSet,
        context: &RenderContext,
    ) -> DevmanResult<Vec<RenderedFile>> {
        let mut out = Vec::with_capacity(template.files.len());

        for file in &template.files {
            let Some(path) = self.render_path(template, &file.path, context)? else {
                continue;
            };

            let contents = match &file.body {
                TemplateBody::Template(source) => {
                    self.render_str(template, &file.path, source, context)?.into_bytes()
                }
                TemplateBody::Literal(text) => text.as_bytes().to_vec(),
                TemplateBody::Binary(bytes) => bytes.clone(),
            };

            out.push(RenderedFile::new(path, contents));
        }

        debug!(rendered = out.len(), "Rendered template set");
        Ok(out)
    }
}

fn render_error(template: &TemplateSet, what: &str, e: handlebars::RenderError) -> DevmanError {
    ApplicationError::RenderFailed {
        template: template.id.to_string(),
        reason: format!("{what}: {e}"),
    }
    .into()
}

/// Split a path template on `/` that sit outside `{{ ... }}`.
///
/// `{{/if}}` and string literals containing slashes stay inside their segment.
pub(crate) fn split_path_template(path: &str) -> Vec<&str> {
    let bytes = path.as_bytes();
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i..].starts_with(b"{{") {
            depth += 1;
            i += 2;
        } else if bytes[i..].starts_with(b"}}") && depth > 0 {
            depth -= 1;
            i += 2;
        } else if bytes[i] == b'/' && depth == 0 {
            segments.push(&path[start..i]);
            i += 1;
            start = i;
        } else {
            i += 1;
        }
    }
    segments.push(&path[start..]);
    segments
}
