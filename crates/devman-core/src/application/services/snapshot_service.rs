//! Snapshotter - renders a template set into memory.
//!
//! The destination is never touched here; the snapshot is the single source
//! of truth for both planning and writing.

use tracing::{debug, instrument};

use crate::{
    application::ports::TemplateRenderer,
    domain::{FileRecord, RelativePath, RenderContext, Snapshot, TemplateSet},
    error::DevmanResult,
};

pub struct Snapshotter<'a> {
    renderer: &'a dyn TemplateRenderer,
}

impl<'a> Snapshotter<'a> {
    pub fn new(renderer: &'a dyn TemplateRenderer) -> Self {
        Self { renderer }
    }

    /// Render every file of `template` into a [`Snapshot`].
    ///
    /// # Errors
    ///
    /// - Render category: the context misses or mistypes a declared
    ///   variable, or the engine rejects a template
    /// - Template category: an output path is absolute, escapes the root or
    ///   is produced twice
    #[instrument(skip_all, fields(template = %template.id))]
    pub fn snapshot(
        &self,
        template: &TemplateSet,
        context: &RenderContext,
    ) -> DevmanResult<Snapshot> {
        template.validate()?;
        template.validate_context(context)?;

        let rendered = self.renderer.render(template, context)?;

        let mut snapshot = Snapshot::new(template.id.clone());
        for file in rendered {
            let path = RelativePath::try_new(&file.path)?;
            let record = FileRecord::from_bytes(file.contents);
            debug!(
                path = %path,
                kind = ?record.kind(),
                size = record.raw_size(),
                "Snapshotted file"
            );
            snapshot.insert(path, record)?;
        }

        debug!(files = snapshot.len(), "Snapshot complete");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::ports::RenderedFile,
        domain::{DomainError, FileKind, TemplateFile, TemplateId, VariableKind},
        error::{DevmanError, ErrorCategory},
    };

    /// Emits a fixed list of files regardless of input.
    struct FixedRenderer(Vec<RenderedFile>);

    impl TemplateRenderer for FixedRenderer {
        fn render(&self, _: &TemplateSet, _: &RenderContext) -> DevmanResult<Vec<RenderedFile>> {
            Ok(self.0.clone())
        }
    }

    fn template() -> TemplateSet {
        TemplateSet::new(TemplateId::new("t", "1").unwrap(), "test")
            .with_variable("name", VariableKind::Text)
            .with_file(TemplateFile::template("{{name}}.txt", "x"))
    }

    fn context() -> RenderContext {
        RenderContext::new().with("name", "demo")
    }

    fn snapshot_of(files: Vec<RenderedFile>) -> DevmanResult<Snapshot> {
        let renderer = FixedRenderer(files);
        Snapshotter::new(&renderer).snapshot(&template(), &context())
    }

    #[test]
    fn classifies_text_and_binary_and_keeps_dotfiles() {
        let snapshot = snapshot_of(vec![
            RenderedFile::new(".envrc", "use devenv"),
            RenderedFile::new("logo.bin", vec![0xff_u8, 0xfe]),
            RenderedFile::new("pkg/demo/__init__.py", ""),
        ])
        .unwrap();

        assert_eq!(snapshot.len(), 3);
        let envrc = snapshot.get(&RelativePath::try_new(".envrc").unwrap()).unwrap();
        assert_eq!(envrc.kind(), FileKind::Text);
        let logo = snapshot
            .get(&RelativePath::try_new("logo.bin").unwrap())
            .unwrap();
        assert_eq!(logo.kind(), FileKind::Binary);
        assert_eq!(logo.raw_size(), 2);
    }

    #[test]
    fn escaping_paths_are_template_errors() {
        for bad in ["../x", "/etc/passwd", "C:\\x", "a/../../b"] {
            let err = snapshot_of(vec![RenderedFile::new(bad, "x")]).unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Template, "{bad}");
        }
    }

    #[test]
    fn duplicate_output_paths_are_template_errors() {
        let err = snapshot_of(vec![
            RenderedFile::new("a.txt", "1"),
            RenderedFile::new("./a.txt", "2"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            DevmanError::Domain(DomainError::DuplicatePath { .. })
        ));
    }

    #[test]
    fn missing_variable_fails_before_rendering() {
        let renderer = FixedRenderer(vec![]);
        let err = Snapshotter::new(&renderer)
            .snapshot(&template(), &RenderContext::new())
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Render);
    }
}
