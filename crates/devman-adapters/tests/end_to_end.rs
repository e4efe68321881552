//! End-to-end generation against a real directory.

use std::fs;
use std::path::Path;

use devman_adapters::{
    BuiltinTemplates, GitFetcher, HandlebarsRenderer, LocalFilesystem, MemoryFilesystem,
    SecurityOverlay, TemplateRegistry,
};
use devman_core::domain::FileRecord;
use devman_core::prelude::*;
use tempfile::TempDir;

fn registry(tmp: &TempDir) -> TemplateRegistry {
    TemplateRegistry::load(
        tmp.path().join("config/registry.json"),
        Box::new(GitFetcher::new(tmp.path().join("cache"))),
    )
    .unwrap()
    .with_search_paths([tmp.path().join("templates")])
}

fn service(tmp: &TempDir, security: SecurityConfig) -> ScaffoldService {
    ScaffoldService::new(
        Box::new(registry(tmp)),
        Box::new(SecurityOverlay::new(HandlebarsRenderer::new(), security)),
        Box::new(LocalFilesystem::new()),
    )
}

fn request(
    template: &str,
    destination: &Path,
    context: RenderContext,
    force: bool,
) -> GenerationRequest {
    GenerationRequest {
        template: template.into(),
        destination: destination.to_path_buf(),
        context,
        force,
    }
}

fn statuses(plan: &Plan) -> Vec<PlanStatus> {
    plan.entries().iter().map(|e| e.status).collect()
}

fn write_template(root: &Path, name: &str, files: &[(&str, &[u8])]) {
    let dir = root.join("templates").join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("template.toml"),
        format!("[template]\nname = \"{name}\"\nversion = \"1.0.0\"\n\n[variables]\nname = \"text\"\n"),
    )
    .unwrap();
    for (rel, contents) in files {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
}

#[test]
fn devenv_project_is_planned_written_and_then_identical() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("my-api");
    let config = ProjectConfig::builder("my-api").build().unwrap();
    let service = service(&tmp, config.security().clone());
    let req = request("devenv", &dest, config.to_context(), false);

    let generation = service.prepare(&req).unwrap();
    assert!(statuses(&generation.plan).iter().all(|s| *s == PlanStatus::Create));
    assert!(!dest.exists(), "prepare must not touch the destination");

    let report = service.apply(&generation).unwrap();
    assert_eq!(report.written.len(), generation.plan.entries().len());
    assert!(dest.join("src/my_api/main.py").is_file());
    assert!(dest.join(".pre-commit-config.yaml").is_file());
    let justfile = fs::read_to_string(dest.join("justfile")).unwrap();
    assert!(justfile.contains("security-check:"));

    let again = service.prepare(&req).unwrap();
    assert!(
        statuses(&again.plan)
            .iter()
            .all(|s| *s == PlanStatus::SkipIdentical)
    );
}

#[test]
fn edited_file_becomes_a_conflict_and_survives_apply() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("svc");
    let config = ProjectConfig::builder("svc")
        .security(SecurityConfig::disabled())
        .build()
        .unwrap();
    let service = service(&tmp, SecurityConfig::disabled());
    let req = request("devenv", &dest, config.to_context(), false);
    service.generate(&req).unwrap();

    fs::write(dest.join("justfile"), "# mine\n").unwrap();
    let generation = service.prepare(&req).unwrap();
    let conflicts: Vec<_> = generation.plan.conflicts().iter().map(ToString::to_string).collect();
    assert_eq!(conflicts, vec!["justfile"]);

    service.apply(&generation).unwrap();
    assert_eq!(fs::read_to_string(dest.join("justfile")).unwrap(), "# mine\n");

    let forced = service.prepare(&request("devenv", &dest, config.to_context(), true)).unwrap();
    assert!(!forced.plan.has_conflicts());
    service.apply(&forced).unwrap();
    assert_ne!(fs::read_to_string(dest.join("justfile")).unwrap(), "# mine\n");
}

#[test]
fn directory_templates_with_binary_files() {
    let tmp = TempDir::new().unwrap();
    write_template(
        tmp.path(),
        "assets",
        &[
            ("README.md", b"# {{name}}\n"),
            ("static/logo.png", &[0x89, 0x50, 0x4e, 0x47, 0xff, 0x00]),
        ],
    );
    let dest = tmp.path().join("out");
    let service = service(&tmp, SecurityConfig::disabled());
    let ctx = RenderContext::new().with("name", "Demo");

    let generation = service.prepare(&request("assets", &dest, ctx.clone(), false)).unwrap();
    let logo = generation
        .snapshot
        .iter()
        .find(|(path, _)| path.as_str() == "static/logo.png")
        .map(|(_, record)| record)
        .unwrap();
    assert!(!logo.is_text());
    assert_eq!(logo.raw_size(), 6);

    service.apply(&generation).unwrap();
    assert_eq!(
        fs::read(dest.join("static/logo.png")).unwrap(),
        vec![0x89, 0x50, 0x4e, 0x47, 0xff, 0x00]
    );
    assert_eq!(fs::read_to_string(dest.join("README.md")).unwrap(), "# Demo\n");

    let again = service.prepare(&request("assets", &dest, ctx, false)).unwrap();
    assert!(statuses(&again.plan).iter().all(|s| *s == PlanStatus::SkipIdentical));
}

#[test]
fn rendered_path_escaping_the_destination_is_a_template_error() {
    let tmp = TempDir::new().unwrap();
    write_template(tmp.path(), "escape", &[("{{name}}/x.txt", b"x")]);
    let service = service(&tmp, SecurityConfig::disabled());

    let err = service
        .prepare(&request(
            "escape",
            &tmp.path().join("out"),
            RenderContext::new().with("name", ".."),
            false,
        ))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Template);
}

#[test]
fn missing_context_variable_is_a_render_error() {
    let tmp = TempDir::new().unwrap();
    write_template(tmp.path(), "needs-name", &[("a.txt", b"{{name}}")]);
    let service = service(&tmp, SecurityConfig::disabled());

    let err = service
        .prepare(&request("needs-name", &tmp.path().join("out"), RenderContext::new(), false))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Render);
}

#[test]
fn destination_that_is_a_file_is_an_io_error() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("occupied");
    fs::write(&dest, "file").unwrap();
    let config = ProjectConfig::builder("svc").build().unwrap();

    let err = service(&tmp, SecurityConfig::disabled())
        .prepare(&request("devenv", &dest, config.to_context(), false))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Io);
}

#[test]
fn builtin_set_plans_against_memory_filesystem() {
    let dest = Path::new("/mem/svc");
    let fs = MemoryFilesystem::new().with_file(dest.join("justfile"), "custom:\n\techo hi\n");
    let config = ProjectConfig::builder("svc").build().unwrap();
    let service = ScaffoldService::new(
        Box::new(BuiltinTemplates::new()),
        Box::new(SecurityOverlay::new(HandlebarsRenderer::new(), config.security().clone())),
        Box::new(fs.clone()),
    );

    let (generation, report) = service
        .generate(&request("devenv", dest, config.to_context(), false))
        .unwrap();
    assert_eq!(generation.plan.conflicts().len(), 1);
    assert_eq!(generation.plan.conflicts()[0].as_str(), "justfile");
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.written.len(), generation.plan.entries().len() - 1);

    assert_eq!(
        fs.read_string(dest.join("justfile")).as_deref(),
        Some("custom:\n\techo hi\n")
    );
    assert!(fs.list_files().contains(&dest.join("pyproject.toml")));
}

#[test]
fn file_where_a_directory_is_needed_plans_as_create() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("sub"), "in the way").unwrap();

    let mut snapshot = Snapshot::new(TemplateId::new("t", "1").unwrap());
    for path in ["a.txt", "sub/b.txt"] {
        snapshot
            .insert(RelativePath::try_new(path).unwrap(), FileRecord::text(path))
            .unwrap();
    }

    let filesystem = LocalFilesystem::new();
    let plan = Planner::new(&filesystem).plan(&snapshot, tmp.path(), false).unwrap();
    let entries: Vec<_> = plan
        .entries()
        .iter()
        .map(|e| (e.path.as_str(), e.status))
        .collect();
    assert_eq!(
        entries,
        vec![("a.txt", PlanStatus::Create), ("sub/b.txt", PlanStatus::Create)]
    );
}
