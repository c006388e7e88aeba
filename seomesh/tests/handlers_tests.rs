use clap::{ArgMatches, Command, arg, value_parser};
use seomesh::handlers::*;
use seomesh_core::catalog::{LinkStore, PageCatalog, SchemaStore};
use seomesh_core::config::{CONFIG_FILE_NAME, SeoConfig};
use seomesh_core::data::Database;
use seomesh_core::model::{ChangeFrequency, Page, PageType};
use seomesh_core::report::ReportFormat;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};

// ============================================================================
// Import parsing
// ============================================================================

#[test]
fn test_parse_bare_page_array() -> Result<(), Box<dyn std::error::Error>> {
    let import = parse_catalog_import(
        r#"[
            {"path": "/job-detail/7", "title": "Accountant", "category": "Finance", "locality": "Conakry"},
            {"path": "/jobs?sector=Finance"},
            {"path": "/jobs"}
        ]"#,
    )?;

    assert_eq!(import.pages.len(), 3);
    assert!(import.schemas.is_empty());

    let detail = &import.pages[0];
    assert_eq!(detail.page_type, PageType::Detail);
    assert_eq!(detail.category.as_deref(), Some("Finance"));
    assert_eq!(detail.locality.as_deref(), Some("Conakry"));
    assert!(detail.active);

    assert_eq!(import.pages[1].page_type, PageType::Category);
    assert_eq!(import.pages[1].category.as_deref(), Some("Finance"));
    assert_eq!(import.pages[2].page_type, PageType::List);
    Ok(())
}

#[test]
fn test_parse_catalog_object_with_schemas() -> Result<(), Box<dyn std::error::Error>> {
    let import = parse_catalog_import(
        r#"{
            "pages": [{"path": "/job-detail/1", "entity_id": "job-1", "change_frequency": "daily"}],
            "schemas": [{"entity_id": "job-1", "schema_type": "JobPosting", "data": {"title": "Driver"}}]
        }"#,
    )?;

    assert_eq!(import.pages.len(), 1);
    assert_eq!(import.pages[0].entity_id.as_deref(), Some("job-1"));
    assert_eq!(import.pages[0].change_frequency, ChangeFrequency::Daily);
    assert_eq!(import.schemas.len(), 1);
    assert_eq!(import.schemas[0].schema_type, "JobPosting");
    assert!(import.schemas[0].data.is_some());
    Ok(())
}

#[test]
fn test_explicit_page_type_overrides_classification() -> Result<(), Box<dyn std::error::Error>> {
    let import = parse_catalog_import(r#"[{"path": "/blog/hiring-tips", "page_type": "article"}]"#)?;
    assert_eq!(import.pages[0].page_type, PageType::Article);
    Ok(())
}

#[test]
fn test_inactive_flag_is_kept() -> Result<(), Box<dyn std::error::Error>> {
    let import = parse_catalog_import(r#"[{"path": "/job-detail/9", "active": false}]"#)?;
    assert!(!import.pages[0].active);
    Ok(())
}

#[test]
fn test_unknown_page_type_is_rejected() {
    let result = parse_catalog_import(r#"[{"path": "/jobs", "page_type": "landing"}]"#);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("landing"));
}

#[test]
fn test_relative_path_is_rejected() {
    let result = parse_catalog_import(r#"[{"path": "jobs"}]"#);
    assert!(result.is_err());
}

#[test]
fn test_malformed_json_is_rejected() {
    assert!(parse_catalog_import("{ not json").is_err());
    assert!(parse_catalog_import(r#"{"schemas": []}"#).is_err());
}

#[test]
fn test_load_catalog_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(
        temp_file,
        r#"[{{"path": "/jobs"}}, {{"path": "/formations", "title": "Training"}}]"#
    )?;

    let import = load_catalog_from_file(temp_file.path())?;
    assert_eq!(import.pages.len(), 2);
    assert_eq!(import.pages[1].title, "Training");
    Ok(())
}

#[test]
fn test_load_catalog_from_empty_file_fails() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[]").unwrap();

    let result = load_catalog_from_file(temp_file.path());
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("No pages found"));
}

#[test]
fn test_load_catalog_from_nonexistent_file() {
    let path = PathBuf::from("/nonexistent/catalog.json");
    assert!(load_catalog_from_file(&path).is_err());
}

// ============================================================================
// Workspace helpers
// ============================================================================

#[test]
fn test_parse_format() {
    assert_eq!(parse_format("text").unwrap(), ReportFormat::Text);
    assert_eq!(parse_format("JSON").unwrap(), ReportFormat::Json);
    assert_eq!(parse_format("md").unwrap(), ReportFormat::Markdown);
    assert!(parse_format("html").is_err());
}

#[test]
fn test_resolve_data_dir_keeps_absolute_paths() {
    assert_eq!(resolve_data_dir("/tmp/seomesh"), PathBuf::from("/tmp/seomesh"));
}

#[test]
fn test_resolve_data_dir_expands_tilde() {
    let resolved = resolve_data_dir("~/.config/seomesh/");
    assert!(!resolved.to_string_lossy().starts_with('~'));
}

#[test]
fn test_workspace_requires_database() {
    let dir = TempDir::new().unwrap();
    let result = Workspace::open(dir.path());
    assert!(result.is_err());
    assert!(result.err().unwrap().to_string().contains("seomesh init"));
}

#[test]
fn test_workspace_opens_with_defaults_when_config_missing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    Database::new(&dir.path().join(DATABASE_FILE_NAME))?;

    let workspace = Workspace::open(dir.path())?;
    assert_eq!(workspace.config.linking.accept_threshold, 60);
    assert!(workspace.config.site.is_none());
    Ok(())
}

#[test]
fn test_workspace_reads_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    Database::new(&dir.path().join(DATABASE_FILE_NAME))?;
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[linking]\naccept_threshold = 75\n\n[site]\nname = \"Catalog\"\n",
    )?;

    let workspace = Workspace::open(dir.path())?;
    assert_eq!(workspace.config.linking.accept_threshold, 75);
    assert_eq!(workspace.config.site.map(|s| s.name).as_deref(), Some("Catalog"));
    Ok(())
}

#[test]
fn test_workspace_rejects_malformed_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    Database::new(&dir.path().join(DATABASE_FILE_NAME))?;
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[linking\n")?;

    assert!(Workspace::open(dir.path()).is_err());
    Ok(())
}

#[test]
fn test_default_config_round_trips_through_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, SeoConfig::default().to_toml())?;

    let loaded = SeoConfig::load(&path)?;
    assert_eq!(loaded.linking.suggestions_per_page, 5);
    assert_eq!(loaded.audit.quick_win_limit, 10);
    Ok(())
}

// ============================================================================
// Import into a workspace
// ============================================================================

#[test]
fn test_imported_catalog_is_queryable() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    Database::new(&dir.path().join(DATABASE_FILE_NAME))?;
    let workspace = Workspace::open(dir.path())?;

    let import = parse_catalog_import(
        r#"{
            "pages": [
                {"path": "/job-detail/1", "entity_id": "job-1", "category": "Finance"},
                {"path": "/jobs?sector=Finance"},
                {"path": "/job-detail/2", "active": false}
            ],
            "schemas": [{"entity_id": "job-1", "schema_type": "JobPosting"}]
        }"#,
    )?;
    workspace.db.import_pages(&import.pages)?;
    for schema in &import.schemas {
        workspace.db.add_schema(&schema.entity_id, &schema.schema_type, None)?;
    }

    assert_eq!(workspace.db.list_active_pages()?.len(), 2);
    assert_eq!(workspace.db.count_active_by_type(PageType::Detail)?, 1);
    assert!(workspace.db.has_active_schema("job-1")?);
    assert_eq!(workspace.db.count_inbound("/job-detail/1")?, 0);
    Ok(())
}

// ============================================================================
// Link suggestions
// ============================================================================

fn suggest_matches(data_dir: &std::path::Path, page: &str, accept: bool) -> ArgMatches {
    let mut argv = vec![
        "suggest".to_string(),
        "-d".to_string(),
        data_dir.display().to_string(),
        page.to_string(),
        "--seed".to_string(),
        "3".to_string(),
    ];
    if accept {
        argv.push("--accept".to_string());
    }
    Command::new("suggest")
        .arg(arg!(-d --"data-dir" <DIR>))
        .arg(arg!(<PAGE>))
        .arg(arg!(-l --"limit" <COUNT>).required(false).value_parser(value_parser!(usize)))
        .arg(arg!(--"seed" <SEED>).required(false).value_parser(value_parser!(u64)))
        .arg(arg!(--"accept").action(clap::ArgAction::SetTrue))
        .try_get_matches_from(argv)
        .unwrap()
}

fn workspace_with_pages(pages: &[Page]) -> TempDir {
    let dir = TempDir::new().unwrap();
    let db = Database::new(&dir.path().join(DATABASE_FILE_NAME)).unwrap();
    db.import_pages(pages).unwrap();
    dir
}

#[test]
fn test_suggest_for_unknown_page_finds_no_candidates() {
    let dir = workspace_with_pages(&[Page::new("/jobs"), Page::new("/job-detail/2").deactivated()]);

    assert!(handle_suggest(&suggest_matches(dir.path(), "/job-detail/9", false)).is_ok());
    assert!(handle_suggest(&suggest_matches(dir.path(), "/job-detail/2", true)).is_ok());

    let db = Database::new(&dir.path().join(DATABASE_FILE_NAME)).unwrap();
    assert!(db.list_all_links().unwrap().is_empty());
}

#[test]
fn test_suggest_accept_saves_links() {
    let dir = workspace_with_pages(&[
        Page::new("/job-detail/1").with_category("Finance"),
        Page::new("/jobs?sector=Finance"),
        Page::new("/jobs"),
    ]);

    assert!(handle_suggest(&suggest_matches(dir.path(), "/job-detail/1", true)).is_ok());

    let db = Database::new(&dir.path().join(DATABASE_FILE_NAME)).unwrap();
    let links = db.list_all_links().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].target, "/jobs?sector=Finance");
}
