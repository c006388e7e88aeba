// Tests for loading seomesh.toml

use seomesh_core::SeoError;
use seomesh_core::config::{CONFIG_FILE_NAME, SeoConfig};
use tempfile::TempDir;

#[test]
fn test_missing_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = SeoConfig::load(&temp_dir.path().join(CONFIG_FILE_NAME)).unwrap();

    assert_eq!(config.linking.suggestions_per_page, 5);
    assert_eq!(config.linking.resource_path, "/formations");
    assert_eq!(config.batch.timeout_secs, 120);
    assert!(config.site.is_none());
}

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        r#"
[linking]
accept_threshold = 80
root_list_path = "/offers"

[audit]
quick_win_limit = 3

[content]
brand_terms = ["Acme"]

[site]
name = "Acme careers"
search_console_verification = "abc123"
"#,
    )
    .unwrap();

    let config = SeoConfig::load(&path).unwrap();
    assert_eq!(config.linking.accept_threshold, 80);
    assert_eq!(config.linking.root_list_path, "/offers");
    assert_eq!(config.linking.related_detail_limit, 3);
    assert_eq!(config.audit.quick_win_limit, 3);
    assert_eq!(config.audit.sample_limit, 50);
    assert_eq!(config.content.brand_terms, vec!["Acme"]);
    assert!(!config.content.action_verbs.is_empty());

    let site = config.site.unwrap();
    assert_eq!(site.name, "Acme careers");
    assert_eq!(site.search_console_verification.as_deref(), Some("abc123"));
}

#[test]
fn test_malformed_file_is_a_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "[batch]\nconcurrency = -1\n").unwrap();

    assert!(matches!(SeoConfig::load(&path), Err(SeoError::Config(_))));
}

#[test]
fn test_written_config_reloads_identically() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(CONFIG_FILE_NAME);
    let mut original = SeoConfig::with_site("Catalog");
    original.linking.accept_threshold = 70;
    std::fs::write(&path, original.to_toml()).unwrap();

    let reloaded = SeoConfig::load(&path).unwrap();
    assert_eq!(reloaded.linking.accept_threshold, 70);
    assert_eq!(reloaded.site.map(|s| s.name).as_deref(), Some("Catalog"));
    assert_eq!(reloaded.content.brand_terms, original.content.brand_terms);
}
