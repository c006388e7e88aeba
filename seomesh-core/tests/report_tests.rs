// Tests for report generation functionality

use seomesh_core::audit::{AuditSummary, Auditor, FullAuditReport, PageScoreEntry};
use seomesh_core::batch::PageError;
use seomesh_core::config::SeoConfig;
use seomesh_core::data::Database;
use seomesh_core::model::Page;
use seomesh_core::report::{
    ReportFormat, generate_json_report, generate_markdown_report, generate_summary_json,
    generate_summary_markdown, generate_summary_text, generate_text_report, render_full_audit,
    render_summary, save_report,
};
use std::sync::Arc;
use tempfile::TempDir;

fn sample_full_audit() -> FullAuditReport {
    let db = Database::open_in_memory().unwrap();
    db.import_pages(&[
        Page::new("/job-detail/1").with_title("Accountant"),
        Page::new("/jobs").with_title("All job offers in Conakry and across the country"),
    ])
    .unwrap();
    Auditor::from_store(Arc::new(db), SeoConfig::default())
        .run_full_audit()
        .unwrap()
}

fn sample_summary() -> AuditSummary {
    AuditSummary {
        total_pages: 3,
        scored_pages: 2,
        average_score: 61,
        top_pages: vec![
            PageScoreEntry {
                path: "/job-detail/2".to_string(),
                score: 92,
            },
            PageScoreEntry {
                path: "/job-detail/1".to_string(),
                score: 30,
            },
        ],
        bottom_pages: vec![
            PageScoreEntry {
                path: "/job-detail/1".to_string(),
                score: 30,
            },
            PageScoreEntry {
                path: "/job-detail/2".to_string(),
                score: 92,
            },
        ],
        critical_issue_count: 2,
        warning_count: 3,
        errors: vec![PageError::new("/job-detail/3", "store offline")],
        timed_out: false,
    }
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert!(matches!(ReportFormat::from_str("text"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("txt"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("json"), Some(ReportFormat::Json)));
    assert!(matches!(ReportFormat::from_str("markdown"), Some(ReportFormat::Markdown)));
    assert!(matches!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown)));
}

#[test]
fn test_report_format_from_str_case_insensitive() {
    assert!(matches!(ReportFormat::from_str("TEXT"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("Json"), Some(ReportFormat::Json)));
}

#[test]
fn test_report_format_from_str_invalid() {
    assert!(ReportFormat::from_str("html").is_none());
    assert!(ReportFormat::from_str("pdf").is_none());
}

#[test]
fn test_report_format_extension() {
    assert_eq!(ReportFormat::Text.extension(), "txt");
    assert_eq!(ReportFormat::Json.extension(), "json");
    assert_eq!(ReportFormat::Markdown.extension(), "md");
}

// ============================================================================
// Full Audit Reports
// ============================================================================

#[test]
fn test_text_report_sections() {
    let audit = sample_full_audit();
    let report = generate_text_report(&audit);

    assert!(report.contains("SEOMESH FULL SITE AUDIT"));
    assert!(report.contains(&audit.id));
    assert!(report.contains("Pages Analyzed: 2"));
    assert!(report.contains("SCORES"));
    assert!(report.contains("ISSUES"));
    assert!(report.contains("Missing global SEO configuration"));
    assert!(report.contains("RECOMMENDATIONS"));
    assert!(report.contains("End of Report"));
}

#[test]
fn test_text_report_lists_issues_by_fix_priority() {
    let audit = sample_full_audit();
    let report = generate_text_report(&audit);

    let first = report.find(&audit.issues[0].title).unwrap();
    let last = report.find(&audit.issues[audit.issues.len() - 1].title).unwrap();
    assert!(first < last);
}

#[test]
fn test_json_report_embeds_the_audit() {
    let audit = sample_full_audit();
    let json = generate_json_report(&audit).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["report"]["metadata"]["generator"], "Seomesh");
    assert_eq!(parsed["report"]["audit"]["id"], audit.id.as_str());
    assert_eq!(
        parsed["report"]["audit"]["issues"].as_array().unwrap().len(),
        audit.issues.len()
    );

    let round_trip: FullAuditReport =
        serde_json::from_value(parsed["report"]["audit"].clone()).unwrap();
    assert_eq!(round_trip, audit);
}

#[test]
fn test_markdown_report_tables() {
    let audit = sample_full_audit();
    let report = generate_markdown_report(&audit);

    assert!(report.starts_with("# Full Site Audit"));
    assert!(report.contains("| Dimension | Score |"));
    assert!(report.contains("## Issues"));
    assert!(report.contains("## Recommendations"));
}

#[test]
fn test_render_full_audit_dispatches_on_format() {
    let audit = sample_full_audit();

    let text = render_full_audit(&audit, ReportFormat::Text).unwrap();
    let json = render_full_audit(&audit, ReportFormat::Json).unwrap();
    let markdown = render_full_audit(&audit, ReportFormat::Markdown).unwrap();

    assert!(text.contains("SEOMESH FULL SITE AUDIT"));
    assert!(json.trim_start().starts_with('{'));
    assert!(markdown.starts_with('#'));
}

// ============================================================================
// Summary Reports
// ============================================================================

#[test]
fn test_summary_text() {
    let report = generate_summary_text(&sample_summary());

    assert!(report.contains("SEOMESH PAGE AUDIT"));
    assert!(report.contains("Average score:   61/100"));
    assert!(report.contains("TOP PAGES"));
    assert!(report.contains("PAGES NEEDING ATTENTION"));
    assert!(report.contains("[!] /job-detail/3: store offline"));
    assert!(!report.contains("timed out"));
}

#[test]
fn test_summary_text_flags_timeouts() {
    let mut summary = sample_summary();
    summary.timed_out = true;
    let report = generate_summary_text(&summary);
    assert!(report.contains("timed out (partial results)"));
}

#[test]
fn test_summary_text_with_no_pages() {
    let report = generate_summary_text(&AuditSummary::default());
    assert!(report.contains("(none)"));
    assert!(!report.contains("ERRORS"));
}

#[test]
fn test_summary_json() {
    let json = generate_summary_json(&sample_summary()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed["report"]["summary"]["average_score"], 61);
    assert_eq!(parsed["report"]["summary"]["errors"][0]["path"], "/job-detail/3");
}

#[test]
fn test_summary_markdown() {
    let report = generate_summary_markdown(&sample_summary());
    assert!(report.contains("# Page Audit Summary"));
    assert!(report.contains("| `/job-detail/2` | 92 |"));
    assert!(render_summary(&sample_summary(), ReportFormat::Markdown).unwrap() == report);
}

// ============================================================================
// File Output
// ============================================================================

#[test]
fn test_save_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("audit.md");

    let content = generate_summary_markdown(&sample_summary());
    save_report(&content, &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn test_save_report_to_missing_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing").join("audit.txt");
    assert!(save_report("content", &path).is_err());
}
