// Report rendering for audit results

use crate::audit::{AuditSummary, FullAuditReport, PageScoreEntry};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEAVY_RULE: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";
const LIGHT_RULE: &str =
    "────────────────────────────────────────────────────────────────────────────────\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "md",
        }
    }
}

pub fn render_full_audit(report: &FullAuditReport, format: ReportFormat) -> Result<String> {
    Ok(match format {
        ReportFormat::Text => generate_text_report(report),
        ReportFormat::Json => generate_json_report(report)?,
        ReportFormat::Markdown => generate_markdown_report(report),
    })
}

pub fn render_summary(summary: &AuditSummary, format: ReportFormat) -> Result<String> {
    Ok(match format {
        ReportFormat::Text => generate_summary_text(summary),
        ReportFormat::Json => generate_summary_json(summary)?,
        ReportFormat::Markdown => generate_summary_markdown(summary),
    })
}

fn section(report: &mut String, title: &str) {
    report.push_str(HEAVY_RULE);
    report.push_str(title);
    report.push('\n');
    report.push_str(HEAVY_RULE);
    report.push('\n');
}

pub fn generate_text_report(data: &FullAuditReport) -> String {
    let mut report = String::new();

    report.push_str(HEAVY_RULE);
    report.push_str("                           SEOMESH FULL SITE AUDIT\n");
    report.push_str(HEAVY_RULE);
    report.push('\n');

    report.push_str(&format!("Audit ID:       {}\n", data.id));
    report.push_str(&format!("Audit Date:     {}\n", format_timestamp(&data.audited_at)));
    report.push_str(&format!("Pages Analyzed: {}\n\n", data.pages_analyzed));

    section(&mut report, "SCORES");
    report.push_str(&format!("  Overall:      {:>3}/100\n", data.overall_score));
    report.push_str(&format!("  Technical:    {:>3}/100\n", data.technical_score));
    report.push_str(&format!("  Content:      {:>3}/100\n", data.content_score));
    report.push_str(&format!("  Semantic:     {:>3}/100\n", data.semantic_score));
    report.push_str(&format!("  Performance:  {:>3}/100\n\n", data.performance_score));

    if !data.issues.is_empty() {
        section(&mut report, "ISSUES");
        for (idx, issue) in data.issues.iter().enumerate() {
            report.push_str(&format!("[{}] {}\n", idx + 1, issue.title));
            report.push_str(&format!("Severity:     {}\n", issue.severity.as_str().to_uppercase()));
            report.push_str(&format!("Category:     {}\n", issue.category.as_str()));
            report.push_str(&format!("Priority:     {}\n", issue.fix_priority));
            report.push_str(&format!("Affected:     {}\n", format_affected(&issue.affected_pages)));
            report.push_str("\nDescription:\n");
            report.push_str(&wrap_text(&issue.description, 80, "  "));
            report.push('\n');
            report.push_str(LIGHT_RULE);
            report.push('\n');
        }
    }

    if !data.opportunities.is_empty() {
        section(&mut report, "OPPORTUNITIES");
        for opportunity in &data.opportunities {
            report.push_str(&format!(
                "  [{}] {} (impact {}, effort {})\n",
                opportunity.kind.as_str(),
                opportunity.title,
                opportunity.impact.as_str(),
                opportunity.effort.as_str()
            ));
            report.push_str(&wrap_text(&opportunity.description, 80, "      "));
        }
        report.push('\n');
    }

    if !data.recommendations.is_empty() {
        section(&mut report, "RECOMMENDATIONS");
        for (idx, recommendation) in data.recommendations.iter().enumerate() {
            report.push_str(&format!(
                "{}. {} ({})\n",
                idx + 1,
                recommendation.title,
                recommendation.timeline
            ));
            report.push_str(&wrap_text(&recommendation.description, 80, "   "));
            for step in &recommendation.steps {
                report.push_str(&format!("   - {}\n", step));
            }
            report.push_str(&format!("   Expected: {}\n\n", recommendation.expected_results));
        }
    }

    report.push_str(HEAVY_RULE);
    report.push_str("                                End of Report\n");
    report.push_str(HEAVY_RULE);
    report
}

pub fn generate_json_report(data: &FullAuditReport) -> std::result::Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Seomesh",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": Utc::now().to_rfc3339(),
                "format": "json"
            },
            "audit": data,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_markdown_report(data: &FullAuditReport) -> String {
    let mut report = String::new();

    report.push_str("# Full Site Audit\n\n");
    report.push_str(&format!("- **Audit ID:** `{}`\n", data.id));
    report.push_str(&format!("- **Date:** {}\n", format_timestamp(&data.audited_at)));
    report.push_str(&format!("- **Pages analyzed:** {}\n\n", data.pages_analyzed));

    report.push_str("## Scores\n\n");
    report.push_str("| Dimension | Score |\n|---|---|\n");
    report.push_str(&format!("| Overall | {} |\n", data.overall_score));
    report.push_str(&format!("| Technical | {} |\n", data.technical_score));
    report.push_str(&format!("| Content | {} |\n", data.content_score));
    report.push_str(&format!("| Semantic | {} |\n", data.semantic_score));
    report.push_str(&format!("| Performance | {} |\n\n", data.performance_score));

    if !data.issues.is_empty() {
        report.push_str("## Issues\n\n");
        report.push_str("| Priority | Severity | Category | Issue | Affected |\n|---|---|---|---|---|\n");
        for issue in &data.issues {
            report.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                issue.fix_priority,
                issue.severity.as_str(),
                issue.category.as_str(),
                issue.title,
                issue.affected_pages.len()
            ));
        }
        report.push('\n');
    }

    if !data.opportunities.is_empty() {
        report.push_str("## Opportunities\n\n");
        for opportunity in &data.opportunities {
            report.push_str(&format!(
                "- **{}** ({}, impact {}, effort {}): {}\n",
                opportunity.title,
                opportunity.kind.as_str(),
                opportunity.impact.as_str(),
                opportunity.effort.as_str(),
                opportunity.description
            ));
        }
        report.push('\n');
    }

    if !data.recommendations.is_empty() {
        report.push_str("## Recommendations\n\n");
        for recommendation in &data.recommendations {
            report.push_str(&format!(
                "### {} _({})_\n\n{}\n\n",
                recommendation.title, recommendation.timeline, recommendation.description
            ));
            for step in &recommendation.steps {
                report.push_str(&format!("1. {}\n", step));
            }
            report.push_str(&format!("\n**Expected:** {}\n\n", recommendation.expected_results));
        }
    }

    report
}

pub fn generate_summary_text(summary: &AuditSummary) -> String {
    let mut report = String::new();

    report.push_str(HEAVY_RULE);
    report.push_str("                            SEOMESH PAGE AUDIT\n");
    report.push_str(HEAVY_RULE);
    report.push('\n');

    report.push_str(&format!("Pages sampled:   {}\n", summary.total_pages));
    report.push_str(&format!("Pages scored:    {}\n", summary.scored_pages));
    report.push_str(&format!("Average score:   {}/100\n", summary.average_score));
    report.push_str(&format!("Critical issues: {}\n", summary.critical_issue_count));
    report.push_str(&format!("Warnings:        {}\n", summary.warning_count));
    if summary.timed_out {
        report.push_str("Status:          timed out (partial results)\n");
    }
    report.push('\n');

    section(&mut report, "TOP PAGES");
    report.push_str(&format_entries(&summary.top_pages));
    report.push('\n');

    section(&mut report, "PAGES NEEDING ATTENTION");
    report.push_str(&format_entries(&summary.bottom_pages));
    report.push('\n');

    if !summary.errors.is_empty() {
        section(&mut report, "ERRORS");
        for error in &summary.errors {
            report.push_str(&format!("  [!] {}: {}\n", error.path, error.message));
        }
        report.push('\n');
    }

    report
}

pub fn generate_summary_json(summary: &AuditSummary) -> std::result::Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Seomesh",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": Utc::now().to_rfc3339(),
                "format": "json"
            },
            "summary": summary,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_summary_markdown(summary: &AuditSummary) -> String {
    let mut report = String::new();

    report.push_str("# Page Audit Summary\n\n");
    report.push_str(&format!("- **Pages sampled:** {}\n", summary.total_pages));
    report.push_str(&format!("- **Pages scored:** {}\n", summary.scored_pages));
    report.push_str(&format!("- **Average score:** {}\n", summary.average_score));
    report.push_str(&format!("- **Critical issues:** {}\n", summary.critical_issue_count));
    report.push_str(&format!("- **Warnings:** {}\n", summary.warning_count));
    if summary.timed_out {
        report.push_str("- **Timed out:** yes\n");
    }

    for (title, entries) in [
        ("Top pages", &summary.top_pages),
        ("Pages needing attention", &summary.bottom_pages),
    ] {
        report.push_str(&format!("\n## {}\n\n| Page | Score |\n|---|---|\n", title));
        for entry in entries {
            report.push_str(&format!("| `{}` | {} |\n", entry.path, entry.score));
        }
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

// Helper functions

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn format_entries(entries: &[PageScoreEntry]) -> String {
    if entries.is_empty() {
        return "  (none)\n".to_string();
    }
    entries
        .iter()
        .map(|e| format!("  {:>3}  {}\n", e.score, e.path))
        .collect()
}

fn format_affected(pages: &[String]) -> String {
    match pages.len() {
        0 => "none".to_string(),
        1..=3 => pages.join(", "),
        n => format!("{}, ... ({} pages)", pages[..3].join(", "), n),
    }
}

fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    let mut result = String::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.len() + word.len() + 1 > width - indent.len() && !current_line.is_empty() {
            result.push_str(indent);
            result.push_str(&current_line);
            result.push('\n');
            current_line.clear();
        }

        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        result.push_str(indent);
        result.push_str(&current_line);
        result.push('\n');
    }

    result
}
