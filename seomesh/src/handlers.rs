use anyhow::{Context, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use seomesh_core::audit::Auditor;
use seomesh_core::batch::ProgressCallback;
use seomesh_core::catalog::{AuditStore, CatalogSnapshot};
use seomesh_core::config::{CONFIG_FILE_NAME, SeoConfig};
use seomesh_core::data::Database;
use seomesh_core::graph::GraphAnalyzer;
use seomesh_core::linking::{LinkGraphBuilder, accept_suggestions, rescore_links, validate_links};
use seomesh_core::model::{ChangeFrequency, Page, PageType, Priority, SocialPreview};
use seomesh_core::network::{NetworkOptions, build_link_network};
use seomesh_core::report::{ReportFormat, render_full_audit, render_summary, save_report};
use seomesh_core::scoring::IssueKind;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DATABASE_FILE_NAME: &str = "seomesh.db";
const PAGE_RANK_DAMPING: f64 = 0.85;
const PAGE_RANK_ITERATIONS: usize = 50;

// Catalog import

fn default_active() -> bool {
    true
}

/// One page as it appears in an import file. Only `path` is required; the
/// page type and listing attributes are derived from it unless given.
#[derive(Debug, Clone, Deserialize)]
pub struct PageImport {
    pub path: String,
    #[serde(default)]
    pub page_type: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub priority: Option<f64>,
    #[serde(default)]
    pub change_frequency: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub social: SocialPreview,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
}

impl PageImport {
    pub fn into_page(self) -> anyhow::Result<Page> {
        if !self.path.starts_with('/') {
            bail!("Page path '{}' must start with '/'", self.path);
        }

        let mut page = Page::new(self.path.clone())
            .with_title(self.title)
            .with_description(self.description)
            .with_keywords(self.keywords)
            .with_social(self.social);

        if let Some(kind) = self.page_type {
            page.page_type = PageType::from_str(&kind)
                .ok_or_else(|| anyhow!("Unknown page type '{}' for {}", kind, self.path))?;
        }
        if let Some(frequency) = self.change_frequency {
            let frequency = ChangeFrequency::from_str(&frequency).ok_or_else(|| {
                anyhow!("Unknown change frequency '{}' for {}", frequency, self.path)
            })?;
            page = page.with_change_frequency(frequency);
        }
        if let Some(url) = self.canonical_url {
            page = page.with_canonical(url);
        }
        if let Some(priority) = self.priority {
            page = page.with_priority(priority);
        }
        if let Some(category) = self.category {
            page = page.with_category(category);
        }
        if let Some(locality) = self.locality {
            page = page.with_locality(locality);
        }
        if let Some(entity_id) = self.entity_id {
            page = page.with_entity(entity_id);
        }
        if !self.active {
            page = page.deactivated();
        }

        Ok(page)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaImport {
    pub entity_id: String,
    pub schema_type: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImportFile {
    Pages(Vec<PageImport>),
    Catalog {
        pages: Vec<PageImport>,
        #[serde(default)]
        schemas: Vec<SchemaImport>,
    },
}

#[derive(Debug, Default)]
pub struct CatalogImport {
    pub pages: Vec<Page>,
    pub schemas: Vec<SchemaImport>,
}

/// Parse an import document: either a bare array of pages or an object with
/// `pages` and optional `schemas`.
pub fn parse_catalog_import(content: &str) -> anyhow::Result<CatalogImport> {
    let file: ImportFile =
        serde_json::from_str(content).context("Import file is not a page array or catalog object")?;
    let (pages, schemas) = match file {
        ImportFile::Pages(pages) => (pages, Vec::new()),
        ImportFile::Catalog { pages, schemas } => (pages, schemas),
    };

    let pages = pages
        .into_iter()
        .map(PageImport::into_page)
        .collect::<anyhow::Result<Vec<Page>>>()?;
    Ok(CatalogImport { pages, schemas })
}

/// Load and parse a catalog import file
pub fn load_catalog_from_file(path: &Path) -> anyhow::Result<CatalogImport> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file {}", path.display()))?;
    let import = parse_catalog_import(&content)?;
    if import.pages.is_empty() {
        bail!("No pages found in {}", path.display());
    }
    Ok(import)
}

// Workspace helpers

pub fn resolve_data_dir(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn parse_format(raw: &str) -> anyhow::Result<ReportFormat> {
    ReportFormat::from_str(raw).ok_or_else(|| anyhow!("Unknown report format '{}'", raw))
}

/// Open database and config living in a data directory
pub struct Workspace {
    pub data_dir: PathBuf,
    pub db: Arc<Database>,
    pub config: SeoConfig,
}

impl Workspace {
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let db_path = data_dir.join(DATABASE_FILE_NAME);
        if !Database::exists(&db_path) {
            bail!(
                "No database at {}. Run `seomesh init` first.",
                db_path.display()
            );
        }
        let db = Database::new(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        let config = SeoConfig::load(&data_dir.join(CONFIG_FILE_NAME))
            .with_context(|| format!("Failed to load {}", CONFIG_FILE_NAME))?;
        debug!("Opened workspace at {}", data_dir.display());

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            db: Arc::new(db),
            config,
        })
    }

    pub fn from_args(args: &ArgMatches) -> anyhow::Result<Self> {
        Self::open(&data_dir_arg(args))
    }

    pub fn auditor(&self) -> Auditor {
        Auditor::from_store(self.db.clone(), self.config.clone())
    }
}

fn data_dir_arg(args: &ArgMatches) -> PathBuf {
    let raw = args
        .get_one::<String>("data-dir")
        .map(String::as_str)
        .unwrap_or("~/.config/seomesh/");
    resolve_data_dir(raw)
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_heading(title: &str) {
    print_divider();
    println!("{}", format!("  {}", title).bright_white().bold());
    print_divider();
    println!();
}

fn print_prompt(msg: &str) -> String {
    print!("{} ", msg.bright_cyan().bold());
    let _ = io::stdout().flush();
    let mut response = String::new();
    if io::stdin().read_line(&mut response).is_err() {
        return String::new();
    }
    response.trim().to_lowercase()
}

fn progress_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message.to_string());
    spinner
}

fn spinner_callback(spinner: &ProgressBar) -> ProgressCallback {
    let spinner = spinner.clone();
    Arc::new(move |msg: String| spinner.set_message(msg))
}

fn emit_report(content: &str, output: Option<&PathBuf>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            save_report(content, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "{} Report saved to: {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn colored_score(score: u8) -> colored::ColoredString {
    let text = format!("{:>3}", score);
    match score {
        80..=100 => text.green().bold(),
        50..=79 => text.yellow().bold(),
        _ => text.red().bold(),
    }
}

fn colored_priority(priority: Priority) -> colored::ColoredString {
    let label = format!("{:<8}", priority.as_str().to_uppercase());
    match priority {
        Priority::Critical => label.red().bold(),
        Priority::High => label.yellow().bold(),
        Priority::Medium => label.blue(),
        Priority::Low => label.normal(),
    }
}

// Handlers

pub fn handle_init(args: &ArgMatches) -> anyhow::Result<()> {
    print_heading("SEOMESH INITIALIZATION");

    let force = args.get_flag("force");
    let data_dir = data_dir_arg(args);
    let db_path = data_dir.join(DATABASE_FILE_NAME);
    let config_path = data_dir.join(CONFIG_FILE_NAME);

    println!(
        "{} Target: {}",
        "→".blue(),
        data_dir.display().to_string().bright_white()
    );
    println!();

    let db_exists = Database::exists(&db_path);
    let config_exists = config_path.exists();

    if (db_exists || config_exists) && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("Existing seomesh files found:");
        for path in [&db_path, &config_path].into_iter().filter(|p| p.exists()) {
            println!(
                "  {} {}",
                "•".yellow(),
                path.display().to_string().bright_white()
            );
        }
        println!();
        println!("{}", "This operation will overwrite existing files.".yellow());

        let response = print_prompt("Do you want to continue? [y/N]:");
        println!();

        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(());
        }
        println!("{} Proceeding with overwrite", "→".yellow().bold());
        println!();
    }

    println!("{} Creating directory structure...", "→".blue());
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    println!(
        "  {} {}",
        "✓".green(),
        data_dir.display().to_string().bright_white()
    );

    if db_exists {
        Database::drop(&db_path)?;
        println!("{} Existing database removed", "✓".green().bold());
    }

    println!("{} Creating database...", "→".blue());
    Database::new(&db_path)
        .with_context(|| format!("Failed to create database {}", db_path.display()))?;

    println!("{} Writing default config...", "→".blue());
    fs::write(&config_path, SeoConfig::default().to_toml())
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!();
    print_heading("INITIALIZATION COMPLETE");
    println!(
        "{} Database: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );
    println!(
        "{} Config: {}",
        "✓".green().bold(),
        config_path.display().to_string().bright_white()
    );
    println!();
    Ok(())
}

pub fn handle_import(args: &ArgMatches) -> anyhow::Result<()> {
    let workspace = Workspace::from_args(args)?;
    let file = args
        .get_one::<PathBuf>("FILE")
        .ok_or_else(|| anyhow!("An import file is required"))?;

    let import = load_catalog_from_file(file)?;
    println!(
        "{} Parsed {} pages and {} schemas",
        "✓".green().bold(),
        import.pages.len().to_string().cyan(),
        import.schemas.len().to_string().cyan()
    );

    let imported = workspace.db.import_pages(&import.pages)?;
    for schema in &import.schemas {
        let data = schema.data.as_ref().map(|v| v.to_string());
        workspace
            .db
            .add_schema(&schema.entity_id, &schema.schema_type, data.as_deref())?;
    }

    println!(
        "{} Imported {} pages into {}",
        "✓".green().bold(),
        imported.to_string().cyan(),
        workspace.data_dir.display().to_string().bright_white()
    );
    Ok(())
}

pub fn handle_suggest(args: &ArgMatches) -> anyhow::Result<()> {
    let workspace = Workspace::from_args(args)?;
    let path = args
        .get_one::<String>("PAGE")
        .ok_or_else(|| anyhow!("A page path is required"))?;
    let limit = args
        .get_one::<usize>("limit")
        .copied()
        .unwrap_or(workspace.config.linking.suggestions_per_page);

    let snapshot = CatalogSnapshot::load(workspace.db.as_ref())?;
    let mut rng = match args.get_one::<u64>("seed") {
        Some(seed) => StdRng::seed_from_u64(*seed),
        None => StdRng::from_entropy(),
    };
    let suggestions =
        LinkGraphBuilder::new(&snapshot, &workspace.config.linking).suggest_links(path, limit, &mut rng);

    print_heading(&format!("LINK SUGGESTIONS FOR {}", path));
    if suggestions.is_empty() {
        println!("{} No candidates found", "ℹ".blue());
        return Ok(());
    }

    for suggestion in &suggestions {
        println!(
            "{} {} {}",
            colored_score(suggestion.relevance),
            suggestion.target.bright_white(),
            format!("({})", suggestion.link_type.as_str()).bright_black()
        );
        println!("      {} \"{}\"", "anchor:".blue(), suggestion.anchor_text);
        println!("      {} {}", "reason:".blue(), suggestion.reason);
    }
    println!();

    if args.get_flag("accept") {
        let threshold = workspace.config.linking.accept_threshold;
        let accepted = accept_suggestions(workspace.db.as_ref(), &suggestions, threshold);
        println!(
            "{} Saved {} new and {} updated links at or above relevance {}",
            "✓".green().bold(),
            accepted.created.to_string().cyan(),
            accepted.updated.to_string().cyan(),
            threshold
        );
        for (target, e) in &accepted.failures {
            println!("  {} {}: {}", "✗".red(), target, e);
        }
        if !accepted.is_complete() {
            bail!("{} link writes failed", accepted.failures.len());
        }
    }
    Ok(())
}

pub fn handle_analyze(args: &ArgMatches) -> anyhow::Result<()> {
    let workspace = Workspace::from_args(args)?;
    let snapshot = CatalogSnapshot::load(workspace.db.as_ref())?;
    let analyzer = GraphAnalyzer::new(&snapshot, workspace.db.as_ref());
    let stats = analyzer.analyze()?;

    print_heading("LINK GRAPH");
    println!("  Active pages:     {}", stats.active_pages);
    println!("  Total links:      {}", stats.total_links);
    println!("  Active links:     {}", stats.active_links);
    println!("  Broken links:     {}", stats.broken_links);
    println!("  Orphan pages:     {}", stats.orphan_pages);
    println!("  Average density:  {:.2}", stats.average_density);
    println!("  Authority:        {}/100", colored_score(stats.authority_estimate));
    println!();

    if !stats.orphan_paths.is_empty() {
        println!("{}", "ORPHAN PAGES".yellow().bold());
        for path in stats.orphan_paths.iter().take(20) {
            println!("  {} {}", "•".yellow(), path);
        }
        if stats.orphan_paths.len() > 20 {
            println!("  ... and {} more", stats.orphan_paths.len() - 20);
        }
        println!();
    }

    if let Some(top) = args.get_one::<usize>("page-rank") {
        println!("{}", "PAGERANK".bright_blue().bold());
        let ranks = analyzer.iterative_page_rank(PAGE_RANK_DAMPING, PAGE_RANK_ITERATIONS)?;
        for (path, rank) in ranks.iter().take(*top) {
            println!("  {:.4}  {}", rank, path);
        }
        println!();
    }
    Ok(())
}

pub fn handle_profile(args: &ArgMatches) -> anyhow::Result<()> {
    let workspace = Workspace::from_args(args)?;
    let path = args
        .get_one::<String>("PAGE")
        .ok_or_else(|| anyhow!("A page path is required"))?;

    let snapshot = CatalogSnapshot::load(workspace.db.as_ref())?;
    let profile = GraphAnalyzer::new(&snapshot, workspace.db.as_ref()).page_link_profile(path)?;

    print_heading(&format!("LINK PROFILE FOR {}", profile.path));
    println!("  Inbound:    {}", profile.inbound);
    println!("  Outbound:   {}", profile.outbound);
    println!("  Authority:  {}/100", colored_score(profile.authority));
    println!();
    for suggestion in &profile.suggestions {
        println!("  {} {}", "→".blue(), suggestion);
    }
    Ok(())
}

pub fn handle_score(args: &ArgMatches) -> anyhow::Result<()> {
    let workspace = Workspace::from_args(args)?;
    let path = args
        .get_one::<String>("PAGE")
        .ok_or_else(|| anyhow!("A page path is required"))?;

    let audit = workspace.auditor().audit_page(path)?;
    workspace.db.save_score(&audit.score)?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&audit)?);
        return Ok(());
    }

    let score = &audit.score;
    print_heading(&format!("PAGE SCORE FOR {}", audit.path));
    println!("  Overall:    {}/100", colored_score(score.overall));
    println!("  Technical:  {}/100", colored_score(score.technical));
    println!("  Content:    {}/100", colored_score(score.content));
    println!("  On-page:    {}/100", colored_score(score.on_page));
    println!("  Off-page:   {}/100", colored_score(score.off_page));
    println!();

    if !audit.issues.is_empty() {
        println!("{}", "ISSUES".yellow().bold());
        for issue in &audit.issues {
            let marker = match issue.kind {
                IssueKind::Error => "✗".red().bold(),
                IssueKind::Warning => "⚠".yellow().bold(),
                IssueKind::Info => "ℹ".blue(),
            };
            println!("  {} [{}] {}", marker, issue.category.as_str(), issue.message);
            println!("      {} {}", "fix:".blue(), issue.fix);
        }
        println!();
    }

    if !audit.recommendations.is_empty() {
        println!("{}", "RECOMMENDATIONS".bright_blue().bold());
        for recommendation in &audit.recommendations {
            println!("  {} {}", "→".blue(), recommendation);
        }
        println!();
    }
    Ok(())
}

pub async fn handle_audit(args: &ArgMatches) -> anyhow::Result<()> {
    let workspace = Workspace::from_args(args)?;
    let format = parse_format(
        args.get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("text"),
    )?;
    let sample = args
        .get_one::<usize>("sample")
        .copied()
        .unwrap_or(workspace.config.audit.sample_limit);

    let spinner = progress_spinner("Scoring pages...");
    let auditor = workspace.auditor().with_progress(spinner_callback(&spinner));
    let summary = auditor.audit_all(sample).await;
    spinner.finish_and_clear();
    let summary = summary?;

    println!(
        "{} Scored {} of {} sampled pages",
        "✓".green().bold(),
        summary.scored_pages.to_string().cyan(),
        summary.total_pages.to_string().cyan()
    );
    if summary.timed_out {
        println!("{} Audit timed out, results are partial", "⚠".yellow().bold());
    }
    println!();

    let report = render_summary(&summary, format)?;
    emit_report(&report, args.get_one::<PathBuf>("output"))
}

pub fn handle_quick_wins(args: &ArgMatches) -> anyhow::Result<()> {
    let workspace = Workspace::from_args(args)?;
    let items = workspace.auditor().quick_wins()?;

    print_heading("QUICK WINS");
    if items.is_empty() {
        println!("{} Nothing to fix", "✓".green().bold());
        return Ok(());
    }

    for item in &items {
        println!(
            "  {} {} {}",
            colored_priority(item.priority),
            item.title.bright_white(),
            format!("(impact {}, effort {})", item.impact, item.effort).bright_black()
        );
        println!("           {}", item.description);
    }
    println!();
    Ok(())
}

pub fn handle_full_audit(args: &ArgMatches) -> anyhow::Result<()> {
    let workspace = Workspace::from_args(args)?;
    let format = parse_format(
        args.get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("text"),
    )?;

    let spinner = progress_spinner("Running full site audit...");
    let report = workspace.auditor().run_full_audit();
    spinner.finish_and_clear();
    let report = report?;

    workspace.db.save_full_audit(&report)?;
    println!(
        "{} Audit {} saved ({} issues, overall {}/100)",
        "✓".green().bold(),
        report.id.bright_white(),
        report.issues.len().to_string().cyan(),
        colored_score(report.overall_score)
    );
    println!();

    let rendered = render_full_audit(&report, format)?;
    emit_report(&rendered, args.get_one::<PathBuf>("output"))
}

pub async fn handle_build_network(args: &ArgMatches) -> anyhow::Result<()> {
    let workspace = Workspace::from_args(args)?;
    let config = &workspace.config;

    let spinner = progress_spinner("Building link network...");
    let mut options = NetworkOptions::new(config.linking.clone(), &config.batch)
        .with_progress(spinner_callback(&spinner));
    if let Some(seed) = args.get_one::<u64>("seed") {
        options = options.with_seed(*seed);
    }
    if let Some(limit) = args.get_one::<usize>("limit") {
        options = options.with_page_limit(*limit);
    }

    let report = build_link_network(workspace.db.clone(), workspace.db.clone(), options).await;
    spinner.finish_and_clear();
    let report = report?;

    print_heading("LINK NETWORK");
    println!(
        "{} {} links created, {} updated over {} pages",
        "✓".green().bold(),
        report.links_created.to_string().cyan(),
        report.links_updated.to_string().cyan(),
        report.pages_processed.to_string().cyan()
    );
    if report.timed_out {
        println!("{} Build timed out, results are partial", "⚠".yellow().bold());
    }
    if !report.errors.is_empty() {
        println!();
        println!("{}", "ERRORS".red().bold());
        for error in &report.errors {
            println!("  {} {}: {}", "✗".red(), error.path, error.message);
        }
    }
    println!();
    Ok(())
}

pub fn handle_validate(args: &ArgMatches) -> anyhow::Result<()> {
    let workspace = Workspace::from_args(args)?;
    let snapshot = CatalogSnapshot::load(workspace.db.as_ref())?;

    let broken = validate_links(&snapshot, workspace.db.as_ref())?;
    println!(
        "{} {} links marked broken",
        "✓".green().bold(),
        broken.to_string().cyan()
    );

    if args.get_flag("rescore") {
        let updated = rescore_links(&snapshot, workspace.db.as_ref())?;
        println!(
            "{} {} links rescored",
            "✓".green().bold(),
            updated.to_string().cyan()
        );
    }
    Ok(())
}

pub fn handle_history(args: &ArgMatches) -> anyhow::Result<()> {
    let workspace = Workspace::from_args(args)?;
    let limit = args.get_one::<usize>("limit").copied().unwrap_or(10);
    let audits = workspace.db.full_audit_history(limit)?;

    print_heading("AUDIT HISTORY");
    if audits.is_empty() {
        println!("{} No audits recorded yet", "ℹ".blue());
        return Ok(());
    }

    for audit in &audits {
        let critical = audit
            .issues
            .iter()
            .filter(|i| i.severity == Priority::Critical)
            .count();
        println!(
            "  {}  {}/100  {} pages  {} issues ({} critical)  {}",
            audit.audited_at.format("%Y-%m-%d %H:%M"),
            colored_score(audit.overall_score),
            audit.pages_analyzed,
            audit.issues.len(),
            critical.to_string().red(),
            audit.id.bright_black()
        );
    }
    println!();
    Ok(())
}
