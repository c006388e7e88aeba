// Catalog-wide audits: sampled scoring, quick wins and the full-site audit

use crate::batch::{BatchOptions, PageError, ProgressCallback, run_batch};
use crate::catalog::{CatalogSnapshot, LinkFilter, LinkStore, PageCatalog, SchemaStore};
use crate::config::{SeoConfig, SiteProfile};
use crate::error::{Result, SeoError};
use crate::graph::GraphAnalyzer;
use crate::model::{ActionItem, PageType, Priority};
use crate::scoring::{IssueKind, PageAudit, QualityScorer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const RANKED_PAGES: usize = 5;
const PRIORITY_PAGE_THRESHOLD: f64 = 0.8;
const MIN_PRIORITY_PAGES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageScoreEntry {
    pub path: String,
    pub score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Active pages in the sample.
    pub total_pages: usize,
    pub scored_pages: usize,
    pub average_score: u8,
    pub top_pages: Vec<PageScoreEntry>,
    /// Lowest first.
    pub bottom_pages: Vec<PageScoreEntry>,
    pub critical_issue_count: usize,
    pub warning_count: usize,
    pub errors: Vec<PageError>,
    pub timed_out: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditArea {
    Technical,
    Content,
    Semantic,
    Performance,
}

impl AuditArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditArea::Technical => "technical",
            AuditArea::Content => "content",
            AuditArea::Semantic => "semantic",
            AuditArea::Performance => "performance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    QuickWin,
    Strategic,
    LongTerm,
}

impl OpportunityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityKind::QuickWin => "quick_win",
            OpportunityKind::Strategic => "strategic",
            OpportunityKind::LongTerm => "long_term",
        }
    }
}

/// Coarse impact or effort estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::High => "high",
            Level::Medium => "medium",
            Level::Low => "low",
        }
    }

    pub fn impact_weight(&self) -> u8 {
        match self {
            Level::High => 3,
            Level::Medium => 2,
            Level::Low => 1,
        }
    }

    pub fn effort_weight(&self) -> u8 {
        match self {
            Level::Low => 3,
            Level::Medium => 2,
            Level::High => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoIssue {
    pub id: String,
    pub severity: Priority,
    pub category: AuditArea,
    pub title: String,
    pub description: String,
    pub affected_pages: Vec<String>,
    pub fix_priority: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoOpportunity {
    pub id: String,
    pub kind: OpportunityKind,
    pub category: AuditArea,
    pub title: String,
    pub description: String,
    pub impact: Level,
    pub effort: Level,
}

impl SeoOpportunity {
    fn new(
        id: &str,
        kind: OpportunityKind,
        category: AuditArea,
        title: impl Into<String>,
        description: impl Into<String>,
        impact: Level,
        effort: Level,
    ) -> Self {
        Self {
            id: id.to_string(),
            kind,
            category,
            title: title.into(),
            description: description.into(),
            impact,
            effort,
        }
    }

    pub fn weight(&self) -> u8 {
        self.impact.impact_weight() * self.effort.effort_weight()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub title: String,
    pub description: String,
    pub steps: Vec<String>,
    pub expected_results: String,
    pub timeline: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationKey {
    FixCriticalIssues,
    ImplementQuickWins,
    ContentOptimization,
    StructuredData,
    LocalSeo,
    B2bConversion,
}

impl RecommendationKey {
    pub fn template(&self) -> Recommendation {
        let (id, title, description, steps, expected, timeline): (
            &str,
            &str,
            &str,
            &[&str],
            &str,
            &str,
        ) = match self {
            RecommendationKey::FixCriticalIssues => (
                "fix-critical-issues",
                "Fix critical issues urgently",
                "Resolve the problems blocking indexing right away",
                &[
                    "Audit every page flagged as critical",
                    "Add the missing titles and meta descriptions",
                    "Set up the global site configuration if absent",
                    "Check that important pages are indexable",
                ],
                "Immediate improvement of indexing and crawling",
                "Week 1",
            ),
            RecommendationKey::ImplementQuickWins => (
                "implement-quick-wins",
                "Ship the quick wins",
                "Low-effort actions with high impact",
                &[
                    "Verify the site in the search console",
                    "Set canonical URLs",
                    "Add Organization and FAQPage schemas",
                    "Add alt text to images",
                ],
                "Fast visibility and click-through gains",
                "Weeks 1-2",
            ),
            RecommendationKey::ContentOptimization => (
                "content-optimization",
                "Content optimization program",
                "Systematically enrich page content",
                &[
                    "Write a unique meta description for every page",
                    "Keep titles between 50 and 60 characters",
                    "Add relevant keywords",
                    "Publish long-form content such as guides",
                    "Grow the internal link mesh",
                ],
                "Better rankings and more organic traffic",
                "Months 1-2",
            ),
            RecommendationKey::StructuredData => (
                "structured-data-strategy",
                "Structured data strategy",
                "Deploy schemas for rich results",
                &[
                    "Add JobPosting to every job offer",
                    "Add FAQPage to solution pages",
                    "Implement BreadcrumbList",
                    "Add Person schema to candidate profiles",
                    "Add Course schema to training pages",
                ],
                "Rich result eligibility and better click-through",
                "Month 2",
            ),
            RecommendationKey::LocalSeo => (
                "local-seo",
                "Local SEO development",
                "Become the reference for local hiring searches",
                &[
                    "Create one page per major city",
                    "Target \"jobs [city]\" and \"hiring [city]\" queries",
                    "Add LocalBusiness schema",
                    "Publish local content such as salaries by city",
                    "Earn local backlinks",
                ],
                "Stronger presence in local search results",
                "Months 2-3",
            ),
            RecommendationKey::B2bConversion => (
                "b2b-conversion-seo",
                "Conversion-oriented B2B SEO",
                "Turn organic traffic into business customers",
                &[
                    "Optimize the B2B solution landing pages",
                    "Create one page per service",
                    "Publish search-friendly case studies",
                    "Add contextual calls to action",
                    "Track organic conversions to subscriptions",
                ],
                "Higher B2B conversion rate",
                "Months 3-4",
            ),
        };

        Recommendation {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
            expected_results: expected.to_string(),
            timeline: timeline.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullAuditReport {
    pub id: String,
    pub overall_score: u8,
    pub technical_score: u8,
    pub content_score: u8,
    pub semantic_score: u8,
    pub performance_score: u8,
    pub issues: Vec<SeoIssue>,
    pub opportunities: Vec<SeoOpportunity>,
    pub recommendations: Vec<Recommendation>,
    pub pages_analyzed: usize,
    pub audited_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SubAudit {
    pub score: u8,
    pub issues: Vec<SeoIssue>,
    pub opportunities: Vec<SeoOpportunity>,
}

impl SubAudit {
    fn new() -> Self {
        Self {
            score: 100,
            ..Self::default()
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn issue(
        &mut self,
        id: &str,
        severity: Priority,
        category: AuditArea,
        title: String,
        description: &str,
        affected_pages: Vec<String>,
        fix_priority: u8,
        deduction: u8,
    ) {
        self.issues.push(SeoIssue {
            id: id.to_string(),
            severity,
            category,
            title,
            description: description.to_string(),
            affected_pages,
            fix_priority,
        });
        self.score = self.score.saturating_sub(deduction);
    }
}

pub fn technical_audit(snapshot: &CatalogSnapshot, site: Option<&SiteProfile>) -> SubAudit {
    let mut audit = SubAudit::new();
    let area = AuditArea::Technical;

    if site.is_none() {
        audit.issue(
            "no-seo-config",
            Priority::Critical,
            area,
            "Missing global SEO configuration".to_string(),
            "No site-wide SEO configuration is defined",
            vec!["global".to_string()],
            100,
            30,
        );
    }

    let untitled: Vec<String> = paths_where(snapshot, |p| !p.has_title());
    if !untitled.is_empty() {
        audit.issue(
            "missing-titles",
            Priority::Critical,
            area,
            format!("{} pages without a title", untitled.len()),
            "Titles are essential for search visibility",
            untitled,
            95,
            20,
        );
    }

    let undescribed: Vec<String> = paths_where(snapshot, |p| !p.has_description());
    if !undescribed.is_empty() {
        audit.issue(
            "missing-descriptions",
            Priority::High,
            area,
            format!("{} pages without a meta description", undescribed.len()),
            "Meta descriptions improve click-through",
            undescribed,
            85,
            15,
        );
    }

    let no_canonical = paths_where(snapshot, |p| !p.has_canonical()).len();
    if no_canonical > 0 {
        audit.opportunities.push(SeoOpportunity::new(
            "add-canonical-urls",
            OpportunityKind::QuickWin,
            area,
            "Add canonical URLs",
            format!("{} pages without a canonical URL", no_canonical),
            Level::Medium,
            Level::Low,
        ));
    }

    if let Some(site) = site
        && site
            .search_console_verification
            .as_deref()
            .is_none_or(|v| v.trim().is_empty())
    {
        audit.opportunities.push(SeoOpportunity::new(
            "search-console-verification",
            OpportunityKind::QuickWin,
            area,
            "Verify the site in the search console",
            "Enable performance tracking in the search console",
            Level::High,
            Level::Low,
        ));
    }

    audit
}

pub fn content_audit(snapshot: &CatalogSnapshot) -> SubAudit {
    let mut audit = SubAudit::new();
    let area = AuditArea::Content;

    let short_titles = paths_where(snapshot, |p| p.has_title() && p.title_len() < 30);
    if !short_titles.is_empty() {
        audit.issue(
            "short-titles",
            Priority::Medium,
            area,
            format!("{} titles too short", short_titles.len()),
            "Titles should hold 50-60 characters",
            short_titles,
            70,
            10,
        );
    }

    let long_titles = paths_where(snapshot, |p| p.title_len() > 70);
    if !long_titles.is_empty() {
        audit.issue(
            "long-titles",
            Priority::Medium,
            area,
            format!("{} titles too long", long_titles.len()),
            "Titles over 70 characters get truncated in results",
            long_titles,
            65,
            10,
        );
    }

    let short_descriptions =
        paths_where(snapshot, |p| p.has_description() && p.description_len() < 120);
    if !short_descriptions.is_empty() {
        audit.issue(
            "short-descriptions",
            Priority::Low,
            area,
            format!("{} descriptions too short", short_descriptions.len()),
            "Descriptions should hold 155-165 characters",
            short_descriptions,
            50,
            5,
        );
    }

    let few_keywords = paths_where(snapshot, |p| p.keywords.len() < 3).len();
    if few_keywords > 0 {
        audit.opportunities.push(SeoOpportunity::new(
            "add-keywords",
            OpportunityKind::Strategic,
            area,
            "Enrich keywords",
            format!("{} pages with fewer than 3 keywords", few_keywords),
            Level::Medium,
            Level::Medium,
        ));
    }

    if snapshot.count_by_type(PageType::Detail) > 0 {
        audit.opportunities.push(SeoOpportunity::new(
            "optimize-job-pages",
            OpportunityKind::Strategic,
            area,
            "Optimize job offer pages",
            "Write a unique meta description for every offer",
            Level::High,
            Level::Medium,
        ));
    }

    audit
}

pub fn semantic_audit(snapshot: &CatalogSnapshot, schema_types: &[String]) -> SubAudit {
    let mut audit = SubAudit::new();
    let area = AuditArea::Semantic;
    let has = |kind: &str| schema_types.iter().any(|t| t == kind);

    if schema_types.is_empty() {
        audit.issue(
            "no-schemas",
            Priority::High,
            area,
            "No structured data schema".to_string(),
            "Structured data improves how pages render in results",
            vec!["global".to_string()],
            80,
            25,
        );
    } else {
        if !has("Organization") {
            audit.opportunities.push(SeoOpportunity::new(
                "add-organization-schema",
                OpportunityKind::QuickWin,
                area,
                "Add an Organization schema",
                "Describe the company for knowledge panels",
                Level::Medium,
                Level::Low,
            ));
        }
        if !has("FAQPage") {
            audit.opportunities.push(SeoOpportunity::new(
                "add-faq-schema",
                OpportunityKind::QuickWin,
                area,
                "Add FAQ schemas",
                "Appear in FAQ rich results",
                Level::High,
                Level::Low,
            ));
        }
    }

    let details = snapshot.count_by_type(PageType::Detail);
    let job_schemas = schema_types.iter().filter(|t| *t == "JobPosting").count();
    if details > 0 && job_schemas < details {
        audit.opportunities.push(SeoOpportunity::new(
            "add-job-schemas",
            OpportunityKind::Strategic,
            area,
            "Add JobPosting schemas",
            format!("{} offers without a schema", details - job_schemas),
            Level::High,
            Level::Medium,
        ));
    }

    audit
}

pub fn performance_audit(snapshot: &CatalogSnapshot, orphan_paths: &[String]) -> SubAudit {
    let mut audit = SubAudit::new();
    let area = AuditArea::Performance;

    let priority_pages = paths_where(snapshot, |p| p.priority >= PRIORITY_PAGE_THRESHOLD).len();
    if priority_pages < MIN_PRIORITY_PAGES {
        audit.opportunities.push(SeoOpportunity::new(
            "define-priority-pages",
            OpportunityKind::Strategic,
            area,
            "Define priority pages",
            "Identify and optimize the pages with the most business impact",
            Level::High,
            Level::Low,
        ));
    }

    if !orphan_paths.is_empty() {
        audit.issue(
            "orphan-pages",
            Priority::Medium,
            area,
            format!("{} orphan pages detected", orphan_paths.len()),
            "Pages that no internal link points to",
            orphan_paths.to_vec(),
            60,
            15,
        );
    }

    audit.opportunities.push(SeoOpportunity::new(
        "internal-linking",
        OpportunityKind::Strategic,
        area,
        "Strengthen internal linking",
        "Create contextual links between related pages",
        Level::High,
        Level::Medium,
    ));
    audit.opportunities.push(SeoOpportunity::new(
        "local-seo",
        OpportunityKind::Strategic,
        area,
        "Develop local SEO",
        "Create dedicated pages for each major city",
        Level::High,
        Level::High,
    ));

    audit
}

pub fn synthesize_recommendations(
    issues: &[SeoIssue],
    opportunities: &[SeoOpportunity],
) -> Vec<Recommendation> {
    let mut keys = Vec::new();
    if issues.iter().any(|i| i.severity == Priority::Critical) {
        keys.push(RecommendationKey::FixCriticalIssues);
    }
    if opportunities.iter().any(|o| o.kind == OpportunityKind::QuickWin) {
        keys.push(RecommendationKey::ImplementQuickWins);
    }
    keys.extend([
        RecommendationKey::ContentOptimization,
        RecommendationKey::StructuredData,
        RecommendationKey::LocalSeo,
        RecommendationKey::B2bConversion,
    ]);
    keys.iter().map(|k| k.template()).collect()
}

fn paths_where<F>(snapshot: &CatalogSnapshot, predicate: F) -> Vec<String>
where
    F: Fn(&crate::model::Page) -> bool,
{
    snapshot
        .pages()
        .iter()
        .filter(|p| predicate(p))
        .map(|p| p.path.clone())
        .collect()
}

fn inbound_counts(links: &dyn LinkStore) -> Option<HashMap<String, usize>> {
    match links.list_active_links(&LinkFilter::default()) {
        Ok(active) => {
            let mut counts: HashMap<String, usize> = HashMap::new();
            for link in active {
                *counts.entry(link.target).or_default() += 1;
            }
            Some(counts)
        }
        Err(e) => {
            warn!("Could not read links before scoring: {}", e);
            None
        }
    }
}

pub struct Auditor {
    catalog: Arc<dyn PageCatalog>,
    links: Arc<dyn LinkStore>,
    schemas: Arc<dyn SchemaStore>,
    config: Arc<SeoConfig>,
    progress: Option<ProgressCallback>,
}

impl Auditor {
    pub fn new(
        catalog: Arc<dyn PageCatalog>,
        links: Arc<dyn LinkStore>,
        schemas: Arc<dyn SchemaStore>,
        config: SeoConfig,
    ) -> Self {
        Self {
            catalog,
            links,
            schemas,
            config: Arc::new(config),
            progress: None,
        }
    }

    /// Auditor over a single store that serves pages, links and schemas.
    pub fn from_store<S>(store: Arc<S>, config: SeoConfig) -> Self
    where
        S: PageCatalog + LinkStore + SchemaStore + 'static,
    {
        Self::new(store.clone(), store.clone(), store, config)
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &SeoConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Result<CatalogSnapshot> {
        CatalogSnapshot::load(self.catalog.as_ref())
    }

    pub fn scorer(&self) -> QualityScorer<'_> {
        QualityScorer::new(&self.config.content, self.links.as_ref(), self.schemas.as_ref())
    }

    pub fn audit_page(&self, path: &str) -> Result<PageAudit> {
        self.scorer().audit_page(self.catalog.as_ref(), path)
    }

    /// Score a sample of the active catalog. Only the first
    /// `deep_score_limit` sampled pages are scored.
    pub async fn audit_all(&self, sample_limit: usize) -> Result<AuditSummary> {
        let snapshot = self.snapshot()?;
        let sample: Vec<String> = snapshot
            .pages()
            .iter()
            .take(sample_limit)
            .map(|p| p.path.clone())
            .collect();

        if sample.is_empty() {
            debug!("Nothing to audit");
            return Ok(AuditSummary::default());
        }

        let total_pages = sample.len();
        let deep: Vec<String> = sample
            .into_iter()
            .take(self.config.audit.deep_score_limit)
            .collect();
        info!("Auditing {} of {} sampled pages", deep.len(), total_pages);

        let snapshot = Arc::new(snapshot);
        let inbound = Arc::new(inbound_counts(self.links.as_ref()));
        let links = self.links.clone();
        let schemas = self.schemas.clone();
        let config = self.config.clone();

        let mut options = BatchOptions::from_policy(&self.config.batch);
        if let Some(ref progress) = self.progress {
            options = options.with_progress(progress.clone());
        }

        let outcome = run_batch(deep, &options, move |path: &str| {
            let page = snapshot
                .get(path)
                .ok_or_else(|| SeoError::NotFound(path.to_string()))?;
            let mut scorer = QualityScorer::new(&config.content, links.as_ref(), schemas.as_ref());
            if let Some(counts) = &*inbound {
                scorer = scorer.with_inbound_counts(counts);
            }
            Ok(scorer.audit(page))
        })
        .await;

        Ok(summarize(total_pages, &outcome.results, outcome.errors, outcome.timed_out))
    }

    /// Cheap checks over the whole active catalog, best leverage first.
    pub fn quick_wins(&self) -> Result<Vec<ActionItem>> {
        let snapshot = self.snapshot()?;
        let mut items = Vec::new();

        for page in snapshot.pages() {
            if page.title_len() < 30 {
                items.push(ActionItem::new(
                    Priority::High,
                    format!("Optimize the title of {}", page.path),
                    "Title too short or missing",
                    8,
                    1,
                ));
            }
            if !page.has_canonical() {
                items.push(ActionItem::new(
                    Priority::Critical,
                    format!("Add a canonical URL for {}", page.path),
                    "Avoid duplicate content",
                    9,
                    1,
                ));
            }
            if page.keywords.is_empty() {
                items.push(ActionItem::new(
                    Priority::Medium,
                    format!("Add keywords to {}", page.path),
                    "Improve search targeting",
                    7,
                    2,
                ));
            }
        }

        let mut seen = HashSet::new();
        items.retain(|item| seen.insert(item.title.clone()));
        items.sort_by(|a, b| a.cmp_leverage_desc(b));
        items.truncate(self.config.audit.quick_win_limit);
        Ok(items)
    }

    pub fn run_full_audit(&self) -> Result<FullAuditReport> {
        let snapshot = self.snapshot()?;
        let schema_types = self.schemas.list_active_schema_types()?;
        let graph = GraphAnalyzer::new(&snapshot, self.links.as_ref()).analyze()?;

        let parts = [
            technical_audit(&snapshot, self.config.site.as_ref()),
            content_audit(&snapshot),
            semantic_audit(&snapshot, &schema_types),
            performance_audit(&snapshot, &graph.orphan_paths),
        ];
        let [technical, content, semantic, performance] = parts.each_ref().map(|p| p.score);

        let mut issues: Vec<SeoIssue> = Vec::new();
        let mut opportunities: Vec<SeoOpportunity> = Vec::new();
        for part in parts {
            issues.extend(part.issues);
            opportunities.extend(part.opportunities);
        }
        issues.sort_by(|a, b| b.fix_priority.cmp(&a.fix_priority));
        opportunities.sort_by(|a, b| b.weight().cmp(&a.weight()));

        let recommendations = synthesize_recommendations(&issues, &opportunities);
        let overall = ((technical as f64 + content as f64 + semantic as f64 + performance as f64)
            / 4.0)
            .round() as u8;

        info!(
            "Full audit: overall {}, {} issues, {} opportunities",
            overall,
            issues.len(),
            opportunities.len()
        );

        Ok(FullAuditReport {
            id: Uuid::new_v4().to_string(),
            overall_score: overall,
            technical_score: technical,
            content_score: content,
            semantic_score: semantic,
            performance_score: performance,
            issues,
            opportunities,
            recommendations,
            pages_analyzed: snapshot.len(),
            audited_at: Utc::now(),
        })
    }
}

fn summarize(
    total_pages: usize,
    audits: &[PageAudit],
    errors: Vec<PageError>,
    timed_out: bool,
) -> AuditSummary {
    let mut entries: Vec<PageScoreEntry> = audits
        .iter()
        .map(|a| PageScoreEntry {
            path: a.path.clone(),
            score: a.score.overall,
        })
        .collect();

    let average_score = if entries.is_empty() {
        0
    } else {
        let sum: u32 = entries.iter().map(|e| u32::from(e.score)).sum();
        (sum as f64 / entries.len() as f64).round() as u8
    };

    entries.sort_by(|a, b| b.score.cmp(&a.score));
    let top_pages: Vec<PageScoreEntry> = entries.iter().take(RANKED_PAGES).cloned().collect();
    let bottom_pages: Vec<PageScoreEntry> = entries.iter().rev().take(RANKED_PAGES).cloned().collect();

    AuditSummary {
        total_pages,
        scored_pages: audits.len(),
        average_score,
        top_pages,
        bottom_pages,
        critical_issue_count: audits.iter().map(|a| a.count(IssueKind::Error)).sum(),
        warning_count: audits.iter().map(|a| a.count(IssueKind::Warning)).sum(),
        errors,
        timed_out,
    }
}
