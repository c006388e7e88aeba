// Per-page quality scoring across four dimensions

use crate::catalog::{LinkStore, PageCatalog, SchemaStore};
use crate::config::ContentPolicy;
use crate::error::{Result, SeoError};
use crate::model::{ActionItem, Page, Priority, sort_by_priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

const TITLE_RANGE: std::ops::RangeInclusive<usize> = 30..=60;
const DESCRIPTION_RANGE: std::ops::RangeInclusive<usize> = 120..=160;
const OFF_PAGE_BASE: u8 = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetails {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
    pub action_items: Vec<ActionItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub page_path: String,
    pub computed_at: DateTime<Utc>,
    pub technical: u8,
    pub content: u8,
    pub on_page: u8,
    pub off_page: u8,
    pub overall: u8,
    pub details: ScoreDetails,
}

impl Score {
    pub fn dimensions(&self) -> [u8; 4] {
        [self.technical, self.content, self.on_page, self.off_page]
    }
}

/// Rounded mean of the four dimensions.
pub fn overall_of(technical: u8, content: u8, on_page: u8, off_page: u8) -> u8 {
    let sum = technical as f64 + content as f64 + on_page as f64 + off_page as f64;
    (sum / 4.0).round() as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Error,
    Warning,
    Info,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::Error => "error",
            IssueKind::Warning => "warning",
            IssueKind::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Technical,
    Content,
    Performance,
    Security,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Technical => "technical",
            IssueCategory::Content => "content",
            IssueCategory::Performance => "performance",
            IssueCategory::Security => "security",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageIssue {
    pub kind: IssueKind,
    pub category: IssueCategory,
    pub message: String,
    pub fix: String,
}

impl PageIssue {
    fn new(kind: IssueKind, category: IssueCategory, message: &str, fix: &str) -> Self {
        Self {
            kind,
            category,
            message: message.to_string(),
            fix: fix.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAudit {
    pub path: String,
    pub score: Score,
    pub issues: Vec<PageIssue>,
    pub recommendations: Vec<String>,
    pub audited_at: DateTime<Utc>,
}

impl PageAudit {
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

fn mentions_keyword(text: &str, keywords: &[String]) -> bool {
    let text = text.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .any(|k| text.contains(&k.to_lowercase()))
}

fn contains_any(text: &str, terms: &[String]) -> bool {
    terms.iter().any(|t| !t.is_empty() && text.contains(t.as_str()))
}

pub struct QualityScorer<'a> {
    content: &'a ContentPolicy,
    links: &'a dyn LinkStore,
    schemas: &'a dyn SchemaStore,
    inbound: Option<&'a HashMap<String, usize>>,
}

impl<'a> QualityScorer<'a> {
    pub fn new(
        content: &'a ContentPolicy,
        links: &'a dyn LinkStore,
        schemas: &'a dyn SchemaStore,
    ) -> Self {
        Self {
            content,
            links,
            schemas,
            inbound: None,
        }
    }

    /// Use precomputed inbound counts instead of querying the link store
    /// for every page.
    pub fn with_inbound_counts(mut self, counts: &'a HashMap<String, usize>) -> Self {
        self.inbound = Some(counts);
        self
    }

    pub fn score(&self, page: &Page) -> Score {
        let technical = self.score_technical(page);
        let content = self.score_content(page);
        let on_page = self.score_on_page(page);
        let off_page = self.score_off_page(page);

        Score {
            page_path: page.path.clone(),
            computed_at: Utc::now(),
            technical,
            content,
            on_page,
            off_page,
            overall: overall_of(technical, content, on_page, off_page),
            details: score_details(technical, content, on_page, off_page, page),
        }
    }

    pub fn score_technical(&self, page: &Page) -> u8 {
        let mut score: u32 = 0;

        if page.has_title() {
            score += if TITLE_RANGE.contains(&page.title_len()) { 25 } else { 15 };
        }
        if page.has_description() {
            score += if DESCRIPTION_RANGE.contains(&page.description_len()) {
                25
            } else {
                15
            };
        }
        if page.has_canonical() {
            score += 15;
        }
        if !page.keywords.is_empty() {
            score += 10;
        }
        if page.social.has_text() && page.social.has_image() {
            score += 15;
        }
        if page.active {
            score += 10;
        }

        score.min(100) as u8
    }

    pub fn score_content(&self, page: &Page) -> u8 {
        let mut score: u32 = 0;

        if page.keywords.len() >= 3 {
            score += 25;
        } else if !page.keywords.is_empty() {
            score += 15;
        }
        if page.has_title() && mentions_keyword(&page.title, &page.keywords) {
            score += 20;
        }
        if page.has_description() && mentions_keyword(&page.description, &page.keywords) {
            score += 15;
        }
        if contains_any(&page.description, &self.content.action_verbs) {
            score += 10;
        }
        if page.title.contains('|') {
            score += 10;
        }
        if contains_any(&page.title, &self.content.brand_terms) {
            score += 10;
        }
        if page.description_len() > 100 {
            score += 10;
        }

        score.min(100) as u8
    }

    pub fn score_on_page(&self, page: &Page) -> u8 {
        let mut score: u32 = 0;

        score += if page.priority >= 0.8 {
            20
        } else if page.priority >= 0.6 {
            15
        } else {
            10
        };
        score += if page.change_frequency.is_frequent() { 15 } else { 10 };
        if page.social.has_text() {
            score += 20;
        }
        if page.social.has_image() {
            score += 15;
        }
        if page.social.has_kind() {
            score += 10;
        }
        if page.has_canonical() {
            score += 20;
        }

        score.min(100) as u8
    }

    /// Inbound-link step plus a structured-data bonus. A link store failure
    /// leaves the dimension at its base value.
    pub fn score_off_page(&self, page: &Page) -> u8 {
        let inbound = match self.inbound {
            Some(counts) => counts.get(&page.path).copied().unwrap_or(0),
            None => match self.links.count_inbound(&page.path) {
                Ok(count) => count,
                Err(e) => {
                    warn!("Off-page scoring skipped for {}: {}", page.path, e);
                    return OFF_PAGE_BASE;
                }
            },
        };

        let mut score: u32 = match inbound {
            n if n >= 5 => 100,
            n if n >= 3 => 80,
            n if n >= 1 => 60,
            _ => 30,
        };

        if let Some(entity_id) = page.entity_id.as_deref() {
            match self.schemas.has_active_schema(entity_id) {
                Ok(true) => score += 20,
                Ok(false) => {}
                Err(e) => debug!("Schema lookup skipped for {}: {}", page.path, e),
            }
        }

        score.min(100) as u8
    }

    pub fn audit(&self, page: &Page) -> PageAudit {
        let score = self.score(page);
        let issues = identify_issues(page);
        let recommendations = recommendations(&score, &issues);

        PageAudit {
            path: page.path.clone(),
            score,
            issues,
            recommendations,
            audited_at: Utc::now(),
        }
    }

    /// Audit a single page by path. Inactive pages are audited too.
    pub fn audit_page(&self, catalog: &dyn PageCatalog, path: &str) -> Result<PageAudit> {
        let page = catalog
            .get_page(path)?
            .ok_or_else(|| SeoError::NotFound(path.to_string()))?;
        Ok(self.audit(&page))
    }
}

fn score_details(technical: u8, content: u8, on_page: u8, off_page: u8, page: &Page) -> ScoreDetails {
    let mut d = ScoreDetails::default();

    if technical >= 80 {
        d.strengths.push("Excellent technical setup".to_string());
    } else if technical < 60 {
        d.weaknesses.push("Technical setup needs work".to_string());
        d.action_items.push(ActionItem::new(
            Priority::High,
            "Optimize meta tags",
            "Adjust the title and description lengths",
            8,
            2,
        ));
    }

    if content >= 80 {
        d.strengths.push("Content well optimized for search".to_string());
    } else if content < 60 {
        d.weaknesses.push("Content needs optimization".to_string());
        d.action_items.push(ActionItem::new(
            Priority::High,
            "Enrich content",
            "Add relevant keywords and improve the description",
            9,
            3,
        ));
    }

    if on_page >= 80 {
        d.strengths.push("Excellent on-page optimization".to_string());
    } else {
        d.opportunities.push("Improve social preview tags".to_string());
        d.action_items.push(ActionItem::new(
            Priority::Medium,
            "Complete social tags",
            "Add the share image, title and description",
            6,
            2,
        ));
    }

    if off_page < 50 {
        d.weaknesses.push("Few internal links point to this page".to_string());
        d.action_items.push(ActionItem::new(
            Priority::High,
            "Create internal links",
            "Add 3-5 links from related pages",
            8,
            3,
        ));
    }

    if page.keywords.len() < 3 {
        d.opportunities.push("Add more targeted keywords".to_string());
        d.action_items.push(ActionItem::new(
            Priority::Medium,
            "Keyword research",
            "Identify 3-5 additional relevant keywords",
            7,
            2,
        ));
    }

    if !page.has_canonical() {
        d.threats.push("Missing canonical URL, duplicate content risk".to_string());
        d.action_items.push(ActionItem::new(
            Priority::Critical,
            "Add a canonical URL",
            "Set the canonical URL to avoid duplicate content",
            9,
            1,
        ));
    }

    sort_by_priority(&mut d.action_items);
    d
}

pub fn identify_issues(page: &Page) -> Vec<PageIssue> {
    use IssueCategory::*;
    use IssueKind::*;

    let mut issues = Vec::new();

    if !page.has_title() {
        issues.push(PageIssue::new(Error, Technical, "Missing title", "Add a 30-60 character title"));
    } else if page.title_len() < *TITLE_RANGE.start() {
        issues.push(PageIssue::new(Warning, Technical, "Title too short", "Lengthen the title to 30-60 characters"));
    } else if page.title_len() > *TITLE_RANGE.end() {
        issues.push(PageIssue::new(Warning, Technical, "Title too long", "Shorten the title to at most 60 characters"));
    }

    if !page.has_description() {
        issues.push(PageIssue::new(Error, Content, "Missing description", "Add a 120-160 character description"));
    } else if page.description_len() < *DESCRIPTION_RANGE.start() {
        issues.push(PageIssue::new(
            Warning,
            Content,
            "Description too short",
            "Lengthen the description to 120-160 characters",
        ));
    } else if page.description_len() > *DESCRIPTION_RANGE.end() {
        issues.push(PageIssue::new(
            Warning,
            Content,
            "Description too long",
            "Shorten the description to at most 160 characters",
        ));
    }

    if page.keywords.is_empty() {
        issues.push(PageIssue::new(Warning, Content, "No keywords defined", "Add 3-5 relevant keywords"));
    }

    if !page.has_canonical() {
        issues.push(PageIssue::new(
            Error,
            Technical,
            "Missing canonical URL",
            "Set the canonical URL to avoid duplicate content",
        ));
    }

    if !page.social.has_text() {
        issues.push(PageIssue::new(
            Info,
            Content,
            "Incomplete social preview tags",
            "Fill in the share title, description and image",
        ));
    }

    if !page.active {
        issues.push(PageIssue::new(Warning, Technical, "Inactive page", "Activate the page so it can be indexed"));
    }

    issues
}

pub fn recommendations(score: &Score, issues: &[PageIssue]) -> Vec<String> {
    let mut out = Vec::new();

    if score.overall < 60 {
        out.push("Low overall score: prioritize the critical fixes".to_string());
    }
    let errors = issues.iter().filter(|i| i.kind == IssueKind::Error).count();
    if errors > 0 {
        out.push(format!("Fix {} critical error(s) first", errors));
    }
    if score.technical < 70 {
        out.push("Optimize the meta tags (title and description)".to_string());
    }
    if score.content < 70 {
        out.push("Enrich the content with relevant keywords".to_string());
    }
    if score.off_page < 50 {
        out.push("Create 3-5 internal links from related pages".to_string());
    }
    if score.on_page < 70 {
        out.push("Complete the social preview tags".to_string());
    }
    for item in score.details.action_items.iter().take(3) {
        out.push(format!("[{}] {}", item.priority.as_str().to_uppercase(), item.title));
    }

    out
}
