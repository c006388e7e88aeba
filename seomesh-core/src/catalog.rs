// Collaborator interfaces and the read-only catalog snapshot

use crate::audit::FullAuditReport;
use crate::error::Result;
use crate::model::{Link, Page, PageType};
use crate::scoring::Score;
use std::collections::HashMap;

/// Read access to the content catalog.
pub trait PageCatalog: Send + Sync {
    fn list_active_pages(&self) -> Result<Vec<Page>>;
    fn get_page(&self, path: &str) -> Result<Option<Page>>;
    fn count_active_by_type(&self, page_type: PageType) -> Result<usize>;
}

/// Restricts a link listing to a source and/or target page.
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
    pub source: Option<String>,
    pub target: Option<String>,
}

impl LinkFilter {
    pub fn from_source(path: impl Into<String>) -> Self {
        Self {
            source: Some(path.into()),
            target: None,
        }
    }

    pub fn to_target(path: impl Into<String>) -> Self {
        Self {
            source: None,
            target: Some(path.into()),
        }
    }

    pub fn matches(&self, link: &Link) -> bool {
        self.source.as_deref().is_none_or(|s| s == link.source)
            && self.target.as_deref().is_none_or(|t| t == link.target)
    }
}

/// What an accepted link write did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkWrite {
    Created,
    Updated,
}

/// Persistence for accepted links.
pub trait LinkStore: Send + Sync {
    fn list_active_links(&self, filter: &LinkFilter) -> Result<Vec<Link>>;
    /// Every link regardless of its active or broken flags.
    fn list_all_links(&self) -> Result<Vec<Link>>;
    /// Insert or replace the link for `(source, target)`.
    fn upsert_link(&self, link: &Link) -> Result<LinkWrite>;
    fn count_inbound(&self, path: &str) -> Result<usize>;
    fn count_outbound(&self, path: &str) -> Result<usize>;
    fn mark_link_broken(&self, source: &str, target: &str) -> Result<bool>;
}

/// Structured-data (schema.org) attachments.
pub trait SchemaStore: Send + Sync {
    fn has_active_schema(&self, entity_id: &str) -> Result<bool>;
    fn list_active_schema_types(&self) -> Result<Vec<String>>;
}

/// History of computed scores and full-site audits.
pub trait AuditStore: Send + Sync {
    fn save_score(&self, score: &Score) -> Result<()>;
    fn latest_scores(&self, path: &str, limit: usize) -> Result<Vec<Score>>;
    fn save_full_audit(&self, report: &FullAuditReport) -> Result<()>;
    fn latest_full_audit(&self) -> Result<Option<FullAuditReport>>;
    fn full_audit_history(&self, limit: usize) -> Result<Vec<FullAuditReport>>;
}

/// Immutable view of the active catalog, taken once per computation.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pages: Vec<Page>,
    by_path: HashMap<String, usize>,
}

impl CatalogSnapshot {
    /// Keeps only active pages, in the order given.
    pub fn from_pages(pages: Vec<Page>) -> Self {
        let pages: Vec<Page> = pages.into_iter().filter(|p| p.active).collect();
        let by_path = pages
            .iter()
            .enumerate()
            .map(|(idx, page)| (page.path.clone(), idx))
            .collect();
        Self { pages, by_path }
    }

    pub fn load(catalog: &dyn PageCatalog) -> Result<Self> {
        Ok(Self::from_pages(catalog.list_active_pages()?))
    }

    pub fn get(&self, path: &str) -> Option<&Page> {
        self.by_path.get(path).map(|&idx| &self.pages[idx])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn count_by_type(&self, page_type: PageType) -> usize {
        self.pages
            .iter()
            .filter(|p| p.page_type == page_type)
            .count()
    }

    pub fn category_page(&self, category: &str) -> Option<&Page> {
        self.pages.iter().find(|p| {
            p.page_type == PageType::Category && p.category.as_deref() == Some(category)
        })
    }

    pub fn locality_page(&self, locality: &str) -> Option<&Page> {
        self.pages.iter().find(|p| {
            p.page_type == PageType::Locality && p.locality.as_deref() == Some(locality)
        })
    }

    pub fn details_in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Page> {
        self.pages.iter().filter(move |p| {
            p.page_type == PageType::Detail && p.category.as_deref() == Some(category)
        })
    }

    pub fn details_in_locality<'a>(&'a self, locality: &'a str) -> impl Iterator<Item = &'a Page> {
        self.pages.iter().filter(move |p| {
            p.page_type == PageType::Detail && p.locality.as_deref() == Some(locality)
        })
    }
}
