// Catalog data model: pages, links and the action items derived from them

use crate::error::{Result, SeoError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use url::Url;

const CATALOG_BASE: &str = "http://catalog.local/";

pub const CATEGORY_QUERY_KEY: &str = "sector";
pub const LOCALITY_QUERY_KEY: &str = "location";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Detail,
    Category,
    Locality,
    List,
    Article,
    Course,
    Other,
}

impl PageType {
    pub const ALL: [PageType; 7] = [
        PageType::Detail,
        PageType::Category,
        PageType::Locality,
        PageType::List,
        PageType::Article,
        PageType::Course,
        PageType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Detail => "detail",
            PageType::Category => "category",
            PageType::Locality => "locality",
            PageType::List => "list",
            PageType::Article => "article",
            PageType::Course => "course",
            PageType::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        PageType::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Classify a catalog path by its structural markers only.
    pub fn classify(path: &str) -> PageType {
        let Some(url) = parse_catalog_path(path) else {
            return PageType::Other;
        };
        let route = url.path();
        let has_key = |key: &str| url.query_pairs().any(|(k, _)| k == key);

        if route.starts_with("/job-detail/") {
            PageType::Detail
        } else if has_key(CATEGORY_QUERY_KEY) {
            PageType::Category
        } else if has_key(LOCALITY_QUERY_KEY) {
            PageType::Locality
        } else if route.starts_with("/blog/") {
            PageType::Article
        } else if route == "/formations" || route.starts_with("/formations/") {
            PageType::Course
        } else if route == "/jobs" || route == "/" {
            PageType::List
        } else {
            PageType::Other
        }
    }
}

fn parse_catalog_path(path: &str) -> Option<Url> {
    Url::parse(CATALOG_BASE).ok()?.join(path).ok()
}

/// Decoded value of a query parameter in a catalog path.
pub fn query_value(path: &str, key: &str) -> Option<String> {
    parse_catalog_path(path)?
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// Listing path for a category, e.g. `/jobs?sector=Finance`.
pub fn category_path(category: &str) -> String {
    listing_path(CATEGORY_QUERY_KEY, category)
}

/// Listing path for a locality, e.g. `/jobs?location=Conakry`.
pub fn locality_path(locality: &str) -> String {
    listing_path(LOCALITY_QUERY_KEY, locality)
}

fn listing_path(key: &str, value: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
    format!("/jobs?{}={}", key, encoded)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    #[default]
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFrequency::Always => "always",
            ChangeFrequency::Hourly => "hourly",
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
            ChangeFrequency::Never => "never",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "always" => Some(ChangeFrequency::Always),
            "hourly" => Some(ChangeFrequency::Hourly),
            "daily" => Some(ChangeFrequency::Daily),
            "weekly" => Some(ChangeFrequency::Weekly),
            "monthly" => Some(ChangeFrequency::Monthly),
            "yearly" => Some(ChangeFrequency::Yearly),
            "never" => Some(ChangeFrequency::Never),
            _ => None,
        }
    }

    /// Frequencies that signal fresh content to crawlers.
    pub fn is_frequent(&self) -> bool {
        matches!(
            self,
            ChangeFrequency::Hourly | ChangeFrequency::Daily | ChangeFrequency::Weekly
        )
    }
}

/// Open Graph style share preview.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialPreview {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl SocialPreview {
    pub fn has_text(&self) -> bool {
        present(&self.title) && present(&self.description)
    }

    pub fn has_image(&self) -> bool {
        present(&self.image)
    }

    pub fn has_kind(&self) -> bool {
        present(&self.kind)
    }

    pub fn is_complete(&self) -> bool {
        self.has_text() && self.has_image()
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub path: String,
    pub page_type: PageType,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub canonical_url: Option<String>,
    pub priority: f64,
    pub change_frequency: ChangeFrequency,
    pub active: bool,
    pub social: SocialPreview,
    pub category: Option<String>,
    pub locality: Option<String>,
    pub entity_id: Option<String>,
}

impl Page {
    /// A new active page whose type, and for listing pages the category or
    /// locality, is derived from the path.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let page_type = PageType::classify(&path);
        let category = match page_type {
            PageType::Category => query_value(&path, CATEGORY_QUERY_KEY),
            _ => None,
        };
        let locality = match page_type {
            PageType::Locality => query_value(&path, LOCALITY_QUERY_KEY),
            _ => None,
        };

        Self {
            path,
            page_type,
            title: String::new(),
            description: String::new(),
            keywords: Vec::new(),
            canonical_url: None,
            priority: 0.5,
            change_frequency: ChangeFrequency::default(),
            active: true,
            social: SocialPreview::default(),
            category,
            locality,
            entity_id: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_canonical(mut self, url: impl Into<String>) -> Self {
        self.canonical_url = Some(url.into());
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority.clamp(0.0, 1.0);
        self
    }

    pub fn with_change_frequency(mut self, frequency: ChangeFrequency) -> Self {
        self.change_frequency = frequency;
        self
    }

    pub fn with_social(mut self, social: SocialPreview) -> Self {
        self.social = social;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = Some(locality.into());
        self
    }

    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }

    pub fn has_canonical(&self) -> bool {
        present(&self.canonical_url)
    }

    pub fn title_len(&self) -> usize {
        self.title.chars().count()
    }

    pub fn description_len(&self) -> usize {
        self.description.chars().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Contextual,
    Related,
    Navigational,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Contextual => "contextual",
            LinkType::Related => "related",
            LinkType::Navigational => "navigational",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "contextual" => Some(LinkType::Contextual),
            "related" => Some(LinkType::Related),
            "navigational" | "navigation" => Some(LinkType::Navigational),
            _ => None,
        }
    }

    pub fn from_relevance(relevance: u8) -> Self {
        if relevance >= 70 {
            LinkType::Contextual
        } else if relevance >= 50 {
            LinkType::Related
        } else {
            LinkType::Navigational
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub anchor_text: String,
    pub link_type: LinkType,
    pub relevance: u8,
    pub active: bool,
    pub broken: bool,
}

impl Link {
    /// Build an active link, rejecting self-links. Relevance is clamped to 100
    /// and the classification follows from it.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        anchor_text: impl Into<String>,
        relevance: u8,
    ) -> Result<Self> {
        let source = source.into();
        let target = target.into();
        if source == target {
            return Err(SeoError::SelfLink(source));
        }
        let relevance = relevance.min(100);

        Ok(Self {
            source,
            target,
            anchor_text: anchor_text.into(),
            link_type: LinkType::from_relevance(relevance),
            relevance,
            active: true,
            broken: false,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub impact: u8,
    pub effort: u8,
}

impl ActionItem {
    pub fn new(
        priority: Priority,
        title: impl Into<String>,
        description: impl Into<String>,
        impact: u8,
        effort: u8,
    ) -> Self {
        Self {
            priority,
            title: title.into(),
            description: description.into(),
            impact: impact.clamp(1, 10),
            effort: effort.clamp(1, 10),
        }
    }

    pub fn leverage(&self) -> f64 {
        f64::from(self.impact) / f64::from(self.effort)
    }

    /// Orders by impact/effort ratio, highest first. Cross-multiplied so equal
    /// ratios compare equal.
    pub fn cmp_leverage_desc(&self, other: &Self) -> Ordering {
        let mine = u32::from(self.impact) * u32::from(other.effort);
        let theirs = u32::from(other.impact) * u32::from(self.effort);
        theirs.cmp(&mine)
    }
}

/// Sort action items critical first, keeping insertion order within a level.
pub fn sort_by_priority(items: &mut [ActionItem]) {
    items.sort_by_key(|item| item.priority);
}
