// Internal link suggestion, acceptance and maintenance

use crate::catalog::{CatalogSnapshot, LinkFilter, LinkStore, LinkWrite};
use crate::config::LinkingPolicy;
use crate::error::{Result, SeoError};
use crate::model::{Link, LinkType, Page, PageType};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

const BASE_RELEVANCE: i32 = 50;
const SHARED_ATTRIBUTE_BONUS: i32 = 25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSuggestion {
    pub source: String,
    pub target: String,
    pub target_type: PageType,
    pub anchor_text: String,
    pub relevance: u8,
    pub link_type: LinkType,
    pub reason: String,
}

impl LinkSuggestion {
    pub fn to_link(&self) -> Result<Link> {
        Link::new(
            self.source.clone(),
            self.target.clone(),
            self.anchor_text.clone(),
            self.relevance,
        )
    }
}

/// Anchor phrases per target type. `{category}` and `{locality}` are filled
/// from the target page.
pub fn anchor_templates(target_type: PageType) -> &'static [&'static str] {
    match target_type {
        PageType::Detail => &[
            "View this job offer",
            "Discover the position",
            "Learn more",
            "Apply now",
        ],
        PageType::Category => &[
            "Jobs in this sector",
            "Similar openings",
            "{category} opportunities",
        ],
        PageType::Locality => &["Jobs in {locality}", "Local openings", "{locality} opportunities"],
        PageType::List => &["All job offers", "See more jobs", "Browse the offers"],
        PageType::Article => &["Read the article", "Learn more", "Discover our advice"],
        PageType::Course => &["Our training courses", "Get trained", "Develop your skills"],
        PageType::Other => &["Learn more"],
    }
}

pub fn link_reason(target_type: PageType) -> &'static str {
    match target_type {
        PageType::Detail => "Similar job offer in the same sector or city",
        PageType::Category => "Sector page to explore more opportunities",
        PageType::Locality => "City page listing local offers",
        PageType::List => "Back to the full list of offers",
        PageType::Article => "Relevant article with practical advice",
        PageType::Course => "Training to develop the required skills",
        PageType::Other => "Recommended related page",
    }
}

fn render_anchor(template: &str, target: &Page) -> String {
    template
        .replace("{category}", target.category.as_deref().unwrap_or("this sector"))
        .replace("{locality}", target.locality.as_deref().unwrap_or("this city"))
}

fn shares(a: &Option<String>, b: &Option<String>) -> bool {
    match (a.as_deref(), b.as_deref()) {
        (Some(a), Some(b)) => !a.is_empty() && a == b,
        _ => false,
    }
}

/// Deterministic 0-100 relevance of a link from `source` to `target`.
pub fn relevance(source: &Page, target: &Page) -> u8 {
    use PageType::*;

    let mut score = BASE_RELEVANCE;
    score += match (source.page_type, target.page_type) {
        (Detail, Category) | (Detail, Locality) => 30,
        (Category, Detail) | (Locality, Detail) => 35,
        (Detail, Detail) => 20,
        (Category, Locality) | (Locality, Category) => 15,
        _ => 0,
    };
    if shares(&source.category, &target.category) {
        score += SHARED_ATTRIBUTE_BONUS;
    }
    if shares(&source.locality, &target.locality) {
        score += SHARED_ATTRIBUTE_BONUS;
    }

    score.clamp(0, 100) as u8
}

pub struct LinkGraphBuilder<'a> {
    snapshot: &'a CatalogSnapshot,
    policy: &'a LinkingPolicy,
}

impl<'a> LinkGraphBuilder<'a> {
    pub fn new(snapshot: &'a CatalogSnapshot, policy: &'a LinkingPolicy) -> Self {
        Self { snapshot, policy }
    }

    /// Ranked link suggestions for `source_path`. Only the anchor wording
    /// depends on `rng`; the candidate set and scores do not. Unknown or
    /// inactive sources yield no suggestions.
    pub fn suggest_links<R: Rng + ?Sized>(
        &self,
        source_path: &str,
        limit: usize,
        rng: &mut R,
    ) -> Vec<LinkSuggestion> {
        let Some(source) = self.snapshot.get(source_path) else {
            debug!("No active page at {}, nothing to suggest", source_path);
            return Vec::new();
        };

        let mut suggestions: Vec<LinkSuggestion> = self
            .candidates(source)
            .into_iter()
            .map(|target| {
                let score = relevance(source, &target);
                let templates = anchor_templates(target.page_type);
                let template = templates.choose(rng).copied().unwrap_or("Learn more");

                LinkSuggestion {
                    source: source.path.clone(),
                    target: target.path.clone(),
                    target_type: target.page_type,
                    anchor_text: render_anchor(template, &target),
                    relevance: score,
                    link_type: LinkType::from_relevance(score),
                    reason: link_reason(target.page_type).to_string(),
                }
            })
            .collect();

        // sort_by is stable: ties keep generation order
        suggestions.sort_by(|a, b| b.relevance.cmp(&a.relevance));
        suggestions.truncate(limit);
        suggestions
    }

    /// Candidate targets in generation order, de-duplicated, never the source.
    fn candidates(&self, source: &Page) -> Vec<Page> {
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(source.path.clone());
        let mut out: Vec<Page> = Vec::new();
        let mut push = |page: &Page| {
            if seen.insert(page.path.clone()) {
                out.push(page.clone());
            }
        };

        match source.page_type {
            PageType::Detail => {
                match source.category.as_deref() {
                    Some(category) => {
                        if let Some(page) = self.snapshot.category_page(category) {
                            push(page);
                        }
                    }
                    None => debug!("{} has no category, skipping sector candidates", source.path),
                }
                match source.locality.as_deref() {
                    Some(locality) => {
                        if let Some(page) = self.snapshot.locality_page(locality) {
                            push(page);
                        }
                    }
                    None => debug!("{} has no locality, skipping city candidates", source.path),
                }
                if let Some(category) = source.category.as_deref() {
                    self.snapshot
                        .details_in_category(category)
                        .filter(|p| p.path != source.path)
                        .take(self.policy.related_detail_limit)
                        .for_each(&mut push);
                }
            }
            PageType::Category => {
                if let Some(category) = source.category.as_deref() {
                    let members: Vec<&Page> = self
                        .snapshot
                        .details_in_category(category)
                        .take(self.policy.member_limit)
                        .collect();
                    for &member in &members {
                        push(member);
                    }

                    let mut localities: Vec<&str> = Vec::new();
                    for member in &members {
                        if let Some(locality) = member.locality.as_deref()
                            && !localities.contains(&locality)
                        {
                            localities.push(locality);
                        }
                    }
                    for locality in localities {
                        if let Some(page) = self.snapshot.locality_page(locality) {
                            push(page);
                        }
                    }
                } else {
                    debug!("Category page {} has no category value", source.path);
                }
            }
            PageType::Locality => {
                if let Some(locality) = source.locality.as_deref() {
                    let members: Vec<&Page> = self
                        .snapshot
                        .details_in_locality(locality)
                        .take(self.policy.member_limit)
                        .collect();
                    for &member in &members {
                        push(member);
                    }

                    let mut categories: Vec<&str> = Vec::new();
                    for member in &members {
                        if let Some(category) = member.category.as_deref()
                            && !categories.contains(&category)
                        {
                            categories.push(category);
                        }
                    }
                    for category in categories {
                        if let Some(page) = self.snapshot.category_page(category) {
                            push(page);
                        }
                    }
                } else {
                    debug!("Locality page {} has no locality value", source.path);
                }
            }
            _ => {}
        }

        for fixed in [&self.policy.root_list_path, &self.policy.resource_path] {
            let page = self
                .snapshot
                .get(fixed)
                .cloned()
                .unwrap_or_else(|| Page::new(fixed.as_str()));
            push(&page);
        }

        out
    }
}

/// Tally of one acceptance pass.
#[derive(Debug, Default)]
pub struct AcceptedLinks {
    pub created: usize,
    pub updated: usize,
    /// Targets whose write failed, with the store error.
    pub failures: Vec<(String, SeoError)>,
}

impl AcceptedLinks {
    pub fn written(&self) -> usize {
        self.created + self.updated
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Persist every suggestion at or above `threshold`. A failed write is
/// recorded and the remaining suggestions are still written.
pub fn accept_suggestions(
    store: &dyn LinkStore,
    suggestions: &[LinkSuggestion],
    threshold: u8,
) -> AcceptedLinks {
    let mut accepted = AcceptedLinks::default();
    for suggestion in suggestions.iter().filter(|s| s.relevance >= threshold) {
        match suggestion.to_link().and_then(|link| store.upsert_link(&link)) {
            Ok(LinkWrite::Created) => accepted.created += 1,
            Ok(LinkWrite::Updated) => accepted.updated += 1,
            Err(e) => {
                debug!(
                    "Write {} -> {} failed: {}",
                    suggestion.source, suggestion.target, e
                );
                accepted.failures.push((suggestion.target.clone(), e));
            }
        }
    }
    debug!(
        "Accepted {} new and {} updated of {} suggestions (threshold {}), {} failed",
        accepted.created,
        accepted.updated,
        suggestions.len(),
        threshold,
        accepted.failures.len()
    );
    accepted
}

/// Suggest links for one page and accept those above the policy threshold.
pub fn auto_generate_links<R: Rng + ?Sized>(
    snapshot: &CatalogSnapshot,
    store: &dyn LinkStore,
    policy: &LinkingPolicy,
    source_path: &str,
    rng: &mut R,
) -> AcceptedLinks {
    let suggestions = LinkGraphBuilder::new(snapshot, policy).suggest_links(
        source_path,
        policy.suggestions_per_page,
        rng,
    );
    accept_suggestions(store, &suggestions, policy.accept_threshold)
}

/// Mark active links whose source or target left the active catalog as
/// broken. Returns the number of links marked.
pub fn validate_links(snapshot: &CatalogSnapshot, store: &dyn LinkStore) -> Result<usize> {
    let mut marked = 0;
    for link in store.list_active_links(&LinkFilter::default())? {
        if link.broken {
            continue;
        }
        if !snapshot.contains(&link.source) || !snapshot.contains(&link.target) {
            debug!("Link {} -> {} is broken", link.source, link.target);
            if store.mark_link_broken(&link.source, &link.target)? {
                marked += 1;
            }
        }
    }
    Ok(marked)
}

/// Recompute relevance for active links between catalog pages whose
/// attributes changed. Returns the number of links rewritten.
pub fn rescore_links(snapshot: &CatalogSnapshot, store: &dyn LinkStore) -> Result<usize> {
    let mut updated = 0;
    for mut link in store.list_active_links(&LinkFilter::default())? {
        let (Some(source), Some(target)) = (snapshot.get(&link.source), snapshot.get(&link.target))
        else {
            continue;
        };
        let score = relevance(source, target);
        if score != link.relevance {
            link.relevance = score;
            link.link_type = LinkType::from_relevance(score);
            store.upsert_link(&link)?;
            updated += 1;
        }
    }
    Ok(updated)
}
