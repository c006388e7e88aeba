// Link graph health: orphans, density, authority estimates

use crate::catalog::{CatalogSnapshot, LinkStore};
use crate::error::Result;
use crate::model::Link;
use petgraph::algo::page_rank;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_links: usize,
    pub active_links: usize,
    pub broken_links: usize,
    pub orphan_pages: usize,
    pub active_pages: usize,
    pub average_density: f64,
    pub authority_estimate: u8,
    /// Paths of the orphan pages, in catalog order.
    pub orphan_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLinkProfile {
    pub path: String,
    pub inbound: usize,
    pub outbound: usize,
    pub authority: u8,
    pub suggestions: Vec<String>,
}

/// Density step function. Deliberately coarse; see `iterative_page_rank` for
/// a real PageRank.
pub fn authority_from_density(density: f64, active_pages: usize) -> u8 {
    if active_pages == 0 {
        return 0;
    }
    if density >= 5.0 {
        90
    } else if density >= 3.0 {
        70
    } else if density >= 2.0 {
        50
    } else if density >= 1.0 {
        30
    } else {
        10
    }
}

pub fn page_authority(inbound: usize, outbound: usize) -> u8 {
    let mut authority = (inbound * 10).min(50) + (outbound * 5).min(30);
    if inbound > outbound {
        authority += 10;
    }
    if (3..=7).contains(&outbound) {
        authority += 10;
    }
    authority.min(100) as u8
}

pub fn improvement_suggestions(inbound: usize, outbound: usize) -> Vec<String> {
    let mut suggestions = Vec::new();
    if inbound < 3 {
        suggestions.push("Needs more inbound links from other relevant pages".to_string());
    }
    if outbound < 3 {
        suggestions.push("Add 3-5 outbound links to related pages".to_string());
    }
    if outbound > 10 {
        suggestions.push("Reduce outbound links to avoid dilution risk".to_string());
    }
    if inbound == 0 {
        suggestions.push("CRITICAL: orphan page, no inbound link detected".to_string());
    }
    if outbound == 0 {
        suggestions.push("Add links to complementary pages".to_string());
    }
    suggestions
}

pub struct GraphAnalyzer<'a> {
    snapshot: &'a CatalogSnapshot,
    links: &'a dyn LinkStore,
}

impl<'a> GraphAnalyzer<'a> {
    pub fn new(snapshot: &'a CatalogSnapshot, links: &'a dyn LinkStore) -> Self {
        Self { snapshot, links }
    }

    pub fn analyze(&self) -> Result<GraphStats> {
        let all = self.links.list_all_links()?;
        let total_links = all.len();
        let active: Vec<&Link> = all.iter().filter(|l| l.active).collect();
        let broken_links = all.iter().filter(|l| l.broken).count();

        let linked_targets: HashSet<&str> = active.iter().map(|l| l.target.as_str()).collect();
        let orphan_paths: Vec<String> = self
            .snapshot
            .pages()
            .iter()
            .filter(|p| !linked_targets.contains(p.path.as_str()))
            .map(|p| p.path.clone())
            .collect();

        let active_pages = self.snapshot.len();
        let average_density = if active_pages == 0 {
            0.0
        } else {
            active.len() as f64 / active_pages as f64
        };

        let stats = GraphStats {
            total_links,
            active_links: active.len(),
            broken_links,
            orphan_pages: orphan_paths.len(),
            active_pages,
            average_density,
            authority_estimate: authority_from_density(average_density, active_pages),
            orphan_paths,
        };
        debug!(
            "Graph: {} pages, {} active links, {} orphans, density {:.2}",
            stats.active_pages, stats.active_links, stats.orphan_pages, stats.average_density
        );
        Ok(stats)
    }

    pub fn page_link_profile(&self, path: &str) -> Result<PageLinkProfile> {
        let inbound = self.links.count_inbound(path)?;
        let outbound = self.links.count_outbound(path)?;

        Ok(PageLinkProfile {
            path: path.to_string(),
            inbound,
            outbound,
            authority: page_authority(inbound, outbound),
            suggestions: improvement_suggestions(inbound, outbound),
        })
    }

    /// Standard PageRank over the active subgraph. Reported on its own and
    /// never folded into any score.
    pub fn iterative_page_rank(&self, damping: f64, iterations: usize) -> Result<Vec<(String, f64)>> {
        let links = self.links.list_all_links()?;
        Ok(iterative_page_rank(self.snapshot, &links, damping, iterations))
    }
}

/// Directed graph of active pages and the active links between them.
pub fn link_graph(snapshot: &CatalogSnapshot, links: &[Link]) -> DiGraph<String, u8> {
    let mut graph = DiGraph::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

    for page in snapshot.pages() {
        let idx = graph.add_node(page.path.clone());
        nodes.insert(page.path.as_str(), idx);
    }
    for link in links.iter().filter(|l| l.active && !l.broken) {
        if let (Some(&s), Some(&t)) = (nodes.get(link.source.as_str()), nodes.get(link.target.as_str())) {
            graph.add_edge(s, t, link.relevance);
        }
    }
    graph
}

/// Ranks sorted descending, ties by path.
pub fn iterative_page_rank(
    snapshot: &CatalogSnapshot,
    links: &[Link],
    damping: f64,
    iterations: usize,
) -> Vec<(String, f64)> {
    let graph = link_graph(snapshot, links);
    if graph.node_count() == 0 {
        return Vec::new();
    }
    let ranks = page_rank(&graph, damping, iterations);

    let mut ranked: Vec<(String, f64)> = graph
        .node_indices()
        .map(|idx| (graph[idx].clone(), ranks[idx.index()]))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}
