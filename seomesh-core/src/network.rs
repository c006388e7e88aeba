// Catalog-wide link network generation

use crate::batch::{BatchOptions, PageError, ProgressCallback, run_batch};
use crate::catalog::{CatalogSnapshot, LinkStore, PageCatalog};
use crate::config::{BatchPolicy, LinkingPolicy};
use crate::error::Result;
use crate::linking::{AcceptedLinks, auto_generate_links};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Options for configuring a network build
#[derive(Clone)]
pub struct NetworkOptions {
    pub linking: LinkingPolicy,
    pub batch: BatchOptions,
    /// Cap on the number of pages processed, in catalog order.
    pub page_limit: Option<usize>,
    /// Pins anchor selection. Each page draws from `seed + page index`.
    pub seed: Option<u64>,
}

impl NetworkOptions {
    pub fn new(linking: LinkingPolicy, batch: &BatchPolicy) -> Self {
        Self {
            linking,
            batch: BatchOptions::from_policy(batch),
            page_limit: None,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = Some(limit);
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.batch = self.batch.with_progress(progress);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkReport {
    pub links_created: usize,
    /// Existing links rewritten with fresh anchors and relevance.
    pub links_updated: usize,
    /// Pages whose suggestions were all written.
    pub pages_processed: usize,
    pub errors: Vec<PageError>,
    pub timed_out: bool,
}

/// Suggest and accept links for every active page. Failed writes are
/// reported once per page; every link that was written is counted.
pub async fn build_link_network(
    catalog: Arc<dyn PageCatalog>,
    links: Arc<dyn LinkStore>,
    options: NetworkOptions,
) -> Result<NetworkReport> {
    let snapshot = CatalogSnapshot::load(catalog.as_ref())?;
    let limit = options.page_limit.unwrap_or(usize::MAX);
    let paths: Vec<String> = snapshot
        .pages()
        .iter()
        .take(limit)
        .map(|p| p.path.clone())
        .collect();

    if paths.is_empty() {
        info!("No active pages, nothing to link");
        return Ok(NetworkReport::default());
    }
    info!("Building link network over {} pages", paths.len());

    let index: HashMap<String, u64> = paths
        .iter()
        .enumerate()
        .map(|(idx, path)| (path.clone(), idx as u64))
        .collect();
    let order = index.clone();
    let snapshot = Arc::new(snapshot);
    let policy = Arc::new(options.linking.clone());
    let seed = options.seed;

    let outcome = run_batch(paths, &options.batch, move |path: &str| {
        let mut rng = match seed {
            Some(seed) => {
                let offset = index.get(path).copied().unwrap_or_default();
                StdRng::seed_from_u64(seed.wrapping_add(offset))
            }
            None => StdRng::from_entropy(),
        };
        let accepted = auto_generate_links(&snapshot, links.as_ref(), &policy, path, &mut rng);
        Ok((path.to_string(), accepted))
    })
    .await;

    let mut report = NetworkReport {
        errors: outcome.errors,
        timed_out: outcome.timed_out,
        ..NetworkReport::default()
    };
    for (path, accepted) in outcome.results {
        report.links_created += accepted.created;
        report.links_updated += accepted.updated;
        if accepted.is_complete() {
            report.pages_processed += 1;
        } else {
            report.errors.push(write_failure(&path, &accepted));
        }
    }
    report
        .errors
        .sort_by_key(|e| order.get(&e.path).copied().unwrap_or(u64::MAX));

    info!(
        "Link network: {} new and {} updated links over {} pages, {} errors",
        report.links_created,
        report.links_updated,
        report.pages_processed,
        report.errors.len()
    );
    Ok(report)
}

fn write_failure(path: &str, accepted: &AcceptedLinks) -> PageError {
    let message = accepted
        .failures
        .iter()
        .map(|(target, e)| format!("{} -> {}: {}", path, target, e))
        .collect::<Vec<_>>()
        .join("; ");
    let mut error = PageError::new(path, message);
    error.persistence = accepted.failures.iter().any(|(_, e)| e.is_persistence());
    error
}
