//! Policy configuration loaded from `seomesh.toml`.
//!
//! ```toml
//! [linking]
//! accept_threshold = 60
//! suggestions_per_page = 5
//!
//! [audit]
//! sample_limit = 50
//! deep_score_limit = 20
//!
//! [batch]
//! concurrency = 8
//! timeout_secs = 120
//!
//! [content]
//! brand_terms = ["Guinée", "JobGuinée"]
//!
//! [site]
//! name = "JobGuinée"
//! search_console_verification = "abc123"
//! ```
//!
//! Every section is optional and falls back to its defaults.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "seomesh.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoConfig {
    pub linking: LinkingPolicy,
    pub audit: AuditPolicy,
    pub batch: BatchPolicy,
    pub content: ContentPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<SiteProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkingPolicy {
    /// Suggestions at or above this relevance are persisted by automated sweeps.
    pub accept_threshold: u8,
    pub suggestions_per_page: usize,
    /// Same-category detail pages offered to a detail page.
    pub related_detail_limit: usize,
    /// Member detail pages offered to a category or locality page.
    pub member_limit: usize,
    pub root_list_path: String,
    pub resource_path: String,
}

impl Default for LinkingPolicy {
    fn default() -> Self {
        Self {
            accept_threshold: 60,
            suggestions_per_page: 5,
            related_detail_limit: 3,
            member_limit: 5,
            root_list_path: "/jobs".to_string(),
            resource_path: "/formations".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditPolicy {
    pub sample_limit: usize,
    pub deep_score_limit: usize,
    pub quick_win_limit: usize,
}

impl Default for AuditPolicy {
    fn default() -> Self {
        Self {
            sample_limit: 50,
            deep_score_limit: 20,
            quick_win_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchPolicy {
    pub concurrency: usize,
    pub timeout_secs: u64,
}

impl BatchPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentPolicy {
    /// Brand or locale terms rewarded in titles (case-sensitive).
    pub brand_terms: Vec<String>,
    /// Call-to-action verbs rewarded in descriptions (case-sensitive).
    pub action_verbs: Vec<String>,
}

impl Default for ContentPolicy {
    fn default() -> Self {
        Self {
            brand_terms: vec!["Guinée".to_string(), "JobGuinée".to_string()],
            action_verbs: vec![
                "Postulez".to_string(),
                "Découvrez".to_string(),
                "Trouvez".to_string(),
                "Apply".to_string(),
                "Discover".to_string(),
                "Find".to_string(),
            ],
        }
    }
}

/// Global site settings. Its absence is reported by the full-site audit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    pub name: String,
    pub search_console_verification: Option<String>,
}

impl SeoConfig {
    /// Defaults plus a configured site profile.
    pub fn with_site(name: impl Into<String>) -> Self {
        Self {
            site: Some(SiteProfile {
                name: name.into(),
                search_console_verification: None,
            }),
            ..Self::default()
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the config at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
