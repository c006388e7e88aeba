// Tests for page quality scoring and single-page audits

use seomesh_core::SeoError;
use seomesh_core::catalog::{LinkFilter, LinkStore, LinkWrite, SchemaStore};
use seomesh_core::config::ContentPolicy;
use seomesh_core::data::Database;
use seomesh_core::model::{ChangeFrequency, Link, Page, SocialPreview};
use seomesh_core::scoring::{IssueKind, QualityScorer, overall_of};
use std::collections::HashMap;

const FULL_DESCRIPTION: &str = "Apply now for this accountant position in Conakry. Manage ledgers, prepare monthly reports and support the finance team every day.";

fn optimized_page() -> Page {
    Page::new("/job-detail/1")
        .with_title("Accountant in Conakry | JobGuinée")
        .with_description(FULL_DESCRIPTION)
        .with_keywords(["accountant", "finance", "conakry"])
        .with_canonical("https://catalog.example/job-detail/1")
        .with_priority(0.9)
        .with_change_frequency(ChangeFrequency::Daily)
        .with_social(SocialPreview {
            title: Some("Accountant in Conakry".to_string()),
            description: Some("Apply now".to_string()),
            image: Some("https://catalog.example/og/1.png".to_string()),
            kind: Some("website".to_string()),
        })
        .with_category("Finance")
        .with_locality("Conakry")
        .with_entity("job-1")
}

fn bare_page() -> Page {
    Page::new("/job-detail/2").with_title("Accountan1")
}

fn link_to(target: &str, from: usize) -> Link {
    Link::new(format!("/job-detail/src-{}", from), target, "View this job offer", 80).unwrap()
}

fn db_with_inbound(target: &str, count: usize) -> Database {
    let db = Database::open_in_memory().unwrap();
    for i in 0..count {
        db.upsert_link(&link_to(target, i)).unwrap();
    }
    db
}

/// Link and schema store whose every call fails
struct FailingStore;

impl LinkStore for FailingStore {
    fn list_active_links(&self, _filter: &LinkFilter) -> seomesh_core::Result<Vec<Link>> {
        Err(SeoError::Other("store offline".to_string()))
    }
    fn list_all_links(&self) -> seomesh_core::Result<Vec<Link>> {
        Err(SeoError::Other("store offline".to_string()))
    }
    fn upsert_link(&self, _link: &Link) -> seomesh_core::Result<LinkWrite> {
        Err(SeoError::Other("store offline".to_string()))
    }
    fn count_inbound(&self, _path: &str) -> seomesh_core::Result<usize> {
        Err(SeoError::Other("store offline".to_string()))
    }
    fn count_outbound(&self, _path: &str) -> seomesh_core::Result<usize> {
        Err(SeoError::Other("store offline".to_string()))
    }
    fn mark_link_broken(&self, _source: &str, _target: &str) -> seomesh_core::Result<bool> {
        Err(SeoError::Other("store offline".to_string()))
    }
}

impl SchemaStore for FailingStore {
    fn has_active_schema(&self, _entity_id: &str) -> seomesh_core::Result<bool> {
        Err(SeoError::Other("store offline".to_string()))
    }
    fn list_active_schema_types(&self) -> seomesh_core::Result<Vec<String>> {
        Err(SeoError::Other("store offline".to_string()))
    }
}

// ============================================================================
// Dimensions
// ============================================================================

#[test]
fn test_short_title_page_scores_low() {
    let db = Database::open_in_memory().unwrap();
    let policy = ContentPolicy::default();
    let scorer = QualityScorer::new(&policy, &db, &db);

    let score = scorer.score(&bare_page());

    assert!(score.technical <= 25);
    assert_eq!(score.content, 0);
    assert_eq!(score.off_page, 30);
    assert_eq!(
        score.overall,
        overall_of(score.technical, score.content, score.on_page, score.off_page)
    );
}

#[test]
fn test_optimized_page_scores_full_marks() {
    let db = db_with_inbound("/job-detail/1", 5);
    let policy = ContentPolicy::default();
    let scorer = QualityScorer::new(&policy, &db, &db);

    let score = scorer.score(&optimized_page());

    assert_eq!(score.technical, 100);
    assert_eq!(score.content, 100);
    assert_eq!(score.on_page, 100);
    assert_eq!(score.off_page, 100);
    assert_eq!(score.overall, 100);
    assert!(score.details.action_items.is_empty());
    assert!(!score.details.strengths.is_empty());
}

#[test]
fn test_every_dimension_stays_in_range() {
    let db = db_with_inbound("/job-detail/1", 12);
    db.add_schema("job-1", "JobPosting", None).unwrap();
    let policy = ContentPolicy::default();
    let scorer = QualityScorer::new(&policy, &db, &db);

    for page in [optimized_page(), bare_page(), Page::new("/about")] {
        let score = scorer.score(&page);
        for dimension in score.dimensions() {
            assert!(dimension <= 100);
        }
        assert!(score.overall <= 100);
    }
}

#[test]
fn test_off_page_steps_by_inbound_count() {
    let policy = ContentPolicy::default();
    for (inbound, expected) in [(0, 30), (1, 60), (2, 60), (3, 80), (4, 80), (5, 100), (9, 100)] {
        let db = db_with_inbound("/job-detail/2", inbound);
        let scorer = QualityScorer::new(&policy, &db, &db);
        assert_eq!(scorer.score_off_page(&bare_page()), expected, "inbound {}", inbound);
    }
}

#[test]
fn test_schema_bonus_is_capped() {
    let policy = ContentPolicy::default();

    let db = db_with_inbound("/job-detail/2", 1);
    db.add_schema("job-2", "JobPosting", None).unwrap();
    let scorer = QualityScorer::new(&policy, &db, &db);
    assert_eq!(scorer.score_off_page(&bare_page().with_entity("job-2")), 80);

    let db = db_with_inbound("/job-detail/2", 5);
    db.add_schema("job-2", "JobPosting", None).unwrap();
    let scorer = QualityScorer::new(&policy, &db, &db);
    assert_eq!(scorer.score_off_page(&bare_page().with_entity("job-2")), 100);
}

#[test]
fn test_inactive_schema_gives_no_bonus() {
    let policy = ContentPolicy::default();
    let db = db_with_inbound("/job-detail/2", 1);
    let id = db.add_schema("job-2", "JobPosting", None).unwrap();
    db.deactivate_schema(id).unwrap();

    let scorer = QualityScorer::new(&policy, &db, &db);
    assert_eq!(scorer.score_off_page(&bare_page().with_entity("job-2")), 60);
}

#[test]
fn test_link_store_failure_keeps_base_off_page_score() {
    let policy = ContentPolicy::default();
    let scorer = QualityScorer::new(&policy, &FailingStore, &FailingStore);

    let score = scorer.score(&optimized_page());
    assert_eq!(score.off_page, 50);
    assert_eq!(score.technical, 100);
}

#[test]
fn test_precomputed_inbound_counts_skip_the_store() {
    let policy = ContentPolicy::default();
    let counts: HashMap<String, usize> = [("/job-detail/2".to_string(), 3)].into_iter().collect();
    let scorer = QualityScorer::new(&policy, &FailingStore, &FailingStore).with_inbound_counts(&counts);

    assert_eq!(scorer.score_off_page(&bare_page()), 80);
    assert_eq!(scorer.score_off_page(&Page::new("/job-detail/3")), 30);
}

#[test]
fn test_keyword_match_ignores_case() {
    let db = Database::open_in_memory().unwrap();
    let policy = ContentPolicy::default();
    let scorer = QualityScorer::new(&policy, &db, &db);

    let page = Page::new("/job-detail/4")
        .with_title("ACCOUNTANT wanted")
        .with_keywords(["accountant"]);
    // 15 for one keyword, 20 for the title match
    assert_eq!(scorer.score_content(&page), 35);
}

#[test]
fn test_brand_terms_are_case_sensitive() {
    let db = Database::open_in_memory().unwrap();
    let policy = ContentPolicy::default();
    let scorer = QualityScorer::new(&policy, &db, &db);

    let branded = Page::new("/job-detail/5").with_title("Jobs in Guinée");
    let lowercase = Page::new("/job-detail/5").with_title("Jobs in guinée");
    assert_eq!(scorer.score_content(&branded), 10);
    assert_eq!(scorer.score_content(&lowercase), 0);
}

#[test]
fn test_custom_content_policy() {
    let db = Database::open_in_memory().unwrap();
    let policy = ContentPolicy {
        brand_terms: vec!["Acme".to_string()],
        action_verbs: vec!["Join".to_string()],
    };
    let scorer = QualityScorer::new(&policy, &db, &db);

    let page = Page::new("/job-detail/6")
        .with_title("Acme careers")
        .with_description("Join the team");
    assert_eq!(scorer.score_content(&page), 20);
}

#[test]
fn test_on_page_priority_steps() {
    let db = Database::open_in_memory().unwrap();
    let policy = ContentPolicy::default();
    let scorer = QualityScorer::new(&policy, &db, &db);

    let base = Page::new("/job-detail/7").with_change_frequency(ChangeFrequency::Monthly);
    assert_eq!(scorer.score_on_page(&base.clone().with_priority(0.9)), 30);
    assert_eq!(scorer.score_on_page(&base.clone().with_priority(0.6)), 25);
    assert_eq!(scorer.score_on_page(&base.with_priority(0.1)), 20);
}

// ============================================================================
// Single-page audits
// ============================================================================

#[test]
fn test_audit_of_bare_page_lists_issues_and_fixes() {
    let db = Database::open_in_memory().unwrap();
    let policy = ContentPolicy::default();
    let scorer = QualityScorer::new(&policy, &db, &db);

    let audit = scorer.audit(&bare_page());

    let messages: Vec<&str> = audit.issues.iter().map(|i| i.message.as_str()).collect();
    assert!(messages.contains(&"Title too short"));
    assert!(messages.contains(&"Missing description"));
    assert!(messages.contains(&"Missing canonical URL"));
    assert!(messages.contains(&"No keywords defined"));
    assert_eq!(audit.count(IssueKind::Error), 2);
    assert!(audit.issues.iter().all(|i| !i.fix.is_empty()));

    assert!(
        audit
            .recommendations
            .iter()
            .any(|r| r == "[CRITICAL] Add a canonical URL")
    );
    assert!(audit.recommendations.iter().any(|r| r.starts_with("Low overall score")));
}

#[test]
fn test_action_items_are_sorted_critical_first() {
    let db = Database::open_in_memory().unwrap();
    let policy = ContentPolicy::default();
    let scorer = QualityScorer::new(&policy, &db, &db);

    let items = scorer.score(&bare_page()).details.action_items;
    assert!(!items.is_empty());
    for window in items.windows(2) {
        assert!(window[0].priority <= window[1].priority);
    }
    assert_eq!(items[0].title, "Add a canonical URL");
}

#[test]
fn test_audit_page_by_path() {
    let db = Database::open_in_memory().unwrap();
    db.upsert_page(&optimized_page()).unwrap();
    db.upsert_page(&Page::new("/job-detail/8").with_title("Closed offer").deactivated())
        .unwrap();
    let policy = ContentPolicy::default();
    let scorer = QualityScorer::new(&policy, &db, &db);

    let audit = scorer.audit_page(&db, "/job-detail/1").unwrap();
    assert_eq!(audit.path, "/job-detail/1");
    assert!(audit.issues.is_empty());

    let inactive = scorer.audit_page(&db, "/job-detail/8").unwrap();
    assert!(inactive.issues.iter().any(|i| i.message == "Inactive page"));

    let missing = scorer.audit_page(&db, "/job-detail/404");
    assert!(matches!(missing, Err(SeoError::NotFound(_))));
}
