use crate::audit::FullAuditReport;
use crate::catalog::{AuditStore, LinkFilter, LinkStore, LinkWrite, PageCatalog, SchemaStore};
use crate::error::{Result, SeoError};
use crate::model::{ChangeFrequency, Link, LinkType, Page, PageType, SocialPreview};
use crate::scoring::Score;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

pub struct Database {
    conn: Mutex<Connection>,
}

const PAGE_COLUMNS: &str = "path, page_type, title, description, keywords, canonical_url, priority, \
     change_frequency, active, social, category, locality, entity_id";

const LINK_COLUMNS: &str = "source, target, anchor_text, link_type, relevance, active, broken";

fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn page_from_row(row: &Row) -> rusqlite::Result<Page> {
    let page_type: String = row.get(1)?;
    let change_frequency: String = row.get(7)?;

    Ok(Page {
        path: row.get(0)?,
        page_type: PageType::from_str(&page_type).unwrap_or(PageType::Other),
        title: row.get(2)?,
        description: row.get(3)?,
        keywords: json_column(row, 4)?,
        canonical_url: row.get(5)?,
        priority: row.get(6)?,
        change_frequency: ChangeFrequency::from_str(&change_frequency).unwrap_or_default(),
        active: row.get(8)?,
        social: json_column::<SocialPreview>(row, 9)?,
        category: row.get(10)?,
        locality: row.get(11)?,
        entity_id: row.get(12)?,
    })
}

fn link_from_row(row: &Row) -> rusqlite::Result<Link> {
    let link_type: String = row.get(3)?;
    let relevance: i64 = row.get(4)?;

    Ok(Link {
        source: row.get(0)?,
        target: row.get(1)?,
        anchor_text: row.get(2)?,
        link_type: LinkType::from_str(&link_type).unwrap_or(LinkType::Navigational),
        relevance: relevance.clamp(0, 100) as u8,
        active: row.get(5)?,
        broken: row.get(6)?,
    })
}

impl Database {
    pub fn drop(path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        Ok(())
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;  -- 64MB cache
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Database {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| SeoError::LockPoisoned)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn()?.execute_batch(
            "
-- Catalog pages
CREATE TABLE IF NOT EXISTS pages (
    path TEXT PRIMARY KEY,
    page_type TEXT NOT NULL CHECK(page_type IN ('detail', 'category', 'locality', 'list', 'article', 'course', 'other')),
    title TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    keywords TEXT NOT NULL DEFAULT '[]',   -- JSON array
    canonical_url TEXT,
    priority REAL NOT NULL DEFAULT 0.5,
    change_frequency TEXT NOT NULL DEFAULT 'weekly',
    active BOOLEAN NOT NULL DEFAULT 1,
    social TEXT NOT NULL DEFAULT '{}',     -- JSON object
    category TEXT,
    locality TEXT,
    entity_id TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- Accepted internal links, one per ordered pair
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    target TEXT NOT NULL,
    anchor_text TEXT NOT NULL,
    link_type TEXT NOT NULL CHECK(link_type IN ('contextual', 'related', 'navigational')),
    relevance INTEGER NOT NULL CHECK(relevance BETWEEN 0 AND 100),
    active BOOLEAN NOT NULL DEFAULT 1,
    broken BOOLEAN NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE(source, target),
    CHECK(source <> target)
);

-- Structured data attachments
CREATE TABLE IF NOT EXISTS schemas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_id TEXT NOT NULL,
    schema_type TEXT NOT NULL,
    data TEXT,                             -- JSON-LD payload
    active BOOLEAN NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL
);

-- Score snapshots
CREATE TABLE IF NOT EXISTS scores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_path TEXT NOT NULL,
    computed_at INTEGER NOT NULL,
    overall INTEGER NOT NULL,
    data TEXT NOT NULL                     -- JSON Score
);

-- Full-site audit reports
CREATE TABLE IF NOT EXISTS audit_reports (
    id TEXT PRIMARY KEY,
    overall_score INTEGER NOT NULL,
    technical_score INTEGER NOT NULL,
    content_score INTEGER NOT NULL,
    semantic_score INTEGER NOT NULL,
    performance_score INTEGER NOT NULL,
    issues_count INTEGER NOT NULL,
    opportunities_count INTEGER NOT NULL,
    pages_analyzed INTEGER NOT NULL,
    audit_data TEXT NOT NULL,              -- JSON FullAuditReport
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_active ON pages(active, page_type);
CREATE INDEX IF NOT EXISTS idx_links_target ON links(target, active);
CREATE INDEX IF NOT EXISTS idx_links_source ON links(source, active);
CREATE INDEX IF NOT EXISTS idx_schemas_entity ON schemas(entity_id, active);
CREATE INDEX IF NOT EXISTS idx_scores_page ON scores(page_path, computed_at);
CREATE INDEX IF NOT EXISTS idx_audit_reports_created ON audit_reports(created_at);
            ",
        )?;
        Ok(())
    }

    // Page management

    /// Insert a page or update its metadata. The stored type of an existing
    /// path is never rewritten.
    pub fn upsert_page(&self, page: &Page) -> Result<()> {
        let conn = self.conn()?;
        Self::upsert_page_with(&conn, page)
    }

    fn upsert_page_with(conn: &Connection, page: &Page) -> Result<()> {
        let timestamp = current_timestamp();
        conn.execute(
            "INSERT INTO pages (
                path, page_type, title, description, keywords, canonical_url, priority,
                change_frequency, active, social, category, locality, entity_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
            ON CONFLICT(path) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                keywords = excluded.keywords,
                canonical_url = excluded.canonical_url,
                priority = excluded.priority,
                change_frequency = excluded.change_frequency,
                active = excluded.active,
                social = excluded.social,
                category = excluded.category,
                locality = excluded.locality,
                entity_id = excluded.entity_id,
                updated_at = excluded.updated_at",
            params![
                &page.path,
                page.page_type.as_str(),
                &page.title,
                &page.description,
                serde_json::to_string(&page.keywords)?,
                &page.canonical_url,
                page.priority,
                page.change_frequency.as_str(),
                page.active,
                serde_json::to_string(&page.social)?,
                &page.category,
                &page.locality,
                &page.entity_id,
                timestamp,
            ],
        )?;
        Ok(())
    }

    /// Upsert many pages in one transaction.
    pub fn import_pages(&self, pages: &[Page]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for page in pages {
            Self::upsert_page_with(&tx, page)?;
        }
        tx.commit()?;
        debug!("Imported {} pages", pages.len());
        Ok(pages.len())
    }

    pub fn deactivate_page(&self, path: &str) -> Result<bool> {
        let changed = self.conn()?.execute(
            "UPDATE pages SET active = 0, updated_at = ?1 WHERE path = ?2",
            params![current_timestamp(), path],
        )?;
        Ok(changed > 0)
    }

    // Structured data

    pub fn add_schema(&self, entity_id: &str, schema_type: &str, data: Option<&str>) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO schemas (entity_id, schema_type, data, active, created_at) VALUES (?1, ?2, ?3, 1, ?4)",
            params![entity_id, schema_type, data, current_timestamp()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn deactivate_schema(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn()?
            .execute("UPDATE schemas SET active = 0 WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}

impl PageCatalog for Database {
    fn list_active_pages(&self) -> Result<Vec<Page>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pages WHERE active = 1 ORDER BY rowid",
            PAGE_COLUMNS
        ))?;
        let pages = stmt
            .query_map([], page_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pages)
    }

    fn get_page(&self, path: &str) -> Result<Option<Page>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM pages WHERE path = ?1", PAGE_COLUMNS))?;
        let page = stmt.query_row(params![path], page_from_row).optional()?;
        Ok(page)
    }

    fn count_active_by_type(&self, page_type: PageType) -> Result<usize> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM pages WHERE active = 1 AND page_type = ?1",
            params![page_type.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl LinkStore for Database {
    fn list_active_links(&self, filter: &LinkFilter) -> Result<Vec<Link>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM links
             WHERE active = 1 AND (?1 IS NULL OR source = ?1) AND (?2 IS NULL OR target = ?2)
             ORDER BY id",
            LINK_COLUMNS
        ))?;
        let links = stmt
            .query_map(params![&filter.source, &filter.target], link_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(links)
    }

    fn list_all_links(&self) -> Result<Vec<Link>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM links ORDER BY id", LINK_COLUMNS))?;
        let links = stmt
            .query_map([], link_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(links)
    }

    fn upsert_link(&self, link: &Link) -> Result<LinkWrite> {
        if link.source == link.target {
            return Err(SeoError::SelfLink(link.source.clone()));
        }
        let timestamp = current_timestamp();
        let conn = self.conn()?;
        let existed: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM links WHERE source = ?1 AND target = ?2)",
            params![&link.source, &link.target],
            |row| row.get(0),
        )?;
        conn.execute(
            "INSERT INTO links (
                source, target, anchor_text, link_type, relevance, active, broken, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            ON CONFLICT(source, target) DO UPDATE SET
                anchor_text = excluded.anchor_text,
                link_type = excluded.link_type,
                relevance = excluded.relevance,
                active = excluded.active,
                broken = excluded.broken,
                updated_at = excluded.updated_at",
            params![
                &link.source,
                &link.target,
                &link.anchor_text,
                link.link_type.as_str(),
                link.relevance.min(100),
                link.active,
                link.broken,
                timestamp,
            ],
        )?;
        Ok(if existed {
            LinkWrite::Updated
        } else {
            LinkWrite::Created
        })
    }

    fn count_inbound(&self, path: &str) -> Result<usize> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM links WHERE target = ?1 AND active = 1",
            params![path],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn count_outbound(&self, path: &str) -> Result<usize> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM links WHERE source = ?1 AND active = 1",
            params![path],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn mark_link_broken(&self, source: &str, target: &str) -> Result<bool> {
        let changed = self.conn()?.execute(
            "UPDATE links SET broken = 1, updated_at = ?1 WHERE source = ?2 AND target = ?3",
            params![current_timestamp(), source, target],
        )?;
        Ok(changed > 0)
    }
}

impl SchemaStore for Database {
    fn has_active_schema(&self, entity_id: &str) -> Result<bool> {
        let exists: bool = self.conn()?.query_row(
            "SELECT EXISTS(SELECT 1 FROM schemas WHERE entity_id = ?1 AND active = 1)",
            params![entity_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn list_active_schema_types(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT schema_type FROM schemas WHERE active = 1 ORDER BY id")?;
        let types = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(types)
    }
}

impl AuditStore for Database {
    fn save_score(&self, score: &Score) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO scores (page_path, computed_at, overall, data) VALUES (?1, ?2, ?3, ?4)",
            params![
                &score.page_path,
                score.computed_at.timestamp_millis(),
                score.overall,
                serde_json::to_string(score)?,
            ],
        )?;
        Ok(())
    }

    fn latest_scores(&self, path: &str, limit: usize) -> Result<Vec<Score>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT data FROM scores WHERE page_path = ?1 ORDER BY computed_at DESC, id DESC LIMIT ?2",
        )?;
        let scores = stmt
            .query_map(params![path, limit as i64], |row| json_column(row, 0))?
            .collect::<rusqlite::Result<Vec<Score>>>()?;
        Ok(scores)
    }

    fn save_full_audit(&self, report: &FullAuditReport) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO audit_reports (
                id, overall_score, technical_score, content_score, semantic_score,
                performance_score, issues_count, opportunities_count, pages_analyzed,
                audit_data, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &report.id,
                report.overall_score,
                report.technical_score,
                report.content_score,
                report.semantic_score,
                report.performance_score,
                report.issues.len() as i64,
                report.opportunities.len() as i64,
                report.pages_analyzed as i64,
                serde_json::to_string(report)?,
                report.audited_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn latest_full_audit(&self) -> Result<Option<FullAuditReport>> {
        Ok(self.full_audit_history(1)?.into_iter().next())
    }

    fn full_audit_history(&self, limit: usize) -> Result<Vec<FullAuditReport>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT audit_data FROM audit_reports ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )?;
        let reports = stmt
            .query_map(params![limit as i64], |row| json_column(row, 0))?
            .collect::<rusqlite::Result<Vec<FullAuditReport>>>()?;
        Ok(reports)
    }
}
