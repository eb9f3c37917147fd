//! Cookie import: tab-delimited export parsing, on-disk feed, CDP injection
//!
//! The import source is a browser devtools cookie-table export: one row per
//! cookie, tab-separated, fixed column order. Parsing is pure; persistence
//! and injection are separate steps owned by the caller.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, CookieSameSite, TimeSinceEpoch};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::browser::{BrowserError, BrowserResult};
use crate::events::{Event, EventLog};

/// One normalized cookie from the import feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Epoch seconds; None when the export carried no parsable expiry
    pub expiry: Option<i64>,
    pub secure: bool,
    /// The export format cannot express httpOnly, so this is always false
    #[serde(rename = "httpOnly")]
    pub http_only: bool,
    #[serde(rename = "sameSite")]
    pub same_site: String,
}

/// Column layout of the export: name, value, domain, path, expiry,
/// (unused), secure marker, (unused), (unused), sameSite.
const MIN_FIELDS: usize = 7;
const SECURE_MARK: &str = "\u{2713}";

/// Parse a tab-delimited cookie table into records, preserving row order.
///
/// Rows with fewer than 7 fields are skipped. An unparsable expiry yields
/// `None` rather than dropping the row.
pub fn parse_cookie_table(raw: &str) -> Vec<CookieRecord> {
    let mut cookies = Vec::new();

    for line in raw.trim().lines() {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < MIN_FIELDS {
            continue;
        }

        let expiry = NaiveDateTime::parse_from_str(parts[4], "%Y-%m-%dT%H:%M:%S%.fZ")
            .map(|dt| dt.and_utc().timestamp())
            .ok();

        let same_site = parts
            .get(9)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .unwrap_or("Lax")
            .to_string();

        cookies.push(CookieRecord {
            name: parts[0].to_string(),
            value: parts[1].to_string(),
            domain: parts[2].to_string(),
            path: parts[3].to_string(),
            expiry,
            secure: parts[6].trim() == SECURE_MARK,
            http_only: false,
            same_site,
        });
    }

    cookies
}

/// Persisted cookie feed on disk: a JSON array, rewritten wholesale on
/// each import. Absence is non-fatal (no cookies to inject).
pub struct CookieStore {
    path: PathBuf,
}

impl CookieStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn save(&self, records: &[CookieRecord]) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    pub async fn load(&self) -> anyhow::Result<Vec<CookieRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let records = serde_json::from_str(&contents)?;
        Ok(records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Counts for one injection pass
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectOutcome {
    pub added: usize,
    pub failed: usize,
}

/// Inject records into a live page's cookie jar, then reload.
///
/// A per-record failure is logged and counted, never aborting the rest.
/// Each (name, domain, path) is injected at most once per pass. The final
/// reload makes the cookies take effect; if the reload fails the whole
/// operation fails even though individual additions may have succeeded.
pub async fn inject(
    page: &Page,
    records: &[CookieRecord],
    events: &EventLog,
) -> BrowserResult<InjectOutcome> {
    let mut outcome = InjectOutcome::default();
    let mut seen: HashSet<(String, String, String)> = HashSet::new();

    for record in records {
        if record.name.is_empty() || record.value.is_empty() {
            continue;
        }
        if !seen.insert((
            record.name.clone(),
            record.domain.clone(),
            record.path.clone(),
        )) {
            debug!("Skipping duplicate cookie '{}'", record.name);
            continue;
        }

        match add_cookie(page, record).await {
            Ok(()) => outcome.added += 1,
            Err(e) => {
                outcome.failed += 1;
                events
                    .append(
                        Event::new("load_cookies", "error")
                            .field("cookie", record.name.as_str())
                            .field("error", e.to_string()),
                    )
                    .await;
            }
        }
    }

    page.reload()
        .await
        .map_err(|e| BrowserError::NavigationFailed(format!("reload failed: {e}")))?;

    events
        .append(
            Event::new("load_cookies", "success")
                .field("added", outcome.added)
                .field("failed", outcome.failed),
        )
        .await;

    Ok(outcome)
}

async fn add_cookie(page: &Page, record: &CookieRecord) -> BrowserResult<()> {
    let mut builder = CookieParam::builder()
        .name(record.name.clone())
        .value(record.value.clone())
        .domain(record.domain.clone())
        .path(record.path.clone())
        .secure(record.secure)
        .http_only(record.http_only)
        .same_site(parse_same_site(&record.same_site));

    if let Some(expiry) = record.expiry {
        builder = builder.expires(TimeSinceEpoch::new(expiry as f64));
    }

    let param = builder
        .build()
        .map_err(BrowserError::InteractionFailed)?;

    page.set_cookies(vec![param]).await?;
    Ok(())
}

fn parse_same_site(value: &str) -> CookieSameSite {
    match value {
        "Strict" => CookieSameSite::Strict,
        "None" => CookieSameSite::None,
        _ => CookieSameSite::Lax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = "SID\tabc123\t.google.com\t/\t2026-01-15T10:30:00.000Z\t92\t\u{2713}\t\u{2713}\t\tLax\thigh";

    #[test]
    fn parses_full_row() {
        let cookies = parse_cookie_table(ROW);
        assert_eq!(cookies.len(), 1);

        let c = &cookies[0];
        assert_eq!(c.name, "SID");
        assert_eq!(c.value, "abc123");
        assert_eq!(c.domain, ".google.com");
        assert_eq!(c.path, "/");
        assert!(c.secure);
        assert!(!c.http_only);
        assert_eq!(c.same_site, "Lax");
    }

    #[test]
    fn expiry_is_epoch_seconds() {
        let cookies = parse_cookie_table(ROW);
        // 2026-01-15T10:30:00Z
        assert_eq!(cookies[0].expiry, Some(1768473000));
    }

    #[test]
    fn unparsable_expiry_yields_none() {
        let row = "SID\tabc\t.google.com\t/\tnot-a-date\t92\t\u{2713}";
        let cookies = parse_cookie_table(row);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].expiry, None);
    }

    #[test]
    fn short_rows_are_dropped() {
        let raw = "only\tsix\tfields\there\tnot\tenough\nSID\tv\td\t/\tx\t\t\u{2713}";
        let cookies = parse_cookie_table(raw);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "SID");
    }

    #[test]
    fn secure_requires_checkmark() {
        let row = "SID\tv\td\t/\tx\t92\tyes";
        assert!(!parse_cookie_table(row)[0].secure);

        let row = "SID\tv\td\t/\tx\t92\t \u{2713} ";
        assert!(parse_cookie_table(row)[0].secure);
    }

    #[test]
    fn missing_same_site_defaults_to_lax() {
        let row = "SID\tv\td\t/\tx\t92\t\u{2713}";
        assert_eq!(parse_cookie_table(row)[0].same_site, "Lax");

        let row = "SID\tv\td\t/\tx\t92\t\u{2713}\t\t\tStrict";
        assert_eq!(parse_cookie_table(row)[0].same_site, "Strict");
    }

    #[test]
    fn output_order_matches_input_order() {
        let raw = "b\tv\td\t/\tx\t\t\nz\tv\td\t/\tx\t\t\na\tv\td\t/\tx\t\t";
        let names: Vec<String> = parse_cookie_table(raw)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["b", "z", "a"]);
    }

    #[tokio::test]
    async fn store_round_trips_parser_output() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(dir.path().join("cookies.json"));

        let parsed = parse_cookie_table(ROW);
        store.save(&parsed).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, parsed);
    }

    #[tokio::test]
    async fn missing_store_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(dir.path().join("absent.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[test]
    fn same_site_parsing() {
        assert_eq!(parse_same_site("Strict"), CookieSameSite::Strict);
        assert_eq!(parse_same_site("None"), CookieSameSite::None);
        assert_eq!(parse_same_site("Lax"), CookieSameSite::Lax);
        assert_eq!(parse_same_site("unspecified"), CookieSameSite::Lax);
    }
}
