//! SQLite persistence for browser history databases.
//!
//! RULE: Only store.rs talks to SQLite.
//! The writer hands over a finished HistoryStore; this module lays it
//! out in the schema the target browser uses.

use crate::{
    artifact::HistoryStore,
    error::{PopError, PopResult},
};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::path::Path;

/// LINK | CHAIN_START | CHAIN_END
const CHROMIUM_LINK_TRANSITION: i64 = 805_306_368;
/// TYPED | CHAIN_START | CHAIN_END
const CHROMIUM_TYPED_TRANSITION: i64 = 805_306_369;
const FIREFOX_VISIT_LINK: i64 = 1;
const FIREFOX_VISIT_TYPED: i64 = 2;

/// Microseconds between 1601-01-01 and 1970-01-01.
const WEBKIT_EPOCH_OFFSET_MICROS: i64 = 11_644_473_600_000_000;

/// Chromium timestamp: microseconds since 1601-01-01.
pub fn chromium_time(t: NaiveDateTime) -> i64 {
    unix_micros(t) + WEBKIT_EPOCH_OFFSET_MICROS
}

/// Firefox PRTime: microseconds since the Unix epoch.
pub fn firefox_time(t: NaiveDateTime) -> i64 {
    unix_micros(t)
}

fn unix_micros(t: NaiveDateTime) -> i64 {
    t.and_utc().timestamp_micros()
}

/// Inverse of `chromium_time`, for readers and tests.
pub fn from_chromium_time(micros: i64) -> Option<NaiveDateTime> {
    let unix = micros - WEBKIT_EPOCH_OFFSET_MICROS;
    let nanos = (unix.rem_euclid(1_000_000) * 1_000) as u32;
    chrono::DateTime::from_timestamp(unix.div_euclid(1_000_000), nanos).map(|dt| dt.naive_utc())
}

/// `github.com` -> `moc.buhtig.`, as Firefox stores hosts.
pub fn reverse_host(url: &str) -> String {
    let host = url
        .split("://")
        .nth(1)
        .unwrap_or(url)
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let mut rev: String = host.chars().rev().collect();
    rev.push('.');
    rev
}

pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Create a fresh database file at `path`, replacing any existing one.
    pub fn create(path: &Path) -> PopResult<Self> {
        if path.exists() {
            std::fs::remove_file(path).map_err(|e| PopError::io(path, e))?;
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used by the memory sink and tests).
    pub fn in_memory() -> PopResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Open an existing database for reading back.
    pub fn open(path: &Path) -> PopResult<Self> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    // ── Chromium ───────────────────────────────────────────────

    pub fn write_chromium(&self, history: &HistoryStore) -> PopResult<()> {
        self.conn
            .execute_batch(include_str!("../migrations/001_chromium_history.sql"))?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', '61'), ('last_compatible_version', '16')",
            [],
        )?;

        let mut visit_id: i64 = 0;
        for (idx, page) in history.pages.iter().enumerate() {
            let url_id = idx as i64 + 1;
            let last = page.last_visit().map(chromium_time).unwrap_or(0);
            tx.execute(
                "INSERT INTO urls (id, url, title, visit_count, typed_count, last_visit_time, hidden)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
                params![url_id, page.url, page.title, page.visit_count() as i64, page.typed_count, last],
            )?;
            for (n, (visit, secs)) in page.visits.iter().zip(&page.durations).enumerate() {
                visit_id += 1;
                let transition = if (n as u32) < page.typed_count {
                    CHROMIUM_TYPED_TRANSITION
                } else {
                    CHROMIUM_LINK_TRANSITION
                };
                tx.execute(
                    "INSERT INTO visits (id, url, visit_time, from_visit, transition, segment_id, visit_duration)
                     VALUES (?1, ?2, ?3, 0, ?4, NULL, ?5)",
                    params![visit_id, url_id, chromium_time(*visit), transition, *secs as i64 * 1_000_000],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// `(url, visit_time)` for every Chromium visit, in visit-time order.
    pub fn chromium_visits(&self) -> PopResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT u.url, v.visit_time FROM visits v JOIN urls u ON u.id = v.url
             ORDER BY v.visit_time ASC, v.id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// `(url, visit_count)` in row order.
    pub fn chromium_urls(&self) -> PopResult<Vec<(String, i64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, visit_count FROM urls ORDER BY id ASC")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Firefox ────────────────────────────────────────────────

    pub fn write_firefox(&self, history: &HistoryStore) -> PopResult<()> {
        self.conn
            .execute_batch(include_str!("../migrations/002_firefox_places.sql"))?;
        let tx = self.conn.unchecked_transaction()?;

        let mut visit_id: i64 = 0;
        for (idx, page) in history.pages.iter().enumerate() {
            let place_id = idx as i64 + 1;
            let visits = page.visit_count() as i64;
            tx.execute(
                "INSERT INTO moz_places (id, url, title, rev_host, visit_count, hidden, typed, frecency, last_visit_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8)",
                params![
                    place_id,
                    page.url,
                    page.title,
                    reverse_host(&page.url),
                    visits,
                    i64::from(page.typed_count > 0),
                    visits * 100,
                    page.last_visit().map(firefox_time),
                ],
            )?;
            for (n, visit) in page.visits.iter().enumerate() {
                visit_id += 1;
                let visit_type = if (n as u32) < page.typed_count {
                    FIREFOX_VISIT_TYPED
                } else {
                    FIREFOX_VISIT_LINK
                };
                tx.execute(
                    "INSERT INTO moz_historyvisits (id, from_visit, place_id, visit_date, visit_type, session)
                     VALUES (?1, 0, ?2, ?3, ?4, 0)",
                    params![visit_id, place_id, firefox_time(*visit), visit_type],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// `(url, visit_date)` for every Firefox visit, in visit-date order.
    pub fn firefox_visits(&self) -> PopResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.url, v.visit_date FROM moz_historyvisits v JOIN moz_places p ON p.id = v.place_id
             ORDER BY v.visit_date ASC, v.id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Size ───────────────────────────────────────────────────

    /// Database size in bytes (page count × page size).
    pub fn size_bytes(&self) -> PopResult<u64> {
        let pages: i64 = self.conn.query_row("PRAGMA page_count", [], |r| r.get(0))?;
        let page_size: i64 = self.conn.query_row("PRAGMA page_size", [], |r| r.get(0))?;
        Ok((pages * page_size).max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::PageVisits;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn sample() -> HistoryStore {
        HistoryStore {
            pages: vec![
                PageVisits {
                    site: "github.com".into(),
                    url: "https://github.com/dashboard".into(),
                    title: "GitHub".into(),
                    typed_count: 1,
                    visits: vec![at(1, 9), at(2, 9), at(3, 9)],
                    durations: vec![30, 40, 50],
                },
                PageVisits {
                    site: "reddit.com".into(),
                    url: "https://reddit.com".into(),
                    title: "Reddit".into(),
                    typed_count: 0,
                    visits: vec![at(2, 20)],
                    durations: vec![120],
                },
            ],
        }
    }

    #[test]
    fn chromium_time_is_offset_from_1601() {
        let epoch = NaiveDate::from_ymd_opt(1601, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(chromium_time(epoch), 0);
        let t = at(1, 9);
        assert_eq!(from_chromium_time(chromium_time(t)), Some(t));
    }

    #[test]
    fn reverse_host_matches_firefox_form() {
        assert_eq!(reverse_host("https://news.ycombinator.com/item?id=1"), "moc.rotanibmocy.swen.");
    }

    #[test]
    fn chromium_rows_round_trip_through_sqlite() {
        let db = HistoryDb::in_memory().unwrap();
        db.write_chromium(&sample()).unwrap();

        let urls = db.chromium_urls().unwrap();
        assert_eq!(urls[0], ("https://github.com/dashboard".to_string(), 3));
        let visits = db.chromium_visits().unwrap();
        assert_eq!(visits.len(), 4);
        assert!(visits.windows(2).all(|w| w[0].1 <= w[1].1));
        assert!(db.size_bytes().unwrap() > 0);
    }

    #[test]
    fn firefox_rows_round_trip_through_sqlite() {
        let db = HistoryDb::in_memory().unwrap();
        db.write_firefox(&sample()).unwrap();
        let visits = db.firefox_visits().unwrap();
        assert_eq!(visits.len(), 4);
        assert_eq!(visits[0].1, firefox_time(at(1, 9)));
    }
}
