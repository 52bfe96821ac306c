use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use kaiwa_core::UserId;
use rusqlite::Connection;
use tracing::{debug, info, instrument};

use crate::db;
use crate::error::{Result, StoreError};
use crate::types::Exchange;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the SQLite message log.
///
/// Holds only the file path. Every message being handled opens its own
/// [`StoreSession`] and drops it when done, so no connection is shared
/// between requests.
#[derive(Debug, Clone)]
pub struct ExchangeStore {
    path: PathBuf,
}

impl ExchangeStore {
    /// Create the database file if needed and run the schema migration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path);

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        db::init_db(&conn)?;
        info!(path = %path.display(), "message store ready");

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a connection scoped to the caller. Released on drop.
    pub fn session(&self) -> Result<StoreSession> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(StoreSession { conn })
    }
}

/// A single connection to the message log, owned by one request.
pub struct StoreSession {
    conn: Connection,
}

impl StoreSession {
    /// Append one exchange and return it with its assigned id.
    #[instrument(skip(self, user_id, inbound_text, outbound_text), fields(user_id = %user_id))]
    pub fn append(
        &self,
        user_id: &UserId,
        timestamp: DateTime<Utc>,
        inbound_text: &str,
        outbound_text: &str,
    ) -> Result<Exchange> {
        self.conn.execute(
            "INSERT INTO messages (user_id, timestamp, user_text, reply_text)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                user_id.as_str(),
                format_timestamp(timestamp),
                inbound_text,
                outbound_text,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, "exchange saved");

        Ok(Exchange {
            id,
            user_id: user_id.to_string(),
            timestamp,
            inbound_text: inbound_text.to_string(),
            outbound_text: outbound_text.to_string(),
        })
    }

    /// Exchanges for `user_id` with `timestamp >= since`, oldest first.
    ///
    /// With `limit`, only the most recent `limit` exchanges of that range are
    /// returned (still oldest first).
    #[instrument(skip(self, user_id), fields(user_id = %user_id))]
    pub fn exchanges_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<Exchange>> {
        // SQLite treats a negative LIMIT as "no limit".
        let limit = limit.map(|n| n as i64).unwrap_or(-1);

        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, timestamp, user_text, reply_text
             FROM messages
             WHERE user_id = ?1 AND timestamp >= ?2
             ORDER BY timestamp DESC, id DESC
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(
            rusqlite::params![user_id.as_str(), format_timestamp(since), limit],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )?;

        let mut exchanges = Vec::new();
        for row in rows {
            let (id, user_id, timestamp, inbound_text, outbound_text) = row?;
            exchanges.push(Exchange {
                id,
                user_id,
                timestamp: parse_timestamp(&timestamp)?,
                inbound_text,
                outbound_text,
            });
        }
        // Reverse so oldest first
        exchanges.reverse();
        Ok(exchanges)
    }

    /// Whether any exchange has ever been stored for this user.
    pub fn has_user(&self, user_id: &UserId) -> Result<bool> {
        let found = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM messages WHERE user_id = ?1)",
            rusqlite::params![user_id.as_str()],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(found)
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Timestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn temp_store() -> (tempfile::TempDir, ExchangeStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ExchangeStore::open(dir.path().join("messages.db")).expect("open");
        (dir, store)
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn append_assigns_ids_and_round_trips_fields() {
        let (_dir, store) = temp_store();
        let session = store.session().unwrap();
        let alice = UserId::from("U-alice");

        let first = session.append(&alice, at(9, 0), "こんにちは", "こんにちは！").unwrap();
        let second = session.append(&alice, at(9, 5), "元気？", "元気です。").unwrap();
        assert!(second.id > first.id);

        let loaded = session.exchanges_since(&alice, at(0, 0), None).unwrap();
        assert_eq!(loaded, vec![first, second]);
    }

    #[test]
    fn exchanges_since_filters_by_user_and_window() {
        let (_dir, store) = temp_store();
        let session = store.session().unwrap();
        let alice = UserId::from("U-alice");
        let bob = UserId::from("U-bob");

        session.append(&alice, at(1, 0), "old", "old reply").unwrap();
        session.append(&alice, at(10, 0), "new", "new reply").unwrap();
        session.append(&bob, at(10, 30), "bob", "bob reply").unwrap();

        let loaded = session.exchanges_since(&alice, at(10, 0), None).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].inbound_text, "new");
    }

    #[test]
    fn exchanges_since_orders_ascending_regardless_of_insert_order() {
        let (_dir, store) = temp_store();
        let session = store.session().unwrap();
        let alice = UserId::from("U-alice");

        session.append(&alice, at(12, 0), "third", "c").unwrap();
        session.append(&alice, at(8, 0), "first", "a").unwrap();
        session.append(&alice, at(10, 0), "second", "b").unwrap();

        let texts: Vec<_> = session
            .exchanges_since(&alice, at(0, 0), None)
            .unwrap()
            .into_iter()
            .map(|e| e.inbound_text)
            .collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[test]
    fn limit_keeps_most_recent_in_ascending_order() {
        let (_dir, store) = temp_store();
        let session = store.session().unwrap();
        let alice = UserId::from("U-alice");

        for i in 0..5 {
            session
                .append(&alice, at(9, i), &format!("m{i}"), "r")
                .unwrap();
        }

        let texts: Vec<_> = session
            .exchanges_since(&alice, at(0, 0), Some(2))
            .unwrap()
            .into_iter()
            .map(|e| e.inbound_text)
            .collect();
        assert_eq!(texts, ["m3", "m4"]);
    }

    #[test]
    fn timestamps_keep_sub_second_precision() {
        let (_dir, store) = temp_store();
        let session = store.session().unwrap();
        let alice = UserId::from("U-alice");
        let ts = at(9, 0) + Duration::milliseconds(1234);

        session.append(&alice, ts, "hi", "hello").unwrap();
        let loaded = session.exchanges_since(&alice, ts, None).unwrap();
        assert_eq!(loaded[0].timestamp, ts);
    }

    #[test]
    fn sessions_share_the_same_file() {
        let (_dir, store) = temp_store();
        let alice = UserId::from("U-alice");

        {
            let writer = store.session().unwrap();
            assert!(!writer.has_user(&alice).unwrap());
            writer.append(&alice, at(9, 0), "hi", "hello").unwrap();
        }

        let reader = store.session().unwrap();
        assert!(reader.has_user(&alice).unwrap());
        assert_eq!(reader.exchanges_since(&alice, at(0, 0), None).unwrap().len(), 1);
    }

    #[test]
    fn reopening_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("messages.db");
        let alice = UserId::from("U-alice");

        ExchangeStore::open(&path)
            .unwrap()
            .session()
            .unwrap()
            .append(&alice, at(9, 0), "hi", "hello")
            .unwrap();

        let reopened = ExchangeStore::open(&path).unwrap();
        let session = reopened.session().unwrap();
        assert_eq!(session.exchanges_since(&alice, at(0, 0), None).unwrap().len(), 1);
    }
}
