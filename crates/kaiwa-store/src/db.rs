use rusqlite::{Connection, Result};

/// Initialise the message log. Safe to call on every startup (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    create_messages_table(conn)
}

/// One row per answered message. Rows are only ever inserted.
///
/// `timestamp` holds fixed-width RFC 3339 UTC text so string order equals time order.
fn create_messages_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL,
            timestamp   TEXT NOT NULL,
            user_text   TEXT NOT NULL,
            reply_text  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_messages_user_time
            ON messages(user_id, timestamp);",
    )
}
