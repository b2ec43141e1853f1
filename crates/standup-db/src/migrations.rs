use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    // messages carries no foreign key to contacts: history outlives the
    // roster entry when a contact unsubscribes.
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS contacts (
            id            TEXT PRIMARY KEY,
            subscription  TEXT NOT NULL,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS messages (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            contact_id   TEXT NOT NULL,
            received_at  INTEGER NOT NULL,
            body         TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_contact
            ON messages(contact_id, received_at);

        CREATE INDEX IF NOT EXISTS idx_messages_received
            ON messages(received_at);
        ",
    )?;

    info!("database migrations complete");
    Ok(())
}
