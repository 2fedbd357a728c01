use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id           TEXT PRIMARY KEY,
                email        TEXT NOT NULL UNIQUE,
                password     TEXT NOT NULL,
                full_name    TEXT,
                is_verified  INTEGER NOT NULL DEFAULT 0,
                created_at   TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE whiteboards (
                id           TEXT PRIMARY KEY,
                title        TEXT NOT NULL,
                description  TEXT,
                is_public    INTEGER NOT NULL DEFAULT 0,
                owner_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at   TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_whiteboards_owner
                ON whiteboards(owner_id, created_at);

            CREATE TABLE whiteboard_collaborators (
                whiteboard_id  TEXT NOT NULL REFERENCES whiteboards(id) ON DELETE CASCADE,
                user_id        TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                role           TEXT NOT NULL DEFAULT 'editor'
                               CHECK (role IN ('editor', 'owner')),
                created_at     TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at     TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (whiteboard_id, user_id)
            );

            CREATE INDEX idx_collaborators_user
                ON whiteboard_collaborators(user_id);

            CREATE TABLE whiteboard_snapshots (
                id             TEXT PRIMARY KEY,
                whiteboard_id  TEXT NOT NULL REFERENCES whiteboards(id) ON DELETE CASCADE,
                data           TEXT NOT NULL,
                created_at     TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at     TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_snapshots_whiteboard
                ON whiteboard_snapshots(whiteboard_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
