use crate::Database;
use crate::models::SnapshotRow;
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

impl Database {
    pub fn insert_snapshot(&self, id: &str, whiteboard_id: &str, data: &str) -> Result<SnapshotRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO whiteboard_snapshots (id, whiteboard_id, data) VALUES (?1, ?2, ?3)",
                (id, whiteboard_id, data),
            )?;
            query_snapshot_by_id(conn, id)?
                .ok_or_else(|| anyhow!("Snapshot {} missing after insert", id))
        })
    }

    pub fn find_snapshot_by_id(&self, id: &str) -> Result<Option<SnapshotRow>> {
        self.with_conn(|conn| query_snapshot_by_id(conn, id))
    }

    pub fn find_latest_snapshot(&self, whiteboard_id: &str) -> Result<Option<SnapshotRow>> {
        self.with_conn(|conn| query_latest_snapshot(conn, whiteboard_id))
    }

    /// Full history, oldest first.
    pub fn find_snapshots_by_whiteboard(&self, whiteboard_id: &str) -> Result<Vec<SnapshotRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, whiteboard_id, data, created_at, updated_at
                 FROM whiteboard_snapshots
                 WHERE whiteboard_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map([whiteboard_id], read_snapshot)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Targeted update, scoped to the board so a snapshot id from another
    /// whiteboard cannot be reached. Returns false when nothing matched.
    pub fn update_snapshot(&self, id: &str, whiteboard_id: &str, data: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE whiteboard_snapshots
                 SET data = ?3, updated_at = datetime('now')
                 WHERE id = ?1 AND whiteboard_id = ?2",
                (id, whiteboard_id, data),
            )?;
            Ok(changed > 0)
        })
    }

    /// Autosave entry point: overwrite the newest snapshot in place, or
    /// create the board's first one. `candidate_id` is only consumed on
    /// create. Runs under the writer lock so concurrent saves cannot both
    /// take the create path.
    pub fn save_or_update_snapshot(
        &self,
        candidate_id: &str,
        whiteboard_id: &str,
        data: &str,
    ) -> Result<SnapshotRow> {
        self.with_conn_mut(|conn| {
            let latest = query_latest_snapshot(conn, whiteboard_id)?;
            let id = match latest {
                Some(existing) => {
                    conn.execute(
                        "UPDATE whiteboard_snapshots
                         SET data = ?2, updated_at = datetime('now')
                         WHERE id = ?1",
                        (existing.id.as_str(), data),
                    )?;
                    existing.id
                }
                None => {
                    conn.execute(
                        "INSERT INTO whiteboard_snapshots (id, whiteboard_id, data)
                         VALUES (?1, ?2, ?3)",
                        (candidate_id, whiteboard_id, data),
                    )?;
                    candidate_id.to_string()
                }
            };
            query_snapshot_by_id(conn, &id)?
                .ok_or_else(|| anyhow!("Snapshot {} missing after save", id))
        })
    }
}

fn read_snapshot(row: &rusqlite::Row<'_>) -> rusqlite::Result<SnapshotRow> {
    Ok(SnapshotRow {
        id: row.get(0)?,
        whiteboard_id: row.get(1)?,
        data: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn query_snapshot_by_id(conn: &Connection, id: &str) -> Result<Option<SnapshotRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, whiteboard_id, data, created_at, updated_at
         FROM whiteboard_snapshots WHERE id = ?1",
    )?;
    let row = stmt.query_row([id], read_snapshot).optional()?;
    Ok(row)
}

/// `rowid` breaks created_at ties; `datetime('now')` has second resolution.
fn query_latest_snapshot(conn: &Connection, whiteboard_id: &str) -> Result<Option<SnapshotRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, whiteboard_id, data, created_at, updated_at
         FROM whiteboard_snapshots
         WHERE whiteboard_id = ?1
         ORDER BY created_at DESC, rowid DESC
         LIMIT 1",
    )?;
    let row = stmt.query_row([whiteboard_id], read_snapshot).optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_board(db: &Database) {
        db.create_user("u1", "a@example.com", "hash", None).unwrap();
        db.insert_whiteboard("w1", "Board", None, "u1", false).unwrap();
    }

    #[test]
    fn save_creates_then_updates_in_place() {
        let db = Database::open_in_memory().unwrap();
        seed_board(&db);

        let first = db
            .save_or_update_snapshot("s1", "w1", r#"{"shapes":[]}"#)
            .unwrap();
        assert_eq!(first.id, "s1");

        let second = db
            .save_or_update_snapshot("s2", "w1", r#"{"shapes":[1]}"#)
            .unwrap();
        assert_eq!(second.id, "s1");
        assert_eq!(second.data, r#"{"shapes":[1]}"#);

        let all = db.find_snapshots_by_whiteboard("w1").unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn latest_picks_the_newest_row_on_equal_timestamps() {
        let db = Database::open_in_memory().unwrap();
        seed_board(&db);
        db.insert_snapshot("s1", "w1", "{}").unwrap();
        db.insert_snapshot("s2", "w1", "{}").unwrap();

        let latest = db.find_latest_snapshot("w1").unwrap().unwrap();
        assert_eq!(latest.id, "s2");
    }

    #[test]
    fn save_overwrites_only_the_latest_of_many() {
        let db = Database::open_in_memory().unwrap();
        seed_board(&db);
        db.insert_snapshot("s1", "w1", r#"{"v":1}"#).unwrap();
        db.insert_snapshot("s2", "w1", r#"{"v":2}"#).unwrap();

        let saved = db.save_or_update_snapshot("s3", "w1", r#"{"v":3}"#).unwrap();
        assert_eq!(saved.id, "s2");

        let all = db.find_snapshots_by_whiteboard("w1").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].data, r#"{"v":1}"#);
        assert_eq!(all[1].data, r#"{"v":3}"#);
    }

    #[test]
    fn targeted_update_is_scoped_to_the_board() {
        let db = Database::open_in_memory().unwrap();
        seed_board(&db);
        db.insert_whiteboard("w2", "Other", None, "u1", false).unwrap();
        db.insert_snapshot("s1", "w1", "{}").unwrap();

        assert!(!db.update_snapshot("s1", "w2", r#"{"stolen":true}"#).unwrap());
        assert!(db.update_snapshot("s1", "w1", r#"{"ok":true}"#).unwrap());

        let row = db.find_latest_snapshot("w1").unwrap().unwrap();
        assert_eq!(row.data, r#"{"ok":true}"#);
    }

    #[test]
    fn history_is_oldest_first() {
        let db = Database::open_in_memory().unwrap();
        seed_board(&db);
        db.insert_snapshot("s1", "w1", "{}").unwrap();
        db.insert_snapshot("s2", "w1", "{}").unwrap();
        db.insert_snapshot("s3", "w1", "{}").unwrap();

        let ids: Vec<String> = db
            .find_snapshots_by_whiteboard("w1")
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["s1", "s2", "s3"]);
    }
}
