use crate::Database;
use crate::models::{SharedWhiteboardRow, WhiteboardRow};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

impl Database {
    pub fn insert_whiteboard(
        &self,
        id: &str,
        title: &str,
        description: Option<&str>,
        owner_id: &str,
        is_public: bool,
    ) -> Result<WhiteboardRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO whiteboards (id, title, description, owner_id, is_public)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, title, description, owner_id, is_public],
            )?;
            query_whiteboard_by_id(conn, id)?
                .ok_or_else(|| anyhow!("Whiteboard {} missing after insert", id))
        })
    }

    pub fn find_whiteboard_by_id(&self, id: &str) -> Result<Option<WhiteboardRow>> {
        self.with_conn(|conn| query_whiteboard_by_id(conn, id))
    }

    /// Owner's boards, newest first. `rowid` breaks ties because
    /// `datetime('now')` only has second resolution.
    pub fn find_whiteboards_by_owner(&self, owner_id: &str) -> Result<Vec<WhiteboardRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, is_public, owner_id, created_at, updated_at
                 FROM whiteboards
                 WHERE owner_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([owner_id], read_whiteboard)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Boards the user collaborates on but does not own, owner name joined
    /// in, newest first.
    pub fn find_whiteboards_shared_with(&self, user_id: &str) -> Result<Vec<SharedWhiteboardRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT w.id, w.title, w.description, u.full_name, w.created_at, w.updated_at
                 FROM whiteboards w
                 JOIN whiteboard_collaborators c ON c.whiteboard_id = w.id
                 JOIN users u ON u.id = w.owner_id
                 WHERE c.user_id = ?1 AND w.owner_id <> ?1
                 ORDER BY w.created_at DESC, w.rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(SharedWhiteboardRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        description: row.get(2)?,
                        owner_name: row.get(3)?,
                        created_at: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns false when no such whiteboard exists.
    pub fn rename_whiteboard(&self, id: &str, title: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE whiteboards SET title = ?2, updated_at = datetime('now') WHERE id = ?1",
                rusqlite::params![id, title],
            )?;
            Ok(changed > 0)
        })
    }

    /// Collaborator and snapshot rows go with the board via ON DELETE CASCADE.
    pub fn delete_whiteboard(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM whiteboards WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn read_whiteboard(row: &rusqlite::Row<'_>) -> rusqlite::Result<WhiteboardRow> {
    Ok(WhiteboardRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        is_public: row.get(3)?,
        owner_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn query_whiteboard_by_id(conn: &Connection, id: &str) -> Result<Option<WhiteboardRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, is_public, owner_id, created_at, updated_at
         FROM whiteboards WHERE id = ?1",
    )?;
    let row = stmt.query_row([id], read_whiteboard).optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_user(db: &Database, id: &str, email: &str) {
        db.create_user(id, email, "hash", None).unwrap();
    }

    #[test]
    fn insert_and_lookup() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "a@example.com");

        let board = db
            .insert_whiteboard("w1", "Roadmap", Some("Q3 planning"), "u1", false)
            .unwrap();
        assert_eq!(board.title, "Roadmap");
        assert_eq!(board.owner_id, "u1");
        assert!(!board.is_public);

        let public = db.insert_whiteboard("w2", "Open", None, "u1", true).unwrap();
        assert!(public.is_public);

        let found = db.find_whiteboard_by_id("w1").unwrap().unwrap();
        assert_eq!(found.description.as_deref(), Some("Q3 planning"));
        assert!(db.find_whiteboard_by_id("w3").unwrap().is_none());
    }

    #[test]
    fn owner_listing_is_newest_first() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "a@example.com");
        db.insert_whiteboard("w1", "First", None, "u1", false).unwrap();
        db.insert_whiteboard("w2", "Second", None, "u1", false).unwrap();
        db.insert_whiteboard("w3", "Third", None, "u1", false).unwrap();

        let boards = db.find_whiteboards_by_owner("u1").unwrap();
        let ids: Vec<&str> = boards.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["w3", "w2", "w1"]);
    }

    #[test]
    fn shared_listing_excludes_owned_boards() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "owner", "o@example.com");
        seed_user(&db, "member", "m@example.com");
        db.create_user("named", "n@example.com", "hash", Some("Nia Owner"))
            .unwrap();

        db.insert_whiteboard("w1", "Owned by member", None, "member", false)
            .unwrap();
        db.insert_whiteboard("w2", "Shared", None, "named", false).unwrap();
        db.add_collaborator("w2", "member", "editor").unwrap();
        // Self-referential collaborator row on an owned board must not
        // surface in the shared list.
        db.add_collaborator("w1", "member", "editor").unwrap();

        let shared = db.find_whiteboards_shared_with("member").unwrap();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].id, "w2");
        assert_eq!(shared[0].owner_name.as_deref(), Some("Nia Owner"));
    }

    #[test]
    fn rename_updates_title_and_reports_missing_rows() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "a@example.com");
        db.insert_whiteboard("w1", "Old", None, "u1", false).unwrap();

        assert!(db.rename_whiteboard("w1", "New").unwrap());
        let board = db.find_whiteboard_by_id("w1").unwrap().unwrap();
        assert_eq!(board.title, "New");

        assert!(!db.rename_whiteboard("missing", "New").unwrap());
    }

    #[test]
    fn delete_cascades_to_collaborators_and_snapshots() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "a@example.com");
        seed_user(&db, "u2", "b@example.com");
        db.insert_whiteboard("w1", "Board", None, "u1", false).unwrap();
        db.add_collaborator("w1", "u2", "editor").unwrap();
        db.insert_snapshot("s1", "w1", "{}").unwrap();

        assert!(db.delete_whiteboard("w1").unwrap());
        assert!(db.find_whiteboard_by_id("w1").unwrap().is_none());
        assert!(db.find_collaborators_by_whiteboard("w1").unwrap().is_empty());
        assert!(db.find_snapshots_by_whiteboard("w1").unwrap().is_empty());

        assert!(!db.delete_whiteboard("w1").unwrap());
    }
}
