use crate::Database;
use crate::models::CollaboratorRow;
use anyhow::Result;
use rusqlite::OptionalExtension;

impl Database {
    /// Strict add: returns false when the pair is already on the board, and
    /// the caller decides what that means.
    pub fn add_collaborator(&self, whiteboard_id: &str, user_id: &str, role: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT user_id FROM whiteboard_collaborators
                     WHERE whiteboard_id = ?1 AND user_id = ?2",
                    (whiteboard_id, user_id),
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Ok(false);
            }
            conn.execute(
                "INSERT INTO whiteboard_collaborators (whiteboard_id, user_id, role)
                 VALUES (?1, ?2, ?3)",
                (whiteboard_id, user_id, role),
            )?;
            Ok(true)
        })
    }

    /// Batch add for invite resolution: users already on the board are
    /// skipped silently. Returns how many rows were inserted.
    pub fn add_collaborators(
        &self,
        whiteboard_id: &str,
        user_ids: &[String],
        role: &str,
    ) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let mut inserted = 0;
            for user_id in user_ids {
                inserted += conn.execute(
                    "INSERT OR IGNORE INTO whiteboard_collaborators (whiteboard_id, user_id, role)
                     VALUES (?1, ?2, ?3)",
                    (whiteboard_id, user_id.as_str(), role),
                )?;
            }
            Ok(inserted)
        })
    }

    pub fn find_collaborator(
        &self,
        whiteboard_id: &str,
        user_id: &str,
    ) -> Result<Option<CollaboratorRow>> {
        self.with_conn(|conn| {
            // JOIN users so the read carries the member's identity
            let mut stmt = conn.prepare(
                "SELECT c.whiteboard_id, c.user_id, c.role, u.email, u.full_name, c.created_at
                 FROM whiteboard_collaborators c
                 JOIN users u ON u.id = c.user_id
                 WHERE c.whiteboard_id = ?1 AND c.user_id = ?2",
            )?;
            let row = stmt
                .query_row((whiteboard_id, user_id), read_collaborator)
                .optional()?;
            Ok(row)
        })
    }

    /// Membership in join order (oldest first), identities included.
    pub fn find_collaborators_by_whiteboard(
        &self,
        whiteboard_id: &str,
    ) -> Result<Vec<CollaboratorRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.whiteboard_id, c.user_id, c.role, u.email, u.full_name, c.created_at
                 FROM whiteboard_collaborators c
                 JOIN users u ON u.id = c.user_id
                 WHERE c.whiteboard_id = ?1
                 ORDER BY c.created_at ASC, c.rowid ASC",
            )?;
            let rows = stmt
                .query_map([whiteboard_id], read_collaborator)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns false when the user was not on the board.
    pub fn remove_collaborator(&self, whiteboard_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "DELETE FROM whiteboard_collaborators
                 WHERE whiteboard_id = ?1 AND user_id = ?2",
                (whiteboard_id, user_id),
            )?;
            Ok(changed > 0)
        })
    }
}

fn read_collaborator(row: &rusqlite::Row<'_>) -> rusqlite::Result<CollaboratorRow> {
    Ok(CollaboratorRow {
        whiteboard_id: row.get(0)?,
        user_id: row.get(1)?,
        role: row.get(2)?,
        user_email: row.get(3)?,
        user_full_name: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(db: &Database) {
        db.create_user("owner", "o@example.com", "hash", None).unwrap();
        db.create_user("u1", "a@example.com", "hash", Some("Ada")).unwrap();
        db.create_user("u2", "b@example.com", "hash", None).unwrap();
        db.insert_whiteboard("w1", "Board", None, "owner", false).unwrap();
    }

    #[test]
    fn strict_add_reports_duplicates() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);

        assert!(db.add_collaborator("w1", "u1", "editor").unwrap());
        assert!(!db.add_collaborator("w1", "u1", "editor").unwrap());

        let found = db.find_collaborator("w1", "u1").unwrap().unwrap();
        assert_eq!(found.role, "editor");
        assert_eq!(found.user_email, "a@example.com");
        assert_eq!(found.user_full_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn batch_add_skips_existing_members() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        db.add_collaborator("w1", "u1", "editor").unwrap();

        let inserted = db
            .add_collaborators("w1", &["u1".to_string(), "u2".to_string()], "editor")
            .unwrap();
        assert_eq!(inserted, 1);

        let all = db.find_collaborators_by_whiteboard("w1").unwrap();
        assert_eq!(all.len(), 2);
        let ids: Vec<&str> = all.iter().map(|c| c.user_id.as_str()).collect();
        assert_eq!(ids, ["u1", "u2"]);
    }

    #[test]
    fn remove_reports_missing_membership() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        db.add_collaborator("w1", "u1", "editor").unwrap();

        assert!(db.remove_collaborator("w1", "u1").unwrap());
        assert!(!db.remove_collaborator("w1", "u1").unwrap());
        assert!(db.find_collaborator("w1", "u1").unwrap().is_none());
    }

    #[test]
    fn membership_is_scoped_to_the_board() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        db.insert_whiteboard("w2", "Other", None, "owner", false).unwrap();
        db.add_collaborator("w1", "u1", "editor").unwrap();

        assert!(db.find_collaborator("w2", "u1").unwrap().is_none());
        assert!(!db.remove_collaborator("w2", "u1").unwrap());
    }
}
