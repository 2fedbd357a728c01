use crate::Database;
use crate::models::UserRow;
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

impl Database {
    /// Insert a user and read the stored row back so timestamps come from
    /// SQLite, not the caller's clock.
    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        full_name: Option<&str>,
    ) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, full_name) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, email, password_hash, full_name],
            )?;
            query_user_by_id(conn, id)?.ok_or_else(|| anyhow!("User {} missing after insert", id))
        })
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn find_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }
}

fn read_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        full_name: row.get(3)?,
        is_verified: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, email, password, full_name, is_verified, created_at, updated_at
         FROM users WHERE email = ?1",
    )?;
    let row = stmt.query_row([email], read_user).optional()?;
    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, email, password, full_name, is_verified, created_at, updated_at
         FROM users WHERE id = ?1",
    )?;
    let row = stmt.query_row([id], read_user).optional()?;
    Ok(row)
}
