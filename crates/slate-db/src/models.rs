//! Row types read straight out of SQLite. Timestamps stay as the stored
//! strings; the API layer parses them when it builds responses.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub is_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

pub struct WhiteboardRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Always read with the member's identity joined in; callers never need a
/// second lookup per collaborator.
pub struct CollaboratorRow {
    pub whiteboard_id: String,
    pub user_id: String,
    pub role: String,
    pub user_email: String,
    pub user_full_name: Option<String>,
    pub created_at: String,
}

/// Listing row for boards shared with a user, owner name joined in.
pub struct SharedWhiteboardRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub owner_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct SnapshotRow {
    pub id: String,
    pub whiteboard_id: String,
    pub data: String,
    pub created_at: String,
    pub updated_at: String,
}
