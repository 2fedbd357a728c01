use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// -- JWT Claims --

/// JWT claims carried by the `token` session cookie. Canonical definition
/// lives here in slate-types so the issuing and verifying sides cannot drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Response envelope --

/// Uniform response wrapper. `statusCode` mirrors the HTTP status so clients
/// that only look at the body can still branch on the outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub data: T,
}

/// One failed validation rule, tied to the request field that broke it.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

// -- Roles and access modes --

/// Role a collaborator holds on a whiteboard. `Owner` exists as a stored
/// value but no operation assigns it today; every add path grants `Editor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorRole {
    Editor,
    Owner,
}

impl CollaboratorRole {
    pub fn as_str(self) -> &'static str {
        match self {
            CollaboratorRole::Editor => "editor",
            CollaboratorRole::Owner => "owner",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "editor" => Some(CollaboratorRole::Editor),
            "owner" => Some(CollaboratorRole::Owner),
            _ => None,
        }
    }
}

/// Visibility choice a creation request must name; absence is a validation
/// error rather than a parse failure, so it reports like any other field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardAccess {
    Private,
    InviteSpecificUsers,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Register and login answer flat, not enveloped; the session rides in a
/// `Set-Cookie` header rather than the body.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
}

// -- Whiteboards --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateWhiteboardRequest {
    pub title: String,
    pub description: Option<String>,
    pub board_access: Option<BoardAccess>,
    pub invited_emails: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameWhiteboardRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddCollaboratorRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoveCollaboratorRequest {
    pub email: String,
}

/// Public slice of a user embedded in whiteboard payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorResponse {
    pub user_id: Uuid,
    pub user: UserInfo,
    pub role: CollaboratorRole,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteboardResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub owner: UserInfo,
    pub collaborators: Vec<CollaboratorResponse>,
    /// Present on single-board reads and duplication, omitted elsewhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshots: Option<Vec<SnapshotResponse>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner's board list keeps its historical wire shape: snake_case keys and
/// the title under `name`.
#[derive(Debug, Serialize)]
pub struct MyWhiteboardSummary {
    pub id: Uuid,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedWhiteboardSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub owner_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Snapshots --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveSnapshotRequest {
    pub data: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    pub id: Uuid,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
