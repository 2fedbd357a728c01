//! Whiteboard lifecycle coordination: creation with invite resolution, the
//! access predicate, gated reads, rename, delete, deep duplication,
//! collaborator management and snapshot autosave. Everything here is
//! synchronous and runs inside `blocking` from the handlers; tests drive it
//! directly against an in-memory database.

use anyhow::anyhow;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use slate_db::Database;
use slate_db::models::{CollaboratorRow, SnapshotRow, UserRow, WhiteboardRow};
use slate_types::api::{
    BoardAccess, CollaboratorResponse, CollaboratorRole, CreateWhiteboardRequest,
    MyWhiteboardSummary, SharedWhiteboardSummary, SnapshotResponse, UserInfo, WhiteboardResponse,
};

use crate::error::ApiError;
use crate::middleware::CurrentUser;

pub fn create_whiteboard(
    db: &Database,
    actor: &CurrentUser,
    req: &CreateWhiteboardRequest,
) -> Result<WhiteboardResponse, ApiError> {
    let board_id = Uuid::new_v4();
    let title = req.title.trim();
    let description = req
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let board = db.insert_whiteboard(
        &board_id.to_string(),
        title,
        description,
        &actor.id.to_string(),
        false,
    )?;

    if req.board_access == Some(BoardAccess::InviteSpecificUsers) {
        let invited = req.invited_emails.as_deref().unwrap_or_default();
        if invited.is_empty() {
            return Err(ApiError::BadRequest(
                "Invited emails are required when access type is invite_specific_users"
                    .to_string(),
            ));
        }
        add_invitees(db, &board, actor, invited)?;
    }

    info!("Whiteboard {} created by {}", board.id, actor.email);
    board_response(db, board, false)
}

/// Resolve invited emails to users and add them as editors. All-or-nothing:
/// one unknown address fails the whole batch, naming every invalid address.
/// The owner's own email is skipped rather than rejected.
fn add_invitees(
    db: &Database,
    board: &WhiteboardRow,
    actor: &CurrentUser,
    invited: &[String],
) -> Result<(), ApiError> {
    let owner_email = actor.email.to_lowercase();
    let mut user_ids = Vec::new();
    let mut invalid = Vec::new();

    for raw in invited {
        let email = raw.trim().to_lowercase();
        if email == owner_email {
            continue;
        }
        match db.find_user_by_email(&email)? {
            Some(user) => user_ids.push(user.id),
            None => invalid.push(raw.clone()),
        }
    }

    if !invalid.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "The following users do not exist in the system: {}",
            invalid.join(", ")
        )));
    }

    db.add_collaborators(&board.id, &user_ids, CollaboratorRole::Editor.as_str())?;
    Ok(())
}

/// Owner or collaborator.
pub fn has_access(db: &Database, board: &WhiteboardRow, user_id: Uuid) -> Result<bool, ApiError> {
    if board.owner_id == user_id.to_string() {
        return Ok(true);
    }
    Ok(db
        .find_collaborator(&board.id, &user_id.to_string())?
        .is_some())
}

pub fn get_whiteboard(
    db: &Database,
    board_id: Uuid,
    actor: &CurrentUser,
) -> Result<WhiteboardResponse, ApiError> {
    let board = find_board(db, board_id)?;
    if !has_access(db, &board, actor.id)? {
        return Err(ApiError::Forbidden(
            "You do not have permission to access this whiteboard".to_string(),
        ));
    }
    board_response(db, board, true)
}

pub fn my_whiteboards(db: &Database, actor_id: Uuid) -> Result<Vec<MyWhiteboardSummary>, ApiError> {
    let rows = db.find_whiteboards_by_owner(&actor_id.to_string())?;
    Ok(rows
        .into_iter()
        .map(|board| MyWhiteboardSummary {
            id: parse_uuid(&board.id),
            name: board.title,
            updated_at: slate_db::parse_timestamp(&board.updated_at),
        })
        .collect())
}

pub fn shared_with_me(
    db: &Database,
    actor_id: Uuid,
) -> Result<Vec<SharedWhiteboardSummary>, ApiError> {
    let rows = db.find_whiteboards_shared_with(&actor_id.to_string())?;
    Ok(rows
        .into_iter()
        .map(|board| SharedWhiteboardSummary {
            id: parse_uuid(&board.id),
            title: board.title,
            description: board.description,
            owner_name: board.owner_name,
            created_at: slate_db::parse_timestamp(&board.created_at),
            updated_at: slate_db::parse_timestamp(&board.updated_at),
        })
        .collect())
}

pub fn rename_whiteboard(
    db: &Database,
    board_id: Uuid,
    actor: &CurrentUser,
    title: &str,
) -> Result<WhiteboardResponse, ApiError> {
    let board = find_board(db, board_id)?;
    if board.owner_id != actor.id.to_string() {
        return Err(ApiError::Forbidden(
            "Only the owner can rename this whiteboard".to_string(),
        ));
    }

    db.rename_whiteboard(&board.id, title.trim())?;
    let board = find_board(db, board_id)?;

    info!("Whiteboard {} renamed by {}", board.id, actor.email);
    board_response(db, board, false)
}

pub fn delete_whiteboard(
    db: &Database,
    board_id: Uuid,
    actor: &CurrentUser,
) -> Result<(), ApiError> {
    let board = find_board(db, board_id)?;
    if board.owner_id != actor.id.to_string() {
        return Err(ApiError::Forbidden(
            "Only the owner can delete this whiteboard".to_string(),
        ));
    }

    db.delete_whiteboard(&board.id)?;
    info!("Whiteboard {} deleted by {}", board.id, actor.email);
    Ok(())
}

/// Deep copy owned by the caller: same title, description and visibility,
/// snapshots in original order, collaborators re-added with the editor role.
pub fn duplicate_whiteboard(
    db: &Database,
    board_id: Uuid,
    actor: &CurrentUser,
) -> Result<WhiteboardResponse, ApiError> {
    let source = find_board(db, board_id)?;
    if source.owner_id != actor.id.to_string() {
        return Err(ApiError::Forbidden(
            "Only the owner can duplicate this whiteboard".to_string(),
        ));
    }

    let copy = db.insert_whiteboard(
        &Uuid::new_v4().to_string(),
        &source.title,
        source.description.as_deref(),
        &actor.id.to_string(),
        source.is_public,
    )?;

    for snapshot in db.find_snapshots_by_whiteboard(&source.id)? {
        db.insert_snapshot(&Uuid::new_v4().to_string(), &copy.id, &snapshot.data)?;
    }

    let member_ids: Vec<String> = db
        .find_collaborators_by_whiteboard(&source.id)?
        .into_iter()
        .map(|c| c.user_id)
        .collect();
    db.add_collaborators(&copy.id, &member_ids, CollaboratorRole::Editor.as_str())?;

    info!(
        "Whiteboard {} duplicated as {} by {}",
        source.id, copy.id, actor.email
    );
    board_response(db, copy, true)
}

pub fn add_collaborator(
    db: &Database,
    board_id: Uuid,
    actor: &CurrentUser,
    email_raw: &str,
) -> Result<CollaboratorResponse, ApiError> {
    let board = find_board(db, board_id)?;
    if board.owner_id != actor.id.to_string() {
        return Err(ApiError::Forbidden(
            "Only the owner can add collaborators to this whiteboard".to_string(),
        ));
    }

    let email = email_raw.trim().to_lowercase();
    if email == actor.email.to_lowercase() {
        return Err(ApiError::BadRequest(
            "You cannot add yourself as a collaborator".to_string(),
        ));
    }

    let user = db.find_user_by_email(&email)?.ok_or_else(|| {
        ApiError::BadRequest("User with this email does not exist in the system".to_string())
    })?;

    let added = db.add_collaborator(&board.id, &user.id, CollaboratorRole::Editor.as_str())?;
    if !added {
        return Err(ApiError::Conflict(
            "User is already a collaborator on this whiteboard".to_string(),
        ));
    }

    let row = db
        .find_collaborator(&board.id, &user.id)?
        .ok_or_else(|| anyhow!("Collaborator {} missing after insert on {}", user.id, board.id))?;

    info!(
        "User {} added as collaborator on whiteboard {} by {}",
        user.email, board.id, actor.email
    );
    Ok(collaborator_response(row))
}

pub fn remove_collaborator(
    db: &Database,
    board_id: Uuid,
    actor: &CurrentUser,
    email_raw: &str,
) -> Result<(), ApiError> {
    let board = find_board(db, board_id)?;
    if board.owner_id != actor.id.to_string() {
        return Err(ApiError::Forbidden(
            "Only the owner can remove collaborators from this whiteboard".to_string(),
        ));
    }

    let email = email_raw.trim().to_lowercase();
    if email == actor.email.to_lowercase() {
        return Err(ApiError::BadRequest(
            "You cannot remove yourself as a collaborator".to_string(),
        ));
    }

    let user = db.find_user_by_email(&email)?.ok_or_else(|| {
        ApiError::BadRequest("User with this email does not exist in the system".to_string())
    })?;

    let removed = db.remove_collaborator(&board.id, &user.id)?;
    if !removed {
        return Err(ApiError::NotFound(
            "User is not a collaborator on this whiteboard".to_string(),
        ));
    }

    info!(
        "User {} removed from whiteboard {} by {}",
        user.email, board.id, actor.email
    );
    Ok(())
}

/// Autosave: overwrite the board's newest snapshot or create its first one.
/// Owner and collaborators may save.
pub fn save_snapshot(
    db: &Database,
    board_id: Uuid,
    actor: &CurrentUser,
    data: &Value,
) -> Result<SnapshotResponse, ApiError> {
    let board = find_board(db, board_id)?;
    if !has_access(db, &board, actor.id)? {
        return Err(ApiError::Forbidden(
            "You do not have permission to access this whiteboard".to_string(),
        ));
    }

    let row = db.save_or_update_snapshot(
        &Uuid::new_v4().to_string(),
        &board.id,
        &data.to_string(),
    )?;
    Ok(snapshot_response(row))
}

/// Targeted update of one snapshot, scoped to the board it belongs to.
pub fn update_snapshot(
    db: &Database,
    board_id: Uuid,
    actor: &CurrentUser,
    snapshot_id: Uuid,
    data: &Value,
) -> Result<SnapshotResponse, ApiError> {
    let board = find_board(db, board_id)?;
    if !has_access(db, &board, actor.id)? {
        return Err(ApiError::Forbidden(
            "You do not have permission to access this whiteboard".to_string(),
        ));
    }

    let updated = db.update_snapshot(&snapshot_id.to_string(), &board.id, &data.to_string())?;
    if !updated {
        return Err(ApiError::NotFound(
            "Snapshot not found or does not belong to this whiteboard".to_string(),
        ));
    }

    let row = db
        .find_snapshot_by_id(&snapshot_id.to_string())?
        .ok_or_else(|| anyhow!("Snapshot {} missing after update", snapshot_id))?;
    Ok(snapshot_response(row))
}

fn find_board(db: &Database, board_id: Uuid) -> Result<WhiteboardRow, ApiError> {
    db.find_whiteboard_by_id(&board_id.to_string())?
        .ok_or_else(|| ApiError::NotFound("Whiteboard not found".to_string()))
}

fn board_response(
    db: &Database,
    board: WhiteboardRow,
    with_snapshots: bool,
) -> Result<WhiteboardResponse, ApiError> {
    let owner = db
        .find_user_by_id(&board.owner_id)?
        .ok_or_else(|| anyhow!("Owner {} missing for whiteboard {}", board.owner_id, board.id))?;

    let collaborators = db
        .find_collaborators_by_whiteboard(&board.id)?
        .into_iter()
        .map(collaborator_response)
        .collect();

    let snapshots = if with_snapshots {
        Some(
            db.find_snapshots_by_whiteboard(&board.id)?
                .into_iter()
                .map(snapshot_response)
                .collect(),
        )
    } else {
        None
    };

    Ok(WhiteboardResponse {
        id: parse_uuid(&board.id),
        title: board.title,
        description: board.description,
        is_public: board.is_public,
        owner: user_info(&owner),
        collaborators,
        snapshots,
        created_at: slate_db::parse_timestamp(&board.created_at),
        updated_at: slate_db::parse_timestamp(&board.updated_at),
    })
}

fn user_info(row: &UserRow) -> UserInfo {
    UserInfo {
        id: parse_uuid(&row.id),
        email: row.email.clone(),
        full_name: row.full_name.clone(),
    }
}

fn collaborator_response(row: CollaboratorRow) -> CollaboratorResponse {
    let role = CollaboratorRole::parse(&row.role).unwrap_or_else(|| {
        warn!("Invalid role '{}' in database, treating as editor", row.role);
        CollaboratorRole::Editor
    });
    CollaboratorResponse {
        user_id: parse_uuid(&row.user_id),
        user: UserInfo {
            id: parse_uuid(&row.user_id),
            email: row.user_email,
            full_name: row.user_full_name,
        },
        role,
    }
}

fn snapshot_response(row: SnapshotRow) -> SnapshotResponse {
    let data = serde_json::from_str(&row.data).unwrap_or_else(|e| {
        warn!("Invalid snapshot JSON for {}: {}", row.id, e);
        Value::Null
    });
    SnapshotResponse {
        id: parse_uuid(&row.id),
        data,
        created_at: slate_db::parse_timestamp(&row.created_at),
        updated_at: slate_db::parse_timestamp(&row.updated_at),
    }
}

fn parse_uuid(raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid UUID '{}' in database: {}", raw, e);
        Uuid::default()
    })
}
