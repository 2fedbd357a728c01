use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use uuid::Uuid;

use slate_types::api::{
    AddCollaboratorRequest, CreateWhiteboardRequest, RemoveCollaboratorRequest,
    RenameWhiteboardRequest,
};

use crate::AppState;
use crate::error::{ApiError, blocking, ok_envelope};
use crate::lifecycle;
use crate::middleware::CurrentUser;
use crate::validate;

pub async fn create_whiteboard(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    payload: Result<Json<CreateWhiteboardRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let errors = validate::validate_create_whiteboard(&req);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let db = state.clone();
    let board = blocking(move || lifecycle::create_whiteboard(&db.db, &actor, &req)).await?;
    Ok(ok_envelope(
        StatusCode::CREATED,
        "Whiteboard created successfully",
        board,
    ))
}

pub async fn my_whiteboards(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let boards = blocking(move || lifecycle::my_whiteboards(&db.db, actor.id)).await?;
    Ok(ok_envelope(
        StatusCode::OK,
        "Whiteboards retrieved successfully",
        boards,
    ))
}

pub async fn shared_with_me(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let boards = blocking(move || lifecycle::shared_with_me(&db.db, actor.id)).await?;
    Ok(ok_envelope(
        StatusCode::OK,
        "Whiteboards retrieved successfully",
        boards,
    ))
}

pub async fn get_whiteboard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let board = blocking(move || lifecycle::get_whiteboard(&db.db, id, &actor)).await?;
    Ok(ok_envelope(
        StatusCode::OK,
        "Whiteboard retrieved successfully",
        board,
    ))
}

pub async fn rename_whiteboard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<CurrentUser>,
    payload: Result<Json<RenameWhiteboardRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let errors = validate::validate_rename(&req);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let db = state.clone();
    let board =
        blocking(move || lifecycle::rename_whiteboard(&db.db, id, &actor, &req.title)).await?;
    Ok(ok_envelope(
        StatusCode::OK,
        "Whiteboard renamed successfully",
        board,
    ))
}

pub async fn delete_whiteboard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    blocking(move || lifecycle::delete_whiteboard(&db.db, id, &actor)).await?;
    Ok(ok_envelope(
        StatusCode::OK,
        "Whiteboard deleted successfully",
        Value::Null,
    ))
}

pub async fn duplicate_whiteboard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let board = blocking(move || lifecycle::duplicate_whiteboard(&db.db, id, &actor)).await?;
    Ok(ok_envelope(
        StatusCode::CREATED,
        "Whiteboard duplicated successfully",
        board,
    ))
}

pub async fn add_collaborator(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<CurrentUser>,
    payload: Result<Json<AddCollaboratorRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let errors = validate::validate_collaborator_email(&req.email);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let db = state.clone();
    let collaborator =
        blocking(move || lifecycle::add_collaborator(&db.db, id, &actor, &req.email)).await?;
    Ok(ok_envelope(
        StatusCode::CREATED,
        "Collaborator added successfully",
        collaborator,
    ))
}

pub async fn remove_collaborator(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<CurrentUser>,
    payload: Result<Json<RemoveCollaboratorRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let errors = validate::validate_collaborator_email(&req.email);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let db = state.clone();
    blocking(move || lifecycle::remove_collaborator(&db.db, id, &actor, &req.email)).await?;
    Ok(ok_envelope(
        StatusCode::OK,
        "Collaborator removed successfully",
        Value::Null,
    ))
}
