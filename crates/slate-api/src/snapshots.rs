use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use slate_types::api::SaveSnapshotRequest;

use crate::AppState;
use crate::error::{ApiError, blocking, ok_envelope};
use crate::lifecycle;
use crate::middleware::CurrentUser;
use crate::validate;

/// Autosave endpoint. Answers 200 even when the save created the board's
/// first snapshot; the envelope carries the resulting row either way.
pub async fn save_snapshot(
    State(state): State<AppState>,
    Path(whiteboard_id): Path<Uuid>,
    Extension(actor): Extension<CurrentUser>,
    payload: Result<Json<SaveSnapshotRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let errors = validate::validate_snapshot(&req);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let db = state.clone();
    let snapshot =
        blocking(move || lifecycle::save_snapshot(&db.db, whiteboard_id, &actor, &req.data))
            .await?;
    Ok(ok_envelope(
        StatusCode::OK,
        "Snapshot saved successfully",
        snapshot,
    ))
}
