use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::AppState;
use crate::auth::{SESSION_COOKIE, verify_token};
use crate::error::{ApiError, blocking};

/// Authenticated identity for the current request, resolved against the
/// users table. Handlers read it from request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
}

/// Validate the session cookie and resolve its subject. The JWT alone is not
/// trusted as identity: a token whose account has been deleted is rejected.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let jar = CookieJar::from_headers(req.headers());
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| ApiError::Unauthorized("No authentication token provided".to_string()))?;

    let claims = verify_token(&state.jwt_secret, &token).ok_or_else(|| {
        ApiError::Unauthorized("Invalid or expired authentication token".to_string())
    })?;

    let db = state.clone();
    let user = blocking(move || {
        db.db
            .find_user_by_id(&claims.sub.to_string())?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))
    })
    .await?;

    let id: Uuid = user
        .id
        .parse()
        .map_err(|_| anyhow::anyhow!("Corrupt user id in database: {}", user.id))?;

    req.extensions_mut().insert(CurrentUser {
        id,
        email: user.email,
        full_name: user.full_name,
    });
    Ok(next.run(req).await)
}
