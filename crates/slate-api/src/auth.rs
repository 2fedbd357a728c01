use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::info;
use uuid::Uuid;

use slate_db::models::UserRow;
use slate_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest, UserResponse};

use crate::AppState;
use crate::error::{ApiError, blocking};
use crate::validate;

/// Cookie that carries the session JWT.
pub const SESSION_COOKIE: &str = "token";

const SESSION_DAYS: i64 = 7;

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let errors = validate::validate_register(&req);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    // Emails are stored lowercase so lookups are case-insensitive
    let email = req.email.trim().to_lowercase();
    let password = req.password;
    let full_name = req.full_name;

    let db = state.clone();
    let user = blocking(move || {
        if db.db.find_user_by_email(&email)?.is_some() {
            return Err(ApiError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        // Argon2id with a per-user random salt
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
            .to_string();

        let user_id = Uuid::new_v4();
        let row = db.db.create_user(
            &user_id.to_string(),
            &email,
            &password_hash,
            full_name.as_deref(),
        )?;
        Ok(row)
    })
    .await?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|_| anyhow::anyhow!("Corrupt user id in database: {}", user.id))?;

    let token = create_token(&state.jwt_secret, user_id, &user.email)?;
    let jar = jar.add(session_cookie(token, state.secure_cookies));

    info!("User {} registered", user.email);
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: user_response(user_id, user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let errors = validate::validate_login(&req);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let email = req.email.trim().to_lowercase();
    let password = req.password;

    let db = state.clone();
    let user = blocking(move || {
        // One message for both unknown email and wrong password, so the
        // endpoint cannot be used to probe which accounts exist
        let user = db.db.find_user_by_email(&email)?.ok_or_else(|| {
            ApiError::Unauthorized("Invalid email or password".to_string())
        })?;

        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| anyhow::anyhow!("Corrupt password hash for {}: {}", user.id, e))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::Unauthorized("Invalid email or password".to_string()))?;

        Ok(user)
    })
    .await?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|_| anyhow::anyhow!("Corrupt user id in database: {}", user.id))?;

    let token = create_token(&state.jwt_secret, user_id, &user.email)?;
    let jar = jar.add(session_cookie(token, state.secure_cookies));

    info!("User {} logged in", user.email);
    Ok((
        StatusCode::OK,
        jar,
        Json(AuthResponse {
            message: "Login successful".to_string(),
            user: user_response(user_id, user),
        }),
    ))
}

fn user_response(id: Uuid, row: UserRow) -> UserResponse {
    UserResponse {
        id,
        email: row.email,
        full_name: row.full_name,
        is_verified: row.is_verified,
        created_at: slate_db::parse_timestamp(&row.created_at),
        updated_at: slate_db::parse_timestamp(&row.updated_at),
    }
}

pub fn create_token(secret: &str, user_id: Uuid, email: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn verify_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

/// Seven-day session cookie. `Secure` stays off outside production so local
/// HTTP development keeps working.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::days(SESSION_DAYS))
        .build()
}
