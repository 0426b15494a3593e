//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login and logout, plus the
//! logged-in user's own account management.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use storefront_core::domain::{Identity, Role};
use storefront_core::ports::PortError;
use storefront_core::validation::validate_email;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::dto::{
    ApiResponse, Empty, LoginRequest, RegisterRequest, UpdateDetailsRequest,
    UpdatePasswordRequest, UserDto,
};
use crate::web::extract::ApiJson;
use crate::web::middleware::{session_cookie, SESSION_COOKIE};
use crate::web::state::AppState;

pub const MIN_PASSWORD_LEN: usize = 6;

//=========================================================================================
// Session Helpers
//=========================================================================================

/// Opens a new auth session for `user_id` and returns the `Set-Cookie` value for it.
/// Sessions that have already expired are swept out first.
async fn open_session(state: &AppState, user_id: Uuid) -> Result<String, ApiError> {
    let now = Utc::now();
    let purged = state.db.delete_expired_auth_sessions(now).await?;
    if purged > 0 {
        debug!(purged, "Expired auth sessions removed.");
    }

    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);

    state
        .db
        .create_auth_session(&auth_session_id, user_id, now + ttl)
        .await?;

    Ok(format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        auth_session_id,
        ttl.num_seconds()
    ))
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })
}

fn clear_session_cookie() -> String {
    format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    )
}

fn check_password_length(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PortError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ))
        .into());
    }
    Ok(())
}

/// Checks `password` against a stored argon2 hash.
fn password_matches(password: &str, hashed_password: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn email_taken(email: &str) -> impl Fn(PortError) -> PortError + '_ {
    move |e| match e {
        PortError::Conflict(_) => {
            PortError::Conflict(format!("A user with email {} already exists", email))
        }
        other => other,
    }
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".to_string())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a new user account and log it in.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserDto>),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();
    if name.is_empty() {
        return Err(PortError::Validation("Please add a name".to_string()).into());
    }
    validate_email(&email)?;
    check_password_length(&req.password)?;

    let role = if state.config.is_admin_email(&email) {
        Role::Admin
    } else {
        Role::User
    };
    let password_hash = hash_password(&req.password)?;
    let user = state
        .db
        .create_user(name, &email, &password_hash, role)
        .await
        .map_err(email_taken(&email))?;

    let cookie = open_session(&state, user.user_id).await?;
    info!(user_id = %user.user_id, role = role.as_str(), "User registered.");

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        ApiResponse::ok(UserDto::from(user)),
    ))
}

/// Log in with an existing account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<UserDto>),
        (status = 400, description = "Missing email or password", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(PortError::Validation(
            "Please provide an email and password".to_string(),
        )
        .into());
    }

    // 1. Get user by email
    let user_creds = state
        .db
        .get_user_by_email(&email)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => invalid_credentials(),
            other => other.into(),
        })?;

    // 2. Verify password
    if !password_matches(&req.password, &user_creds.hashed_password)? {
        return Err(invalid_credentials());
    }

    // 3. Record the login and open a session
    state
        .db
        .record_login(user_creds.user_id, Utc::now())
        .await?;
    let cookie = open_session(&state, user_creds.user_id).await?;
    let user = state.db.get_user_by_id(user_creds.user_id).await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        ApiResponse::ok(UserDto::from(user)),
    ))
}

/// Log out and invalidate the current session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logout successful", body = ApiResponse<Empty>)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(auth_session_id) = session_cookie(&headers) {
        state.db.delete_auth_session(auth_session_id).await?;
    }

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie())],
        ApiResponse::ok(Empty::default()),
    ))
}

/// The currently logged-in user.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserDto>),
        (status = 401, description = "Not logged in", body = ErrorBody)
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.db.get_user_by_id(identity.user_id).await?;
    Ok(ApiResponse::ok(UserDto::from(user)))
}

/// Change the logged-in user's name and/or email.
#[utoipa::path(
    put,
    path = "/api/v1/auth/updatedetails",
    tag = "Auth",
    request_body = UpdateDetailsRequest,
    responses(
        (status = 200, description = "Details updated", body = ApiResponse<UserDto>),
        (status = 400, description = "Empty name or invalid email", body = ErrorBody),
        (status = 401, description = "Not logged in", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn update_details_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<UpdateDetailsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let current = state.db.get_user_by_id(identity.user_id).await?;

    let name = match req.name {
        Some(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(PortError::Validation("Please add a name".to_string()).into());
            }
            name
        }
        None => current.name,
    };
    let email = match req.email {
        Some(email) => {
            let email = email.trim().to_lowercase();
            validate_email(&email)?;
            email
        }
        None => current.email,
    };

    let user = state
        .db
        .update_user_details(identity.user_id, &name, &email)
        .await
        .map_err(email_taken(&email))?;
    info!(user_id = %user.user_id, "User details updated.");
    Ok(ApiResponse::ok(UserDto::from(user)))
}

/// Change the logged-in user's password. Every other session is ended.
#[utoipa::path(
    put,
    path = "/api/v1/auth/updatepassword",
    tag = "Auth",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed; a fresh session cookie is set", body = ApiResponse<UserDto>),
        (status = 400, description = "New password too short", body = ErrorBody),
        (status = 401, description = "Not logged in or current password wrong", body = ErrorBody)
    )
)]
pub async fn update_password_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<UpdatePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let creds = state.db.get_user_credentials(identity.user_id).await?;
    if !password_matches(&req.current_password, &creds.hashed_password)? {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }
    check_password_length(&req.new_password)?;

    let password_hash = hash_password(&req.new_password)?;
    state
        .db
        .update_password(identity.user_id, &password_hash)
        .await?;
    state.db.delete_user_auth_sessions(identity.user_id).await?;
    let cookie = open_session(&state, identity.user_id).await?;
    let user = state.db.get_user_by_id(identity.user_id).await?;
    info!(user_id = %user.user_id, "Password changed.");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        ApiResponse::ok(UserDto::from(user)),
    ))
}

/// Delete the logged-in user's account along with their sessions and cart.
#[utoipa::path(
    delete,
    path = "/api/v1/auth/deleteaccount",
    tag = "Auth",
    responses(
        (status = 200, description = "Account deleted", body = ApiResponse<Empty>),
        (status = 401, description = "Not logged in", body = ErrorBody)
    )
)]
pub async fn delete_account_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.delete_user(identity.user_id).await?;
    info!(user_id = %identity.user_id, "Account deleted.");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie())],
        ApiResponse::ok(Empty::default()),
    ))
}
