/// Authentication endpoints
///
/// This module provides user authentication endpoints:
/// - Registration (including promotion of a guest account)
/// - Login
/// - Guest login
/// - Profile
/// - Guest conversion
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a user or promote a guest
/// - `POST /api/auth/login` - Login with email and password
/// - `POST /api/auth/guest-login` - Login as a guest with only an email
/// - `GET /api/auth/profile` - Current user (authenticated)
/// - `POST /api/auth/convert-guest` - Turn a guest into a full account (authenticated)
///
/// Every success body carries the user summary; all but profile also carry
/// a fresh session token. Unexpected failures are logged and answered with a
/// 400 carrying a generic message.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use eventhub_shared::{
    auth::{middleware::AuthContext, password},
    models::user::{normalize_email, CreateUser, UpdateUser, User, UserSummary, GUEST_DISPLAY_NAME},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const ALREADY_REGISTERED: &str = "User already exists";
const GUEST_EMAIL_TAKEN: &str = "This email is registered. Please log in with your password";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Please provide a name"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    /// Password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    /// Password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Guest login request
#[derive(Debug, Deserialize, Validate)]
pub struct GuestLoginRequest {
    /// Email address
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

/// Convert guest request
#[derive(Debug, Deserialize, Validate)]
pub struct ConvertGuestRequest {
    /// New display name; blank keeps the current one
    #[serde(default)]
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,

    /// New password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Response carrying a user and a session token
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserSummary,
    pub token: String,
}

/// Profile response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserSummary,
}

/// Maps unexpected failures inside an auth handler to a logged 400
///
/// Client-facing errors (validation, conflict, credentials) pass through
/// unchanged.
fn server_error<E: Into<ApiError>>(operation: &'static str) -> impl FnOnce(E) -> ApiError {
    move |err| match err.into() {
        ApiError::InternalError(detail) => {
            tracing::error!(operation, error = %detail, "Auth operation failed");
            ApiError::BadRequest("Server error".to_string())
        }
        other => other,
    }
}

fn respond(state: &AppState, user: &User, operation: &'static str) -> ApiResult<AuthResponse> {
    let token = state.issue_token(user.id).map_err(server_error(operation))?;
    Ok(AuthResponse {
        user: user.summary(),
        token,
    })
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Ann",
///   "email": "ann@x.com",
///   "password": "secret1"
/// }
/// ```
///
/// # Response
///
/// `201 Created` for a new account, `200 OK` when an existing guest account
/// with the same email was promoted:
///
/// ```json
/// {
///   "user": { "_id": "uuid", "name": "Ann", "email": "ann@x.com", "isGuest": false },
///   "token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, email belongs to a registered
///   account, or an unexpected failure
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(mut req) = payload?;
    req.email = normalize_email(&req.email);
    req.validate().map_err(ApiError::from_validation)?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::invalid_field("name", "Please provide a name"));
    }

    let existing = state
        .store
        .find_user_by_email(&req.email)
        .await
        .map_err(server_error("register"))?;

    if matches!(existing, Some(ref user) if !user.is_guest) {
        return Err(ApiError::Conflict(ALREADY_REGISTERED.to_string()));
    }

    let password_hash = password::hash_password(&req.password).map_err(server_error("register"))?;

    let (status, user) = match existing {
        Some(guest) => {
            let user = state
                .store
                .update_user(
                    guest.id,
                    UpdateUser {
                        name: Some(name),
                        password_hash: Some(password_hash),
                        is_guest: Some(false),
                    },
                )
                .await
                .map_err(server_error("register"))?
                .ok_or_else(|| ApiError::BadRequest("Server error".to_string()))?;

            tracing::info!(user_id = %user.id, "Guest account promoted by registration");
            (StatusCode::OK, user)
        }
        None => {
            let user = state
                .store
                .create_user(CreateUser {
                    name,
                    email: req.email,
                    password_hash,
                    is_guest: false,
                })
                .await
                .map_err(server_error("register"))?;

            tracing::info!(user_id = %user.id, "User registered");
            (StatusCode::CREATED, user)
        }
    };

    Ok((status, Json(respond(&state, &user, "register")?)))
}

/// Login endpoint
///
/// The email is matched exactly as given. Unknown emails and wrong
/// passwords produce the same response.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload?;
    req.validate().map_err(ApiError::from_validation)?;

    let user = state
        .store
        .find_user_by_email(&req.email)
        .await
        .map_err(server_error("login"))?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)
        .map_err(server_error("login"))?;
    if !valid {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    tracing::debug!(user_id = %user.id, "User logged in");
    Ok(Json(respond(&state, &user, "login")?))
}

/// Guest login endpoint
///
/// Re-issues a token for an existing guest, creates a new guest otherwise.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid email, email belongs to a registered account,
///   or an unexpected failure
pub async fn guest_login(
    State(state): State<AppState>,
    payload: Result<Json<GuestLoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(mut req) = payload?;
    req.email = normalize_email(&req.email);
    req.validate().map_err(ApiError::from_validation)?;

    let existing = state
        .store
        .find_user_by_email(&req.email)
        .await
        .map_err(server_error("guest_login"))?;

    let user = match existing {
        Some(user) if user.is_guest => user,
        Some(_) => return Err(ApiError::Conflict(GUEST_EMAIL_TAKEN.to_string())),
        None => {
            let password_hash = password::hash_password(&password::generate_guest_password())
                .map_err(server_error("guest_login"))?;

            let user = state
                .store
                .create_user(CreateUser {
                    name: GUEST_DISPLAY_NAME.to_string(),
                    email: req.email,
                    password_hash,
                    is_guest: true,
                })
                .await
                .map_err(server_error("guest_login"))?;

            tracing::info!(user_id = %user.id, "Guest account created");
            user
        }
    };

    Ok(Json(respond(&state, &user, "guest_login")?))
}

/// Profile of the authenticated user
///
/// # Errors
///
/// - `401 Unauthorized`: No identity, or the user no longer exists
pub async fn profile(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state
        .store
        .find_user_by_id(auth.user_id)
        .await
        .map_err(server_error("profile"))?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    Ok(Json(ProfileResponse {
        user: user.summary(),
    }))
}

/// Converts the authenticated guest into a registered account
///
/// The id and email are kept; name (unless blank) and password are replaced
/// and the guest flag cleared.
///
/// # Errors
///
/// - `400 Bad Request`: Short password, user missing or not a guest, or an
///   unexpected failure
/// - `401 Unauthorized`: No identity
pub async fn convert_guest(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<ConvertGuestRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload?;
    req.validate().map_err(ApiError::from_validation)?;

    let user = state
        .store
        .find_user_by_id(auth.user_id)
        .await
        .map_err(server_error("convert_guest"))?
        .ok_or_else(|| ApiError::BadRequest("User not found".to_string()))?;

    if !user.is_guest {
        return Err(ApiError::BadRequest("User is not a guest".to_string()));
    }

    let name = Some(req.name.trim().to_string()).filter(|name| !name.is_empty());
    let password_hash =
        password::hash_password(&req.password).map_err(server_error("convert_guest"))?;

    let user = state
        .store
        .update_user(
            user.id,
            UpdateUser {
                name,
                password_hash: Some(password_hash),
                is_guest: Some(false),
            },
        )
        .await
        .map_err(server_error("convert_guest"))?
        .ok_or_else(|| ApiError::BadRequest("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "Guest account converted");
    Ok(Json(respond(&state, &user, "convert_guest")?))
}
