use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, ProfileResponse, PublicUser, RefreshRequest, RegisterRequest},
        claims::TokenKind,
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password, verify_unknown_user},
        repo_types::User,
    },
    state::AppState,
    tasks::badge::badge_for,
};

const USERNAME_MAX: usize = 64;
const EMAIL_MAX: usize = 120;
const PASSWORD_MIN: usize = 8;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).delete(delete_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() <= EMAIL_MAX && EMAIL_RE.is_match(email)
}

/// Normalizes and checks a registration form. Uniqueness is checked against the store later.
pub(crate) fn check_registration(payload: &mut RegisterRequest) -> Result<(), (StatusCode, String)> {
    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    if payload.username.is_empty()
        || payload.username.chars().count() > USERNAME_MAX
        || payload.username.chars().any(char::is_whitespace)
    {
        return Err((StatusCode::BAD_REQUEST, "Invalid username".into()));
    }
    if !is_valid_email(&payload.email) {
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    if payload.password.len() < PASSWORD_MIN {
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }
    if payload.password != payload.confirm_password {
        return Err((StatusCode::BAD_REQUEST, "Passwords do not match".into()));
    }
    Ok(())
}

fn bad_credentials() -> (StatusCode, String) {
    (StatusCode::UNAUTHORIZED, "Invalid credentials".into())
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "auth store failure");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
}

fn is_unique_violation(e: &anyhow::Error) -> bool {
    e.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.is_unique_violation())
}

fn auth_response(keys: &JwtKeys, user: User) -> Result<AuthResponse, (StatusCode, String)> {
    let (access_token, refresh_token) = keys.issue_pair(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            id: user.id,
            username: user.username,
            email: user.email,
        },
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    if let Err(rejection) = check_registration(&mut payload) {
        warn!(username = %payload.username, reason = %rejection.1, "registration rejected");
        return Err(rejection);
    }

    if User::find_by_username(&state.db, &payload.username)
        .await
        .map_err(internal)?
        .is_some()
    {
        warn!(username = %payload.username, "username already exists");
        return Err((StatusCode::CONFLICT, "Username already exists".into()));
    }

    if User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(internal)?
        .is_some()
    {
        warn!(email = %payload.email, "email already registered");
        return Err((StatusCode::CONFLICT, "Email already registered".into()));
    }

    let hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "hash_password failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let user = match User::create(&state.db, &payload.username, &payload.email, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(username = %payload.username, "registration lost a uniqueness race");
            return Err((StatusCode::CONFLICT, "Username or email already taken".into()));
        }
        Err(e) => return Err(internal(e)),
    };

    info!(user_id = %user.id, username = %user.username, "user registered");
    let keys = JwtKeys::from_ref(&state);
    Ok((StatusCode::CREATED, Json(auth_response(&keys, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let username = payload.username.trim();

    let user = match User::find_by_username(&state.db, username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            verify_unknown_user(&payload.password);
            warn!(%username, "login unknown username");
            return Err(bad_credentials());
        }
        Err(e) => return Err(internal(e)),
    };

    let ok = match verify_password(&payload.password, &user.password_hash) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "verify_password failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(bad_credentials());
    }

    info!(user_id = %user.id, username = %user.username, "user logged in");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(auth_response(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify(&payload.refresh_token, TokenKind::Refresh).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        e
    })?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    Ok(Json(auth_response(&keys, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            warn!(%user_id, "user not found");
            (StatusCode::UNAUTHORIZED, "User not found".to_string())
        })?;

    Ok(Json(ProfileResponse {
        badge: badge_for(user.total_points),
        id: user.id,
        username: user.username,
        email: user.email,
        total_points: user.total_points,
        created_at: user.created_at,
    }))
}

#[instrument(skip(state))]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, (StatusCode, String)> {
    if !User::delete(&state.db, user_id).await.map_err(internal)? {
        return Err((StatusCode::NOT_FOUND, "User not found".into()));
    }
    info!(%user_id, "account deleted with its tasks");
    Ok(StatusCode::NO_CONTENT)
}
