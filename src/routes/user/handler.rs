use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use chrono::{TimeDelta, Utc};

use crate::{
    AppState,
    error::AppError,
    middleware::SESSION_COOKIE,
    session::Session,
    utils::{
        error_codes, error_to_api_response, generate_token, password_is_valid,
        success_to_api_response, username_is_valid,
    },
};

use super::model::{LoginRequest, RegisterRequest, RegisterResponse, SessionResponse, User};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    if !username_is_valid(&req.username) || !password_is_valid(&req.password) {
        return Ok((
            StatusCode::BAD_REQUEST,
            error_to_api_response::<()>(
                error_codes::VALIDATION_ERROR,
                "Username must be 3-32 characters, password 8-128",
            ),
        )
            .into_response());
    }

    match User::create(&state.pool, &req).await {
        Ok(user) => Ok((
            StatusCode::CREATED,
            success_to_api_response(RegisterResponse {
                user_id: user.user_id,
                username: user.username,
            }),
        )
            .into_response()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok((
            StatusCode::CONFLICT,
            error_to_api_response::<()>(error_codes::USER_EXISTS, "Username is taken"),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let invalid = || {
        (
            StatusCode::UNAUTHORIZED,
            error_to_api_response::<()>(error_codes::AUTH_FAILED, "Invalid username or password"),
        )
            .into_response()
    };

    if !username_is_valid(&req.username) || !password_is_valid(&req.password) {
        return Ok(invalid());
    }

    let Some(user) = User::find_by_username(&state.pool, &req.username).await? else {
        return Ok(invalid());
    };
    if !user.verify_login(&req.password)? {
        return Ok(invalid());
    }

    let now = Utc::now();
    if user.is_banned_at(now) {
        tracing::info!(user_id = user.user_id, "Banned user attempted login");
        return Ok((
            StatusCode::FORBIDDEN,
            error_to_api_response::<()>(error_codes::BANNED, "Account is banned"),
        )
            .into_response());
    }

    let token = generate_token(state.config.session_token_bytes);
    let ttl = TimeDelta::from_std(state.config.session_ttl()).unwrap_or(TimeDelta::hours(24));
    let Some(expires_at) = now.checked_add_signed(ttl) else {
        return Err(AppError::Internal("session expiry out of range"));
    };
    let session = Session::new(user.user_id, user.username, user.admin, expires_at);
    state.sessions.create(session.clone(), &token).await?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax);

    Ok((
        jar.add(cookie),
        success_to_api_response(SessionResponse::from(session)),
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<Response, AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty());
    if let Some(token) = token {
        state.sessions.delete(&token).await?;
    }

    Ok((
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        success_to_api_response(()),
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn session_info(Extension(session): Extension<Session>) -> impl IntoResponse {
    success_to_api_response(SessionResponse::from(session))
}
