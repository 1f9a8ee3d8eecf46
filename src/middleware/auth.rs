use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use chrono::Utc;

use crate::{AppState, error::AppError, session::Session};

pub const SESSION_COOKIE: &str = "session_token";

/// 从 cookie 取令牌，仅查缓存；命中且未过期时把会话放入请求扩展
///
/// 过期记录在下一次 shrink 之前仍留在缓存里，这里按到期时间拒绝。
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value());
    let session = state
        .sessions
        .get_session_info(token)
        .await
        .filter(|s| !s.is_expired_at(Utc::now()))
        .ok_or(AppError::Unauthorized)?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// 需放在 auth_middleware 之后
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    match req.extensions().get::<Session>() {
        Some(session) if session.is_admin => Ok(next.run(req).await),
        Some(session) => {
            tracing::warn!(user_id = session.user_id, "Non-admin tried an admin route");
            Err(AppError::Forbidden)
        }
        None => Err(AppError::Unauthorized),
    }
}
