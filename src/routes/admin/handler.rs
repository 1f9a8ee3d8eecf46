use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    error::AppError,
    session::{Session, SessionManager, SessionStore},
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{BanRequest, ShrinkResponse, UnbanRequest, set_ban};

fn user_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        error_to_api_response::<()>(error_codes::NOT_FOUND, "User not found"),
    )
        .into_response()
}

/// 先落库封禁标记，成功后作废该用户全部会话；用户不存在时会话不动
async fn ban_and_kick<S, F, Fut>(
    sessions: &SessionManager<S>,
    user_id: i32,
    mark_banned: F,
) -> Result<bool, AppError>
where
    S: SessionStore,
    F: FnOnce(i32) -> Fut,
    Fut: Future<Output = Result<bool, sqlx::Error>>,
{
    if !mark_banned(user_id).await? {
        return Ok(false);
    }
    sessions.kick_user(user_id).await?;
    Ok(true)
}

/// 封禁用户并立即踢下线
#[axum::debug_handler]
pub async fn ban_user(
    State(state): State<AppState>,
    Extension(admin): Extension<Session>,
    Json(req): Json<BanRequest>,
) -> Result<Response, AppError> {
    if req.user_id == admin.user_id {
        return Ok((
            StatusCode::BAD_REQUEST,
            error_to_api_response::<()>(error_codes::VALIDATION_ERROR, "Cannot ban yourself"),
        )
            .into_response());
    }

    let ban_until = req.ban_until;
    let found = ban_and_kick(&state.sessions, req.user_id, |user_id| {
        set_ban(&state.pool, user_id, true, ban_until)
    })
    .await?;
    if !found {
        return Ok(user_not_found());
    }

    tracing::info!(
        admin_id = admin.user_id,
        user_id = req.user_id,
        ban_until = ?req.ban_until,
        "User banned"
    );
    Ok(success_to_api_response(()).into_response())
}

#[axum::debug_handler]
pub async fn unban_user(
    State(state): State<AppState>,
    Json(req): Json<UnbanRequest>,
) -> Result<Response, AppError> {
    if !set_ban(&state.pool, req.user_id, false, None).await? {
        return Ok(user_not_found());
    }
    tracing::info!(user_id = req.user_id, "User unbanned");
    Ok(success_to_api_response(()).into_response())
}

/// 手动触发过期会话清理
#[axum::debug_handler]
pub async fn shrink_sessions(State(state): State<AppState>) -> Result<Response, AppError> {
    state.sessions.shrink().await?;
    let cached_sessions = state.sessions.cache().len().await;
    Ok(success_to_api_response(ShrinkResponse { cached_sessions }).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionCache;
    use crate::session::manager::tests::MemoryStore;
    use chrono::{Duration, Utc};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI32, Ordering};

    async fn manager_with_sessions() -> SessionManager<MemoryStore> {
        let sm = SessionManager::new(MemoryStore::default(), Arc::new(SessionCache::new()));
        let expires_at = Utc::now() + Duration::hours(1);
        for (token, user_id) in [("a", 1), ("b", 1), ("c", 2)] {
            sm.create(Session::new(user_id, "someone", false, expires_at), token)
                .await
                .unwrap();
        }
        sm
    }

    #[tokio::test]
    async fn test_ban_kicks_every_session_of_the_user() {
        let sm = manager_with_sessions().await;
        let marked = AtomicI32::new(0);

        let found = ban_and_kick(&sm, 1, |user_id| {
            marked.store(user_id, Ordering::SeqCst);
            async { Ok(true) }
        })
        .await
        .unwrap();

        assert!(found);
        assert_eq!(marked.load(Ordering::SeqCst), 1);
        assert!(sm.get("a").await.is_none());
        assert!(sm.get("b").await.is_none());
        assert!(!sm.store().contains("a"));
        assert!(!sm.store().contains("b"));
        assert!(sm.get("c").await.is_some());
        assert!(sm.store().contains("c"));
    }

    #[tokio::test]
    async fn test_ban_of_unknown_user_leaves_sessions() {
        let sm = manager_with_sessions().await;

        let found = ban_and_kick(&sm, 1, |_| async { Ok(false) }).await.unwrap();

        assert!(!found);
        assert!(sm.get("a").await.is_some());
        assert!(sm.store().contains("b"));
    }

    #[tokio::test]
    async fn test_failed_ban_update_leaves_sessions() {
        let sm = manager_with_sessions().await;

        let result = ban_and_kick(&sm, 1, |_| async { Err(sqlx::Error::PoolTimedOut) }).await;

        assert!(matches!(result, Err(AppError::Database(_))));
        assert!(sm.get("a").await.is_some());
    }

    #[tokio::test]
    async fn test_ban_surfaces_session_store_failure() {
        let sm = manager_with_sessions().await;
        sm.store().set_failing(true);

        let result = ban_and_kick(&sm, 1, |_| async { Ok(true) }).await;

        assert!(matches!(result, Err(AppError::Session(_))));
        assert!(sm.get("a").await.is_some());
    }
}
