use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::cache::SessionCache;
use super::error::Result;
use super::model::Session;
use super::store::SessionStore;

/// 启动同步失败后的默认重试间隔
pub const DEFAULT_SYNC_RETRY: Duration = Duration::from_secs(10);

/// 协调持久化存储与内存缓存，存储为准
///
/// 每个写操作先写存储，成功后再更新缓存；存储失败时缓存保持不变。
/// 进程启动时必须先 `init_sync` 完成后再对外提供服务。
pub struct SessionManager<S: SessionStore> {
    store: S,
    cache: Arc<SessionCache>,
    sync_retry: Duration,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: S, cache: Arc<SessionCache>) -> Self {
        Self {
            store,
            cache,
            sync_retry: DEFAULT_SYNC_RETRY,
        }
    }

    pub fn with_sync_retry(mut self, retry: Duration) -> Self {
        self.sync_retry = retry;
        self
    }

    /// 缓存句柄，供鉴权中间件直接只读查询
    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// 登录成功后调用
    pub async fn create(&self, session: Session, token: &str) -> Result<()> {
        self.store
            .insert_session(token, session.expires_at, session.user_id)
            .await?;
        debug!(user_id = session.user_id, "Session created");
        self.cache.create(session, token).await;
        Ok(())
    }

    /// 登出时调用。存储删除失败时保留缓存中的旧记录，由之后的 shrink 或重新同步收敛。
    pub async fn delete(&self, token: &str) -> Result<()> {
        let removed = self.store.delete_session_by_token(token).await?;
        if removed == 0 {
            debug!("Logout for a session unknown to the store");
        }
        self.cache.delete(token).await;
        Ok(())
    }

    /// 封禁用户时调用，立即作废其全部会话
    pub async fn kick_user(&self, user_id: i32) -> Result<()> {
        let removed = self.store.delete_sessions_by_user(user_id).await?;
        info!(user_id, removed, "Kicked user sessions");
        self.cache.kick_user(user_id).await;
        Ok(())
    }

    /// 从存储重建缓存，失败则按固定间隔无限重试，返回加载的会话数
    pub async fn init_sync(&self) -> usize {
        loop {
            match self.store.list_active_sessions(Utc::now()).await {
                Ok(rows) => {
                    let sessions: HashMap<String, Session> =
                        rows.into_iter().map(Into::into).collect();
                    let count = sessions.len();
                    self.cache.reassign(sessions).await;
                    info!(count, "Session cache synchronized with store");
                    return count;
                }
                Err(e) => {
                    error!(error = %e, "Failed to load sessions from store");
                    warn!(retry_secs = self.sync_retry.as_secs_f64(), "Retrying session sync");
                    tokio::time::sleep(self.sync_retry).await;
                }
            }
        }
    }

    /// 清除已过期会话。存储失败直接返回，不在此处重试。
    pub async fn shrink(&self) -> Result<()> {
        let removed = self.store.delete_expired_sessions(Utc::now()).await?;
        let evicted = self.cache.shrink().await;
        debug!(removed, evicted, "Expired sessions removed");
        Ok(())
    }

    /// 仅查缓存
    pub async fn get(&self, token: &str) -> Option<Session> {
        self.cache.get(token).await
    }

    /// 按请求 cookie 中的令牌查询会话，cookie 缺失或为空时返回 None
    pub async fn get_session_info(&self, cookie_value: Option<&str>) -> Option<Session> {
        match cookie_value {
            Some(token) if !token.is_empty() => self.get(token).await,
            _ => None,
        }
    }
}
