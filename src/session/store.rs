use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::error::Result;
use super::model::SessionRow;

/// 会话的持久化存储，缓存以它为准
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
        user_id: i32,
    ) -> Result<()>;

    /// 返回受影响行数
    async fn delete_session_by_token(&self, token: &str) -> Result<u64>;

    async fn delete_sessions_by_user(&self, user_id: i32) -> Result<u64>;

    /// 删除 `expires_at <= now` 的全部会话
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64>;

    /// 未过期会话及其所属用户的用户名与管理员标记
    async fn list_active_sessions(&self, now: DateTime<Utc>) -> Result<Vec<SessionRow>>;
}

/// Postgres 会话存储
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert_session(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
        user_id: i32,
    ) -> Result<()> {
        sqlx::query("INSERT INTO sessions (token, expires_at, user_id) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(expires_at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_sessions_by_user(&self, user_id: i32) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_active_sessions(&self, now: DateTime<Utc>) -> Result<Vec<SessionRow>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT s.token, s.expires_at, s.user_id, u.username, u.admin AS is_admin
            FROM sessions s
            JOIN users u ON s.user_id = u.user_id
            WHERE s.expires_at > $1
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
