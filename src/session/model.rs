use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 一次已认证登录的会话记录，以令牌为键存放在缓存中
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i32,
    /// 创建或重新同步时的用户名快照
    pub username: String,
    pub is_admin: bool,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        user_id: i32,
        username: impl Into<String>,
        is_admin: bool,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            is_admin,
            expires_at,
        }
    }

    /// 到期时刻本身也视为已过期
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// sessions 与 users 联表查询得到的一行
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: i32,
    pub username: String,
    pub is_admin: bool,
}

impl From<SessionRow> for (String, Session) {
    fn from(row: SessionRow) -> Self {
        (
            row.token,
            Session {
                user_id: row.user_id,
                username: row.username,
                is_admin: row.is_admin,
                expires_at: row.expires_at,
            },
        )
    }
}
