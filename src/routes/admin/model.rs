use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Deserialize)]
pub struct BanRequest {
    pub user_id: i32,
    /// 为空表示永久封禁
    pub ban_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UnbanRequest {
    pub user_id: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShrinkResponse {
    pub cached_sessions: usize,
}

/// 返回是否找到该用户
pub async fn set_ban(
    pool: &PgPool,
    user_id: i32,
    banned: bool,
    ban_until: Option<DateTime<Utc>>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET banned = $2, ban_until = $3 WHERE user_id = $1")
        .bind(user_id)
        .bind(banned)
        .bind(ban_until)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
