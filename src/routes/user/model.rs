use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::session::Session;
use crate::utils::{hash_password, verify_password};

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub admin: bool,
    pub banned: bool,
    pub ban_until: Option<DateTime<Utc>>,
}

impl User {
    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, password_hash, admin, banned, ban_until
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &PgPool, req: &RegisterRequest) -> Result<User, sqlx::Error> {
        let password_hash = hash_password(&req.password)
            .map_err(|e| sqlx::Error::Protocol(format!("Failed to hash password: {}", e)))?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING user_id, username, password_hash, admin, banned, ban_until
            "#,
        )
        .bind(&req.username)
        .bind(password_hash)
        .fetch_one(pool)
        .await?;

        tracing::info!(user_id = user.user_id, "Registered user");
        Ok(user)
    }

    pub fn verify_login(&self, password: &str) -> Result<bool, bcrypt::BcryptError> {
        verify_password(password, &self.password_hash)
    }

    /// 封禁中且未到解封时间
    pub fn is_banned_at(&self, now: DateTime<Utc>) -> bool {
        self.banned && self.ban_until.is_none_or(|until| until > now)
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: i32,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: i32,
    pub username: String,
    pub is_admin: bool,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            user_id: session.user_id,
            username: session.username,
            is_admin: session.is_admin,
            expires_at: session.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(banned: bool, ban_until: Option<DateTime<Utc>>) -> User {
        User {
            user_id: 1,
            username: "alice".into(),
            password_hash: String::new(),
            admin: false,
            banned,
            ban_until,
        }
    }

    #[test]
    fn test_ban_window() {
        let now = Utc::now();
        assert!(!user(false, None).is_banned_at(now));
        assert!(user(true, None).is_banned_at(now));
        assert!(user(true, Some(now + Duration::days(1))).is_banned_at(now));
        assert!(!user(true, Some(now - Duration::days(1))).is_banned_at(now));
    }
}
