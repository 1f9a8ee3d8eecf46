use std::env;
use std::time::Duration;

/// 会话令牌的最小随机字节数
pub const MIN_SESSION_TOKEN_BYTES: usize = 32;

/// 会话有效期上限（小时），一年
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub session_ttl_secs: u64,
    pub eviction_interval_secs: u64,
    pub init_sync_retry_secs: u64,
    pub session_token_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key))
    }

    /// 按给定的查找函数构建配置，缺省值与下限在这里统一处理
    pub fn from_lookup<F>(lookup: F) -> Result<Self, env::VarError>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let session_ttl_hours = lookup("SESSION_TTL")
            .ok()
            .and_then(|v| v.trim_end_matches('h').parse::<u64>().ok())
            .unwrap_or(24)
            .clamp(1, MAX_SESSION_TTL_HOURS);

        Ok(Config {
            database_url: lookup("DATABASE_URL")?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10),
            server_host: lookup("SERVER_HOST")?,
            server_port: parse_or(&lookup, "SERVER_PORT", 3000),
            api_base_uri: lookup("API_BASE_URI").unwrap_or_else(|_| "/api".into()),
            session_ttl_secs: session_ttl_hours * 3600,
            // tokio 的 interval 不接受零周期
            eviction_interval_secs: parse_or(&lookup, "SESSION_EVICTION_INTERVAL", 3600_u64).max(1),
            init_sync_retry_secs: parse_or(&lookup, "SESSION_SYNC_RETRY", 10),
            session_token_bytes: parse_or(&lookup, "SESSION_TOKEN_BYTES", MIN_SESSION_TOKEN_BYTES)
                .max(MIN_SESSION_TOKEN_BYTES),
        })
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_secs)
    }

    pub fn init_sync_retry(&self) -> Duration {
        Duration::from_secs(self.init_sync_retry_secs)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Result<String, env::VarError>,
{
    lookup(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
impl Config {
    pub(crate) fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/moviedb_test".into(),
            db_max_connections: 1,
            server_host: "127.0.0.1".into(),
            server_port: 0,
            api_base_uri: "/api".into(),
            session_ttl_secs: 3600,
            eviction_interval_secs: 3600,
            init_sync_retry_secs: 1,
            session_token_bytes: MIN_SESSION_TOKEN_BYTES,
        }
    }
}
