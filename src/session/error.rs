//! 会话子系统的错误类型

/// 存储层失败。缓存未命中不是错误，用 `Option::None` 表示。
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// 数据库不可达或语句执行失败
    #[error("session store error: {0}")]
    Store(#[from] sqlx::Error),

    /// 非 sqlx 来源的存储失败
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
