// 会话模块
// 内存缓存 + 数据库存储，写操作先落库再更新缓存

pub mod cache;
pub mod error;
pub mod eviction;
pub mod manager;
pub mod model;
pub mod store;

// 重新导出常用类型和函数，方便其他模块使用
pub use cache::SessionCache;
pub use error::SessionError;
pub use eviction::{DEFAULT_EVICTION_INTERVAL, spawn_eviction};
pub use manager::SessionManager;
pub use model::{Session, SessionRow};
pub use store::{PgSessionStore, SessionStore};
