use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::model::Session;

/// 令牌到会话记录的内存缓存
///
/// 读操作取共享锁，写操作取独占锁；任何方法在持锁期间都不会再调用
/// 其他加锁方法。批量删除（`kick_user`、`shrink`）先在读锁下收集令牌，
/// 释放读锁后再逐个删除，避免扫描期间长时间持有写锁。
#[derive(Debug, Default)]
pub struct SessionCache {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖
    pub async fn create(&self, session: Session, token: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(token.to_string(), session);
        trace!(cache_size = sessions.len(), "Session cached");
    }

    pub async fn get(&self, token: &str) -> Option<Session> {
        self.sessions.read().await.get(token).cloned()
    }

    /// 幂等删除
    pub async fn delete(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    /// 移除某个用户的全部会话
    pub async fn kick_user(&self, user_id: i32) {
        let tokens: Vec<String> = {
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .filter(|(_, s)| s.user_id == user_id)
                .map(|(token, _)| token.clone())
                .collect()
        };

        debug!(user_id, count = tokens.len(), "Kicking user sessions from cache");
        for token in &tokens {
            self.delete(token).await;
        }
    }

    /// 移除扫描时已过期的会话
    pub async fn shrink(&self) -> usize {
        let tokens: Vec<String> = {
            let now = Utc::now();
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .filter(|(_, s)| s.is_expired_at(now))
                .map(|(token, _)| token.clone())
                .collect()
        };

        for token in &tokens {
            self.delete(token).await;
        }

        if !tokens.is_empty() {
            debug!(count = tokens.len(), "Shrunk expired sessions from cache");
        }
        tokens.len()
    }

    pub async fn wipe(&self) {
        self.sessions.write().await.clear();
    }

    /// 整体替换，用于启动时重新同步
    pub async fn reassign(&self, sessions: HashMap<String, Session>) {
        *self.sessions.write().await = sessions;
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn live(user_id: i32) -> Session {
        Session::new(user_id, format!("user{user_id}"), false, Utc::now() + Duration::hours(1))
    }

    fn expired(user_id: i32) -> Session {
        Session::new(user_id, format!("user{user_id}"), false, Utc::now() - Duration::seconds(1))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let cache = SessionCache::new();
        let session = live(1);
        cache.create(session.clone(), "a").await;

        assert_eq!(cache.get("a").await, Some(session));
        assert_eq!(cache.get("missing").await, None);
    }

    #[tokio::test]
    async fn test_create_overwrites() {
        let cache = SessionCache::new();
        cache.create(live(1), "a").await;
        cache.create(live(2), "a").await;

        assert_eq!(cache.get("a").await.map(|s| s.user_id), Some(2));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let cache = SessionCache::new();
        cache.create(live(1), "a").await;

        cache.delete("a").await;
        assert!(cache.get("a").await.is_none());
        cache.delete("a").await;
        assert!(cache.get("a").await.is_none());
    }

    #[tokio::test]
    async fn test_kick_user_removes_all_tokens_of_user() {
        let cache = SessionCache::new();
        cache.create(live(1), "a").await;
        cache.create(live(1), "b").await;
        cache.create(live(2), "c").await;

        cache.kick_user(1).await;

        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_none());
        assert!(cache.get("c").await.is_some());
    }

    #[tokio::test]
    async fn test_shrink_boundary() {
        let cache = SessionCache::new();
        let now = Utc::now();
        cache.create(Session::new(1, "at", false, now), "at-now").await;
        cache
            .create(Session::new(2, "later", false, now + Duration::seconds(1)), "later")
            .await;
        cache
            .create(Session::new(3, "future", false, now + Duration::hours(1)), "future")
            .await;

        let removed = cache.shrink().await;

        assert_eq!(removed, 1);
        assert!(cache.get("at-now").await.is_none());
        assert!(cache.get("later").await.is_some());
        assert!(cache.get("future").await.is_some());
    }

    #[tokio::test]
    async fn test_shrink_removes_expired() {
        let cache = SessionCache::new();
        cache.create(expired(1), "old").await;
        cache.create(live(2), "new").await;

        assert_eq!(cache.shrink().await, 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("new").await.is_some());
    }

    #[tokio::test]
    async fn test_wipe_and_reassign() {
        let cache = SessionCache::new();
        cache.create(live(1), "a").await;
        cache.wipe().await;
        assert!(cache.is_empty().await);

        let mut fresh = HashMap::new();
        fresh.insert("x".to_string(), live(5));
        fresh.insert("y".to_string(), live(6));
        cache.create(live(1), "stale").await;
        cache.reassign(fresh).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("stale").await.is_none());
        assert_eq!(cache.get("x").await.map(|s| s.user_id), Some(5));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_access() {
        let cache = Arc::new(SessionCache::new());
        for i in 0..50 {
            cache.create(expired(i), &format!("expired-{i}")).await;
        }

        let mut handles = Vec::new();
        for i in 0..100 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                let token = format!("tok-{i}");
                cache.create(live(i), &token).await;
                assert!(cache.get(&token).await.is_some());
                if i % 2 == 0 {
                    cache.delete(&token).await;
                }
            }));
        }
        let shrinker = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.shrink().await })
        };

        for handle in futures_util::future::join_all(handles).await {
            handle.unwrap();
        }
        assert_eq!(shrinker.await.unwrap(), 50);

        assert_eq!(cache.len().await, 50);
        for i in 0..100 {
            let present = cache.get(&format!("tok-{i}")).await.is_some();
            assert_eq!(present, i % 2 == 1);
        }
    }
}
