use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::manager::SessionManager;
use super::store::SessionStore;

/// 默认每小时清理一次
pub const DEFAULT_EVICTION_INTERVAL: Duration = Duration::from_secs(3600);

pub const MIN_EVICTION_INTERVAL: Duration = Duration::from_secs(1);

/// 启动后台清理任务，周期性调用 `SessionManager::shrink`
///
/// 首次清理立即执行。清理失败只记录日志，任务继续等待下一个周期。
/// 零周期按 `MIN_EVICTION_INTERVAL` 处理。
pub fn spawn_eviction<S>(manager: Arc<SessionManager<S>>, period: Duration) -> JoinHandle<()>
where
    S: SessionStore + 'static,
{
    let period = if period.is_zero() {
        tracing::warn!("Zero eviction interval, using {:?}", MIN_EVICTION_INTERVAL);
        MIN_EVICTION_INTERVAL
    } else {
        period
    };

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = manager.shrink().await {
                tracing::error!(error = %e, "Error shrinking sessions");
            }
        }
    })
}
