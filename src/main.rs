use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use moviedb::{
    AppState,
    config::Config,
    routes,
    session::{PgSessionStore, SessionCache, SessionManager, spawn_eviction},
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'moviedb';").await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // 缓存 -> 管理器 -> 同步 -> 对外服务 -> 后台清理
    let cache = Arc::new(SessionCache::new());
    let sessions = Arc::new(
        SessionManager::new(PgSessionStore::new(pool.clone()), cache)
            .with_sync_retry(config.init_sync_retry()),
    );
    sessions.init_sync().await;
    let evictor = Arc::clone(&sessions);

    let state = AppState {
        pool,
        config: config.clone(),
        sessions,
    };

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    let app = routes::app(state);

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Server listening on {}", addr);

    spawn_eviction(evictor, config.eviction_interval());

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
