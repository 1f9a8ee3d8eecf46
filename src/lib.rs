use config::Config;
use session::{PgSessionStore, SessionManager};
use sqlx::PgPool;
use std::sync::Arc;

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub sessions: Arc<SessionManager<PgSessionStore>>,
}
