mod handler;
mod model;

pub use handler::{ban_user, shrink_sessions, unban_user};
