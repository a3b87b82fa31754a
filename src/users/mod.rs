use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod memory;
pub mod password;
pub mod patch;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod store;
pub mod validation;

pub use repo_types::{Role, User};
pub use services::AccountStore;
pub use store::UserStore;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::user_routes())
}
