pub mod auth;
pub mod brands;
pub mod cart;
pub mod categories;
pub mod dto;
pub mod extract;
pub mod middleware;
pub mod products;
pub mod rest;
pub mod router;
pub mod state;
pub mod upload;

pub use middleware::{require_admin, require_auth};
pub use router::app_router;
pub use state::AppState;
