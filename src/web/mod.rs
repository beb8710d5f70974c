//! HTTP surface: the form pages and a small JSON API

pub mod handlers;
pub mod render;
pub mod routes;
pub mod state;

pub use render::Templates;
pub use routes::{create_router, create_unavailable_router};
pub use state::{AppState, UnavailableState};
