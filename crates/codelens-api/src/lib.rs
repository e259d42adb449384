pub mod auth;
pub mod error;
pub mod middleware;
pub mod pages;
pub mod reviews;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{AppState, AppStateInner};
