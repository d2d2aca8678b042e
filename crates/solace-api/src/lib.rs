//! Solace API crate - axum HTTP front end over the chatbot engine.
//!
//! Exposes session lifecycle, chat, history export, and health endpoints.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
