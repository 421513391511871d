//! HTTP surface and process wiring for the media janitor.
//!
//! The binary in `main.rs` loads configuration, builds an [`AppState`] and
//! serves [`create_app`]; tests build the same router over fakes.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
pub use routes::create_app;
