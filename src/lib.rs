//! Personalized to-do list recommendations.
//!
//! Collaborative filtering over the user↔list subscription graph, an inverted
//! index over list titles, and a merger that falls back to popular and new
//! lists. Storage, HTTP and authentication belong to the host service; this
//! crate reads through the repository traits in [`db`].

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use engine::Engine;
pub use error::{AppError, AppResult};
pub use telemetry::init_tracing;
