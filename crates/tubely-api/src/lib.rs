//! Tubely API Library
//!
//! HTTP handlers, authentication, application state and setup for the video
//! upload service.

pub mod constants;
mod handlers;
pub mod setup;
pub mod telemetry;
mod utils;

// Public modules
pub mod auth;
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::{AppState, ThumbnailStore};
