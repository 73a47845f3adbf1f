//! ShelfMaster library loan management
//!
//! Tracks borrow requests for physical book copies through their lifecycle
//! (pending, issued, returned or rejected) and exposes it as a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
