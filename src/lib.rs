//! Equipment Lending Server
//!
//! REST JSON API for an equipment lending portal: users request shared
//! equipment, administrators approve or decline, and returns are recorded
//! in full or in part while inventory counts stay reconciled.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod reconciliation;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
