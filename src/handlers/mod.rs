//! HTTP handlers

pub mod health;
pub mod model;
pub mod predict;

use crate::AppError;

/// Fallback for unknown routes
pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
