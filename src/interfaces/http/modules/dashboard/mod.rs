//! Browser-facing pages

pub mod handlers;
pub mod views;

pub use handlers::*;
