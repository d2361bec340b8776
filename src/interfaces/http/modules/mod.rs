pub mod analytics;
pub mod dashboard;
pub mod health;
pub mod metrics;
pub mod settings;
pub mod uploads;
