// HTTP routes
pub mod analytics;
pub mod detail;
pub mod geography;
pub mod health;
pub mod issues;
pub mod moderation;

pub use health::health_handler;
