pub mod analytics;
pub mod auth;
pub mod classification;
pub mod geography;
pub mod identity;
pub mod issues;
