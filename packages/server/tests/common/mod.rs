// Common test utilities

pub mod fixtures;
pub mod harness;
pub mod http;

pub use fixtures::*;
pub use harness::*;
pub use http::*;
