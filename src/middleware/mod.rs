//! Custom middleware implementations for the gateway.
//!
//! This module contains middleware for request ids and metrics collection.

pub mod metrics;
pub mod request_id;

pub use metrics::*;
pub use request_id::*;
