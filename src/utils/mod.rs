//! Utility functions and helper modules.
//!
//! This module contains request inspection helpers (client IP, API key,
//! request id) and route pattern extraction used for metric labels.

pub mod http;
pub mod route;

pub use http::*;
pub use route::*;
