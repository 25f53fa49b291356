//! Configuration structures and loading utilities.
//!
//! This module contains all configuration structures used by the gateway,
//! including environment variable loading and default values.

pub mod audit;
pub mod gateway;
pub mod logging;
pub mod rate_limit;

pub use audit::*;
pub use gateway::*;
pub use logging::*;
pub use rate_limit::*;
