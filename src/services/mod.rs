//! Business logic and service layer modules.
//!
//! This module contains the core of the gateway: the partner registry, the
//! sliding-window rate limiter, the audit log, the backend forwarder, and the
//! gate pipeline that ties them together.

pub mod audit_log;
pub mod forwarder;
pub mod gateway;
pub mod metrics;
pub mod partners;
pub mod rate_limit;

pub use audit_log::*;
pub use forwarder::*;
pub use gateway::*;
pub use metrics::*;
pub use partners::*;
pub use rate_limit::*;
