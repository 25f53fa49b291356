//! Data models and schemas for the partner gateway.
//!
//! This module contains the partner identity records, audit trail types,
//! and the request/response models of the gateway's own endpoints.

pub mod api;
pub mod audit;
pub mod partner;

pub use api::*;
pub use audit::*;
pub use partner::*;
