//! HTTP request handlers for gateway endpoints.
//!
//! This module contains the system endpoints, the partner and admin
//! endpoints, the proxied route table, and the app factory.

pub mod admin;
pub mod health;
pub mod metrics;
pub mod openapi;
pub mod partner;
pub mod proxy;

pub use admin::*;
pub use health::*;
pub use metrics::*;
pub use openapi::*;
pub use partner::*;
