//! # Connector Layer
//!
//! Adapters binding the application ports to the outside world: HTTP
//! clients, crawlers, stores, and the HTTP API.

pub mod adapter;
pub mod api;
pub mod crawler;
