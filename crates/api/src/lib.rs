//! HTTP API for the shop: configuration, routing, and request/response mapping.

pub mod app;
pub mod config;
