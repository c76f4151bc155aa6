//! ResQ dispatch library
//!
//! Emergency fan-out core (renderer, channel adapters, delivery tracker,
//! coordinator, gateway) plus the HTTP surface that drives it. Exposed as a
//! library so the test suites can wire it up directly.

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
