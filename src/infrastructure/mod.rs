//! Adapters to the outside world: configuration loading and logging setup.
//! The domain and services layers never depend on this module.

pub mod config;
pub mod logging;
