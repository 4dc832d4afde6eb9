//! Configuration library for the reelfeed client.
//!
//! Loads [`ClientConfig`] from a file, inline JSON or defaults, layers the
//! catalog token from the environment on top, and hosts the command
//! implementations the `reelfeed` binary dispatches to.
#![allow(missing_docs)]

pub mod commands;
pub mod error;
pub mod models;

pub use error::ConfigLoadError;
pub use models::{ClientConfig, ConfigSource};
