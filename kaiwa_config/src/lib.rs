#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Environment-sourced configuration.
//!
//! Every recognized option has a default except the three credentials;
//! a missing credential is a fatal startup condition surfaced to the
//! binary, which exits before serving traffic.

mod schema;

pub use schema::{
    ChatConfig, Config, ConfigError, LineConfig, OpenAiConfig, ServerConfig, StoreConfig,
};
