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

//! LINE Messaging API surface.
//!
//! Inbound: signature-verified webhook server dispatching typed events to
//! the turn engine. Outbound: reply-token message send plus setup-time
//! rich-menu provisioning.

mod client;
mod error;
mod events;
mod handler;
mod server;
pub mod signature;

pub use client::LineClient;
pub use error::{Error, Result};
pub use events::{Event, FollowEvent, MessageContent, MessageEvent, UnfollowEvent, WebhookPayload};
pub use handler::handle_event;
pub use server::{AppState, SharedEngine, run};
