#![warn(
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

//! Per-turn conversation lifecycle.
//!
//! This crate owns the two pieces with design substance: the bounded
//! history window (how many turns survive, and which end gets dropped)
//! and the turn engine that threads one inbound message through
//! fetch → append → complete → persist, or through the reset path.
//!
//! The engine holds no state between turns; the store is read fresh on
//! every message.

mod engine;
mod history;

pub use engine::{EMPTY_REPLY_FALLBACK, EngineConfig, RESET_CONFIRMATION, TurnEngine};
pub use history::{HistoryWindow, is_reset_command};
