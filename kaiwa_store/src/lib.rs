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

//! Durable conversation storage.
//!
//! One document per user in a remote document store, holding a `messages`
//! field next to whatever unrelated fields the document carries. History
//! writes go through MERGE so siblings survive; a missing document reads
//! as an empty history and is created lazily on first write.

mod memory;
mod surreal;

pub use memory::MemoryStore;
pub use surreal::SurrealStore;
