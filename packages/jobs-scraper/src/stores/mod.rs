//! Sink and runtime implementations.

pub mod apify;
pub mod jsonl;
pub mod memory;

pub use apify::{ApifyRuntime, ApifySink};
pub use jsonl::{JsonLinesSink, LocalRuntime};
pub use memory::MemorySink;
