//! Sink implementations

pub mod async_sink;
pub mod console;
#[cfg(feature = "file")]
pub mod jsonl_store;
pub mod memory;
pub mod store;

pub use async_sink::{AsyncSink, AsyncSinkBuilder};
pub use console::ConsoleSink;
#[cfg(feature = "file")]
pub use jsonl_store::JsonlStore;
pub use memory::MemorySink;
pub use store::{DocumentStore, MemoryStore, StoreSink, LOG_COLLECTION, TRACE_COLLECTION};
