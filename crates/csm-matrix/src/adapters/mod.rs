//! Adapters Layer (Driven Adapters)
//!
//! - `InMemoryChain` - every outbound port over in-process maps, used by the
//!   tests and the inspection tool

pub mod memory;

pub use memory::{stored_places, InMemoryChain};
