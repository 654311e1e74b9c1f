//! # CSM Test Suite
//!
//! Scenarios that cross crate boundaries: records built with
//! `csm-contracts`, serialized by `csm-cell`, served by the in-memory chain
//! and read back through `csm-matrix`.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs        # Hand-built places and service wiring
//! └── integration/
//!     ├── codec_flows.rs # Records and dictionaries through bags of cells
//!     └── matrix_flows.rs# Subtrees, positions, locks, cancellation
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p csm-tests
//! cargo test -p csm-tests integration::matrix_flows
//!
//! # Benchmarks
//! cargo bench -p csm-tests
//! ```

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod integration;
