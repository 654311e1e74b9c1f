//! CSM-Inspect: command-line access to the codec and the matrix model
//!
//! Every command returns a `serde_json::Value`; `main` only parses
//! arguments and prints.

pub mod commands;

pub use commands::{address_info, build_message, decode, demo_matrix, BuildArgs, DecodeKind};
