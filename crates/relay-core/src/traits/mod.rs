//! Core traits defined in `relay-core` and implemented by other crates.

pub mod backend;

pub use backend::RelayBackend;
