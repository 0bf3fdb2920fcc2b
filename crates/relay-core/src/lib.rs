//! # relay-core
//!
//! Core crate for the social presence relay. Contains configuration
//! schemas, typed identifiers, the message/notification domain types,
//! the upstream backend trait, and the unified error system.
//!
//! This crate has **no** internal dependencies on other relay crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
