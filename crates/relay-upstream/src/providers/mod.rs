//! Backend provider implementations.

pub mod http;
pub mod memory;
