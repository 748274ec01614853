//! Common utilities for uepak.
//!
//! This crate provides the foundational types used across all uepak crates:
//!
//! - [`BinaryReader`] - Zero-copy little-endian reading from byte slices,
//!   including the engine's length-prefixed string encoding
//! - [`Guid`] - The engine's 128-bit identifier (four 32-bit words)
//! - [`search`] - Byte pattern searching used to locate trailing records

mod error;
mod guid;
mod reader;

pub mod search;

pub use error::{Error, Result};
pub use guid::Guid;
pub use reader::BinaryReader;

/// Re-export memchr for SIMD-accelerated byte searching
pub use memchr;
