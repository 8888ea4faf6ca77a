//! # protowalk-core
//!
//! A decoder for serialized protobuf descriptor sets that works directly on
//! the wire format: no generated code, no reflection, one forward pass.
//!
//! This crate provides:
//! - A wire reader that decodes one field at a time, handing out
//!   length-delimited payloads as views into the input
//! - A recursive walker that builds a file/message/field tree from those
//!   fields, skipping everything it does not recognize
//! - Renderers and a bridge to `prost-types` for the decoded tree
//!
//! ## Architecture
//!
//! - [`wire`]: Field header and value decoding
//! - [`descriptor`]: The decoded tree and the walker that builds it
//! - [`render`]: Outline and statistics renderers
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use protowalk_core::Decoder;
//! use std::fs;
//!
//! let data = fs::read("descriptors.pb")?;
//!
//! let decoded = Decoder::new().decode_partial(&data);
//! for file in &decoded.files {
//!     println!("{} ({} messages)", file.name, file.message_count());
//! }
//! if let Some(err) = decoded.error {
//!     eprintln!("stopped early: {}", err);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Borrowing
//!
//! Decoded strings borrow from the input buffer when they are valid UTF-8.
//! Use `into_owned()` on any entity to keep it past the buffer's lifetime.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

mod convert;
pub mod descriptor;
pub mod error;
pub mod render;
pub mod wire;

#[cfg(test)]
mod testutil;

// Re-export primary types for convenience
pub use descriptor::{Decoded, Decoder, DecoderConfig, Field, File, FileSet, Message};
pub use error::{DecodeError, DecodeErrorKind, Result};
pub use prost_types::field_descriptor_proto::{Label, Type};
pub use render::{DescriptorVisitor, OutlineWriter, Stats};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum valid protobuf field number (2^29 - 1)
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;
