//! Error types for the protowalk-core library.
//!
//! Every failure the decoder can report carries an absolute byte offset into
//! the buffer handed to the top-level decode call, so a caller can point at
//! the first malformed byte regardless of how deeply it was nested.

use thiserror::Error;

/// Result type alias for protowalk operations
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Why decoding stopped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// The buffer ended before a header, value or payload was complete
    #[error("buffer too short")]
    Truncated,

    /// A field header decoded to tag number 0
    #[error("invalid tag 0 (wire type {wire_type})")]
    InvalidTag {
        /// Wire type bits of the offending header
        wire_type: u8,
    },

    /// Group encoding or a wire type outside the defined range
    #[error("unsupported wire type {wire_type} for tag {tag}")]
    UnsupportedWireType {
        /// Tag number of the offending header
        tag: u32,
        /// Wire type bits of the offending header
        wire_type: u8,
    },

    /// A varint ran past 10 bytes
    #[error("varint exceeds 64 bits")]
    VarintOverflow,

    /// Messages nested deeper than the configured limit
    #[error("nesting exceeds recursion limit of {limit}")]
    RecursionLimit {
        /// The configured limit
        limit: usize,
    },
}

/// A decoding failure at an absolute offset of the input buffer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("incomplete proto at offset {offset}: {kind}")]
pub struct DecodeError {
    /// Byte offset into the top-level input
    pub offset: usize,
    /// What went wrong there
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    /// Creates a new decode error
    pub fn new(offset: usize, kind: DecodeErrorKind) -> Self {
        Self { offset, kind }
    }

    /// Creates a truncation error
    pub fn truncated(offset: usize) -> Self {
        Self::new(offset, DecodeErrorKind::Truncated)
    }

    /// Returns true if the input simply ran out, as opposed to being malformed.
    ///
    /// Varint overflow counts as malformed: no amount of extra input fixes it.
    pub fn is_truncation(&self) -> bool {
        matches!(self.kind, DecodeErrorKind::Truncated)
    }
}

/// A Wire Reader failure, positioned relative to the slice it was reading.
///
/// The walker lifts this into a [`DecodeError`] by adding the absolute
/// position of that slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireError {
    /// Offset within the local slice where decoding gave up
    pub offset: usize,
    /// What went wrong there
    pub kind: DecodeErrorKind,
}

impl WireError {
    pub(crate) fn new(offset: usize, kind: DecodeErrorKind) -> Self {
        Self { offset, kind }
    }

    /// Translates into an absolute error, given where the local slice starts
    pub fn at(self, base: usize) -> DecodeError {
        DecodeError::new(base + self.offset, self.kind)
    }
}
