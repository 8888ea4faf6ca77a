//! Top-level decoding entry points and their configuration.

use tracing::debug;

use super::walker::Scope;
use super::{File, FileSet};
use crate::error::{DecodeError, Result};

/// Default maximum message nesting depth, matching prost's own limit
pub const DEFAULT_RECURSION_LIMIT: usize = 100;

/// Configuration for the decoder
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Maximum depth of nested message types before decoding fails
    pub recursion_limit: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl DecoderConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum message nesting depth
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }
}

/// Outcome of a top-level decode that keeps its prefix on failure.
///
/// Files are all-or-nothing: a file with any malformed byte inside it is
/// dropped, but every file decoded before it is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded<'a> {
    /// Files decoded before decoding stopped
    pub files: FileSet<'a>,
    /// Why decoding stopped early, if it did
    pub error: Option<DecodeError>,
}

impl<'a> Decoded<'a> {
    /// Returns true if the whole input was consumed
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Converts into a strict result, discarding the prefix on failure
    pub fn into_result(self) -> Result<FileSet<'a>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.files),
        }
    }
}

/// Decoder for serialized descriptor sets
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Creates a new decoder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new decoder with custom configuration
    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    fn scope(&self) -> Scope {
        Scope::root(self.config.recursion_limit)
    }

    /// Decodes a `FileDescriptorSet`, keeping the files decoded before any failure
    pub fn decode_partial<'a>(&self, data: &'a [u8]) -> Decoded<'a> {
        debug!("Decoding descriptor set of {} bytes", data.len());

        let mut files = FileSet::default();
        let error = self.scope().walk_into(&mut files, data, 0).err();

        match &error {
            Some(err) => debug!(
                "Decoding stopped after {} file(s): {}",
                files.len(),
                err
            ),
            None => debug!("Decoded {} file(s)", files.len()),
        }

        Decoded { files, error }
    }

    /// Decodes a `FileDescriptorSet`, failing on any malformed byte
    pub fn decode<'a>(&self, data: &'a [u8]) -> Result<FileSet<'a>> {
        self.decode_partial(data).into_result()
    }

    /// Decodes a single `FileDescriptorProto`
    pub fn decode_file<'a>(&self, data: &'a [u8]) -> Result<File<'a>> {
        let mut file = File::default();
        self.scope().walk_into(&mut file, data, 0)?;
        Ok(file)
    }
}
