//! Error types for the document-ID codec.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding document IDs.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A numeric ID too wide for the zero-padded encoding.
    ///
    /// Numeric payloads are padded to a fixed width so that lexicographic
    /// order equals numeric order; values beyond that width would break the
    /// ordering guarantee.
    #[error("numeric id {id} exceeds {max} decimal digits")]
    NumericIdOutOfRange {
        /// The rejected ID value.
        id: u64,
        /// Maximum number of decimal digits.
        max: usize,
    },

    /// A document ID that does not follow the `<type>_<discriminator>_<payload>` grammar.
    #[error("malformed document id: {raw:?}")]
    MalformedDocId {
        /// The offending document ID.
        raw: String,
    },

    /// A document ID carrying a range-bound sentinel discriminator.
    ///
    /// Sentinels only ever appear as range endpoints; a stored document
    /// never has one.
    #[error("document id {raw:?} is a range sentinel, not a stored id")]
    SentinelDocId {
        /// The offending document ID.
        raw: String,
    },
}

impl CodecError {
    /// Creates a malformed-document-ID error.
    pub fn malformed(raw: impl Into<String>) -> Self {
        Self::MalformedDocId { raw: raw.into() }
    }

    /// Creates a sentinel-document-ID error.
    pub fn sentinel(raw: impl Into<String>) -> Self {
        Self::SentinelDocId { raw: raw.into() }
    }
}
