//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in document-store operations.
///
/// `NotFound` and `Deleted` are deliberately distinct: callers need to tell
/// "this document was tombstoned" apart from "this ID was never written".
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document was ever written under this ID.
    #[error("document not found: {id}")]
    NotFound {
        /// The requested document ID.
        id: String,
    },

    /// The document's head revision is a tombstone.
    #[error("document is deleted: {id}")]
    Deleted {
        /// The requested document ID.
        id: String,
    },

    /// The supplied revision does not match the stored head revision.
    #[error("revision conflict on document {id}")]
    Conflict {
        /// The document ID the write targeted.
        id: String,
    },

    /// The named attachment does not exist on the document.
    #[error("attachment {name:?} not found on document {id}")]
    AttachmentNotFound {
        /// The document ID.
        id: String,
        /// The attachment name.
        name: String,
    },

    /// The request itself is malformed.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },

    /// A failure in the backing store or its transport.
    #[error("backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a deleted-document error.
    pub fn deleted(id: impl Into<String>) -> Self {
        Self::Deleted { id: id.into() }
    }

    /// Creates a revision-conflict error.
    pub fn conflict(id: impl Into<String>) -> Self {
        Self::Conflict { id: id.into() }
    }

    /// Creates an attachment-not-found error.
    pub fn attachment_not_found(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::AttachmentNotFound {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Creates an invalid-request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
