//! Error types for the mapping layer.

use reldoc_codec::{CodecError, EntityId};
use reldoc_store::StoreError;
use thiserror::Error;

/// Result type for mapping-layer operations.
pub type RelResult<T> = Result<T, RelError>;

/// Errors that can occur in mapping-layer operations.
///
/// Schema errors surface synchronously at compile time, before any store
/// I/O. Store errors pass through unwrapped; the layer adds no retries and
/// swallows nothing.
#[derive(Debug, Error)]
pub enum RelError {
    /// A type name that resolves to no registered singular or plural.
    #[error("unknown entity type: {name:?}")]
    UnknownType {
        /// The unresolved name.
        name: String,
    },

    /// A `relations` map that is present but empty.
    ///
    /// Declaring relations and listing none signals a caller mistake, so it
    /// is rejected rather than treated as "no relations".
    #[error("invalid relations for type {type_name:?}: the relations map is empty")]
    EmptyRelations {
        /// The offending type's singular name.
        type_name: String,
    },

    /// A relation whose target resolves to no registered type.
    #[error("unknown related type {target:?} in relation {type_name}.{field}")]
    UnknownRelatedType {
        /// The owning type's singular name.
        type_name: String,
        /// The relation field.
        field: String,
        /// The unresolved target name.
        target: String,
    },

    /// A relation declaration that is structurally invalid.
    #[error("invalid relation {type_name}.{field}: {message}")]
    InvalidRelation {
        /// The owning type's singular name.
        type_name: String,
        /// The relation field.
        field: String,
        /// Description of the problem.
        message: String,
    },

    /// A singular or plural name registered by two schema entries.
    #[error("duplicate type name {name:?} in schema")]
    DuplicateTypeName {
        /// The colliding name.
        name: String,
    },

    /// An operation that needs an entity ID got an entity without one.
    #[error("entity has no id")]
    MissingId,

    /// An operation that needs the current revision got an entity without one.
    #[error("entity {id} has no revision")]
    MissingRevision {
        /// The entity's ID.
        id: EntityId,
    },

    /// Document-ID codec failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Store failure, passed through unmodified.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RelError {
    /// Creates an unknown-type error.
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    /// Creates an invalid-relation error.
    pub fn invalid_relation(
        type_name: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidRelation {
            type_name: type_name.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// The HTTP-equivalent status code of this error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::UnknownType { .. }
            | Self::EmptyRelations { .. }
            | Self::UnknownRelatedType { .. }
            | Self::InvalidRelation { .. }
            | Self::DuplicateTypeName { .. }
            | Self::MissingId
            | Self::MissingRevision { .. }
            | Self::Codec(_) => 400,
            Self::Store(err) => match err {
                StoreError::Conflict { .. } => 409,
                StoreError::NotFound { .. }
                | StoreError::Deleted { .. }
                | StoreError::AttachmentNotFound { .. } => 404,
                StoreError::InvalidRequest { .. } => 400,
                StoreError::Backend { .. } => 500,
            },
        }
    }

    /// Whether the caller, not the store, is at fault.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_is_a_client_error() {
        let err = RelError::unknown_type("gizmo");
        assert_eq!(err.status(), 400);
        assert!(err.is_client_error());
    }

    #[test]
    fn conflicts_map_to_409() {
        let err = RelError::from(StoreError::conflict("post_2_a"));
        assert_eq!(err.status(), 409);
        assert!(err.is_client_error());
    }

    #[test]
    fn backend_failures_are_server_errors() {
        let err = RelError::from(StoreError::backend("connection reset"));
        assert_eq!(err.status(), 500);
        assert!(!err.is_client_error());
    }
}
