//! # reldoc Codec
//!
//! The document-ID codec for reldoc.
//!
//! This crate maps typed entity identifiers to single sortable strings and
//! back. The encoding guarantees that all documents of one storage type form
//! a contiguous, ID-ordered range in any store that sorts document IDs
//! lexicographically, which is what lets the mapping layer answer
//! "all entities of this type" with one range scan.
//!
//! See [`collate`] for the ID grammar and its ordering guarantees.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collate;
mod error;
mod id;

pub use collate::{bound_key, doc_id, split_doc_id, IdBound, MAX_NUMERIC_DIGITS, MAX_NUMERIC_ID};
pub use error::{CodecError, CodecResult};
pub use id::EntityId;
