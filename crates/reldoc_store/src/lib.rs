//! # reldoc Store
//!
//! The document-store contract consumed by the reldoc mapping layer.
//!
//! This crate provides:
//! - [`DocumentStore`] - the narrow trait the mapping layer depends on:
//!   revisioned puts, point gets, sorted range scans, a secondary-index
//!   equality query, attachments, and a change feed
//! - The document envelope types ([`RawDocument`], [`Attachment`]) and the
//!   query option types ([`AllDocsOptions`], [`FindRequest`], [`Selector`])
//! - [`InMemoryStore`] - a reference implementation for tests and ephemeral
//!   databases
//!
//! The mapping layer never interprets store internals; everything it needs
//! is expressed through this contract, so any revisioned document store with
//! lexicographically sorted IDs can sit underneath it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod error;
mod memory;
mod query;
mod store;

pub use document::{Attachment, ChangeRow, DocRow, PutResult, RawDocument};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use query::{AllDocsOptions, FindRequest, Selector};
pub use store::DocumentStore;
