//! # reldoc Core
//!
//! Relational entity mapping and graph resolution over revisioned document
//! stores.
//!
//! Callers declare typed entities with singular/plural names and
//! relationships, then work with plain records while this crate:
//! - encodes/decodes entities to/from documents keyed by a collatable
//!   composite document ID
//! - resolves related entities across declared edges with batched,
//!   deduplicated fetches that terminate on cyclic graphs
//! - scopes deletion and attachment operations to the schema
//!
//! The document store underneath is anything implementing
//! [`reldoc_store::DocumentStore`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use reldoc_core::{Entity, RelDatabase, RelationSpec, Schema, TypeDef};
//! use reldoc_store::InMemoryStore;
//! use serde_json::json;
//!
//! let schema = Schema::compile(vec![
//!     TypeDef::new("author", "authors")
//!         .relation("books", RelationSpec::has_many("book")),
//!     TypeDef::new("book", "books")
//!         .relation("author", RelationSpec::belongs_to("author")),
//! ])?;
//! let db = RelDatabase::new(InMemoryStore::new(), schema);
//!
//! db.save("author", Entity::with_id("king")
//!     .field("name", json!("Stephen King"))
//!     .field("books", json!(["it"])))?;
//! db.save("book", Entity::with_id("it")
//!     .field("title", json!("It"))
//!     .field("author", json!("king")))?;
//!
//! // One call materializes the author and every reachable book.
//! let bundle = db.find_all("author")?;
//! assert_eq!(bundle.get("authors").len(), 1);
//! assert_eq!(bundle.get("books").len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod entity;
mod error;
mod resolver;
mod schema;
mod transform;

pub use config::RelConfig;
pub use database::{ParsedDocId, RelDatabase};
pub use entity::{Bundle, Entity};
pub use error::{RelError, RelResult};
pub use resolver::{FindSpec, RangeSpec};
pub use schema::{
    Relation, RelationKind, RelationOptions, RelationSpec, Schema, TargetRef, TypeDef, TypeInfo,
};

pub use reldoc_codec::EntityId;
pub use reldoc_store::{Attachment, DocumentStore, RawDocument};
