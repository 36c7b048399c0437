//! # reldoc Testkit
//!
//! Test utilities for reldoc.
//!
//! This crate provides:
//! - Schema fixtures and seeded databases for common relational shapes
//!   (blogs, cyclic references, many-to-many graphs)
//! - Property-based test generators using proptest
//! - The cross-crate integration test suite, under `tests/`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use reldoc_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_graph() {
//!     let db = publisher_graph_db();
//!     let bundle = db.find_all("author").unwrap();
//!     assert_eq!(bundle.get("authors").len(), 4);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
