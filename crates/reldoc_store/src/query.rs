//! Query option types.

use crate::document::RawDocument;
use serde_json::Value;

/// Options for a sorted range scan over document IDs.
///
/// Exactly one query shape applies, checked in this order: `key`, `keys`,
/// otherwise the `startkey`/`endkey` range (both inclusive, both optional).
/// `limit` and `skip` apply to range scans only.
#[derive(Debug, Clone, Default)]
pub struct AllDocsOptions {
    /// Return document bodies inline, not just row metadata.
    pub include_docs: bool,
    /// Point lookup of a single document ID.
    pub key: Option<String>,
    /// Batched lookup of several document IDs, in the given order.
    pub keys: Option<Vec<String>>,
    /// Inclusive lower bound of the ID range.
    pub startkey: Option<String>,
    /// Inclusive upper bound of the ID range.
    pub endkey: Option<String>,
    /// Maximum number of rows to return.
    pub limit: Option<usize>,
    /// Number of leading rows to drop.
    pub skip: Option<usize>,
}

impl AllDocsOptions {
    /// Creates options for a full scan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests document bodies inline.
    #[must_use]
    pub const fn include_docs(mut self, value: bool) -> Self {
        self.include_docs = value;
        self
    }

    /// Sets a single-key lookup.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets a multi-key lookup.
    #[must_use]
    pub fn keys(mut self, keys: Vec<String>) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Sets the inclusive lower bound.
    #[must_use]
    pub fn startkey(mut self, key: impl Into<String>) -> Self {
        self.startkey = Some(key.into());
        self
    }

    /// Sets the inclusive upper bound.
    #[must_use]
    pub fn endkey(mut self, key: impl Into<String>) -> Self {
        self.endkey = Some(key.into());
        self
    }

    /// Sets the row limit.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of leading rows to drop.
    #[must_use]
    pub const fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }
}

/// A secondary-index query.
#[derive(Debug, Clone, Default)]
pub struct FindRequest {
    /// The documents to match.
    pub selector: Selector,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl FindRequest {
    /// Creates a request from a selector.
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            limit: None,
        }
    }

    /// Sets the document limit.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A conjunction of document predicates.
///
/// Carries an exclusive document-ID window plus dotted-path equality
/// filters. Paths are rooted at the document body (`data.<field>` and
/// deeper); equality is exact, with no implicit array traversal. Stores with
/// their own query planners translate this into their native selector form;
/// [`Selector::matches`] is the reference semantics.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    /// Exclusive lower bound on the document ID.
    pub id_above: Option<String>,
    /// Exclusive upper bound on the document ID.
    pub id_below: Option<String>,
    /// Dotted-path equality predicates, all of which must hold.
    pub equals: Vec<(String, Value)>,
}

impl Selector {
    /// Creates an empty selector matching every live document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the document ID to sort strictly above `key`.
    #[must_use]
    pub fn id_above(mut self, key: impl Into<String>) -> Self {
        self.id_above = Some(key.into());
        self
    }

    /// Requires the document ID to sort strictly below `key`.
    #[must_use]
    pub fn id_below(mut self, key: impl Into<String>) -> Self {
        self.id_below = Some(key.into());
        self
    }

    /// Requires the field at `path` to equal `value` exactly.
    #[must_use]
    pub fn field_equals(mut self, path: impl Into<String>, value: Value) -> Self {
        self.equals.push((path.into(), value));
        self
    }

    /// Evaluates this selector against a document.
    #[must_use]
    pub fn matches(&self, doc: &RawDocument) -> bool {
        if let Some(above) = &self.id_above {
            if doc.id.as_str() <= above.as_str() {
                return false;
            }
        }
        if let Some(below) = &self.id_below {
            if doc.id.as_str() >= below.as_str() {
                return false;
            }
        }
        self.equals
            .iter()
            .all(|(path, expected)| lookup(doc, path) == Some(expected))
    }
}

/// Resolves a dotted path rooted at the document body.
fn lookup<'a>(doc: &'a RawDocument, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    if segments.next() != Some("data") {
        return None;
    }
    let mut value = doc.data.get(segments.next()?)?;
    for segment in segments {
        value = value.get(segment)?;
    }
    Some(value)
}
