//! Document store trait definition.

use crate::document::{ChangeRow, DocRow, PutResult, RawDocument};
use crate::error::StoreResult;
use crate::query::{AllDocsOptions, FindRequest};
use std::sync::Arc;

/// A revisioned document store.
///
/// This is the complete contract the mapping layer depends on. Implementors
/// must provide:
///
/// - documents keyed by unique string IDs, scanned in lexicographic ID order
/// - optimistic concurrency through opaque revision tokens: a write must
///   carry the current head revision or fail with a conflict
/// - tombstones that are distinguishable from never-written IDs
/// - an equality query over document fields (used for inverse relations;
///   typically backed by a secondary index declared out of band)
///
/// All methods take `&self`; implementations synchronize internally.
pub trait DocumentStore: Send + Sync {
    /// Writes a document, enforcing revision-based optimistic concurrency.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Conflict`] when the supplied revision
    /// does not match the stored head, is missing for an existing live
    /// document, or is supplied for a document that does not exist.
    fn put(&self, doc: RawDocument) -> StoreResult<PutResult>;

    /// Reads the head revision of a document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::NotFound`] if the ID was never written
    /// and [`crate::StoreError::Deleted`] if the head is a tombstone.
    fn get(&self, id: &str) -> StoreResult<RawDocument>;

    /// Scans documents in lexicographic ID order.
    ///
    /// Range scans omit tombstones. Explicit `key`/`keys` lookups return
    /// tombstone rows flagged `deleted` with no body, and omit rows for IDs
    /// that were never written.
    fn all_docs(&self, options: &AllDocsOptions) -> StoreResult<Vec<DocRow>>;

    /// Queries live documents by field equality.
    fn find(&self, request: &FindRequest) -> StoreResult<Vec<RawDocument>>;

    /// Writes an attachment, bumping the document revision.
    ///
    /// # Errors
    ///
    /// Returns a conflict on a stale revision.
    fn put_attachment(
        &self,
        doc_id: &str,
        name: &str,
        rev: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<PutResult>;

    /// Removes an attachment, bumping the document revision.
    fn remove_attachment(&self, doc_id: &str, name: &str, rev: &str) -> StoreResult<PutResult>;

    /// Reads an attachment body.
    fn get_attachment(&self, doc_id: &str, name: &str) -> StoreResult<Vec<u8>>;

    /// Returns the latest change per document, ordered by update sequence.
    fn changes(&self) -> StoreResult<Vec<ChangeRow>>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn put(&self, doc: RawDocument) -> StoreResult<PutResult> {
        (**self).put(doc)
    }

    fn get(&self, id: &str) -> StoreResult<RawDocument> {
        (**self).get(id)
    }

    fn all_docs(&self, options: &AllDocsOptions) -> StoreResult<Vec<DocRow>> {
        (**self).all_docs(options)
    }

    fn find(&self, request: &FindRequest) -> StoreResult<Vec<RawDocument>> {
        (**self).find(request)
    }

    fn put_attachment(
        &self,
        doc_id: &str,
        name: &str,
        rev: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<PutResult> {
        (**self).put_attachment(doc_id, name, rev, data, content_type)
    }

    fn remove_attachment(&self, doc_id: &str, name: &str, rev: &str) -> StoreResult<PutResult> {
        (**self).remove_attachment(doc_id, name, rev)
    }

    fn get_attachment(&self, doc_id: &str, name: &str) -> StoreResult<Vec<u8>> {
        (**self).get_attachment(doc_id, name)
    }

    fn changes(&self) -> StoreResult<Vec<ChangeRow>> {
        (**self).changes()
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    fn put(&self, doc: RawDocument) -> StoreResult<PutResult> {
        (**self).put(doc)
    }

    fn get(&self, id: &str) -> StoreResult<RawDocument> {
        (**self).get(id)
    }

    fn all_docs(&self, options: &AllDocsOptions) -> StoreResult<Vec<DocRow>> {
        (**self).all_docs(options)
    }

    fn find(&self, request: &FindRequest) -> StoreResult<Vec<RawDocument>> {
        (**self).find(request)
    }

    fn put_attachment(
        &self,
        doc_id: &str,
        name: &str,
        rev: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<PutResult> {
        (**self).put_attachment(doc_id, name, rev, data, content_type)
    }

    fn remove_attachment(&self, doc_id: &str, name: &str, rev: &str) -> StoreResult<PutResult> {
        (**self).remove_attachment(doc_id, name, rev)
    }

    fn get_attachment(&self, doc_id: &str, name: &str) -> StoreResult<Vec<u8>> {
        (**self).get_attachment(doc_id, name)
    }

    fn changes(&self) -> StoreResult<Vec<ChangeRow>> {
        (**self).changes()
    }
}
