//! In-memory document store for testing.

use crate::document::{Attachment, ChangeRow, DocRow, PutResult, RawDocument};
use crate::error::{StoreError, StoreResult};
use crate::query::{AllDocsOptions, FindRequest};
use crate::store::DocumentStore;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::ops::Bound;

/// An in-memory document store.
///
/// Documents live in a sorted map, so range scans come out in lexicographic
/// ID order for free. Suitable for:
/// - Unit and integration tests
/// - Ephemeral databases that don't need persistence
///
/// Revision tokens are `<generation>-<digest>`; the generation increments on
/// every write including tombstones, and a tombstoned document may be
/// recreated without a revision, continuing the generation sequence.
///
/// # Thread Safety
///
/// The store is thread-safe and can be shared across threads.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    docs: BTreeMap<String, StoredDoc>,
    update_seq: u64,
}

#[derive(Debug, Clone)]
struct StoredDoc {
    rev: String,
    deleted: bool,
    attachments: BTreeMap<String, Attachment>,
    data: Map<String, Value>,
    seq: u64,
}

fn make_rev(id: &str, generation: u64, seq: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hasher.update(generation.to_be_bytes());
    hasher.update(seq.to_be_bytes());
    let digest = hasher.finalize();
    let hex: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();
    format!("{generation}-{hex}")
}

fn generation_of(rev: &str) -> StoreResult<u64> {
    rev.split_once('-')
        .and_then(|(generation, _)| generation.parse().ok())
        .ok_or_else(|| StoreError::invalid_request(format!("malformed revision: {rev}")))
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents, tombstones included.
    #[must_use]
    pub fn doc_count(&self) -> usize {
        self.inner.read().docs.len()
    }

    /// Removes all documents and resets the update sequence.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.docs.clear();
        inner.update_seq = 0;
    }

    fn raw_of(id: &str, stored: &StoredDoc) -> RawDocument {
        RawDocument {
            id: id.to_owned(),
            rev: Some(stored.rev.clone()),
            deleted: stored.deleted,
            attachments: stored.attachments.clone(),
            data: stored.data.clone(),
        }
    }

    fn keyed_rows(inner: &Inner, keys: &[String], include_docs: bool) -> Vec<DocRow> {
        let mut rows = Vec::new();
        for key in keys {
            let Some(stored) = inner.docs.get(key) else {
                continue;
            };
            let doc = (include_docs && !stored.deleted).then(|| Self::raw_of(key, stored));
            rows.push(DocRow {
                id: key.clone(),
                rev: Some(stored.rev.clone()),
                deleted: stored.deleted,
                doc,
            });
        }
        rows
    }
}

impl DocumentStore for InMemoryStore {
    fn put(&self, doc: RawDocument) -> StoreResult<PutResult> {
        let mut inner = self.inner.write();

        let current = inner
            .docs
            .get(&doc.id)
            .map(|stored| (stored.rev.clone(), stored.deleted));

        let next_generation = match (&current, &doc.rev) {
            (None, None) => 1,
            (None, Some(_)) => return Err(StoreError::conflict(doc.id)),
            (Some((head, deleted)), None) => {
                if !deleted {
                    return Err(StoreError::conflict(doc.id));
                }
                // Recreating a tombstoned document continues its history.
                generation_of(head)? + 1
            }
            (Some((head, _)), Some(rev)) => {
                if rev != head {
                    return Err(StoreError::conflict(doc.id));
                }
                generation_of(head)? + 1
            }
        };

        inner.update_seq += 1;
        let seq = inner.update_seq;
        let rev = make_rev(&doc.id, next_generation, seq);
        inner.docs.insert(
            doc.id.clone(),
            StoredDoc {
                rev: rev.clone(),
                deleted: doc.deleted,
                attachments: doc.attachments,
                data: doc.data,
                seq,
            },
        );

        Ok(PutResult { id: doc.id, rev })
    }

    fn get(&self, id: &str) -> StoreResult<RawDocument> {
        let inner = self.inner.read();
        match inner.docs.get(id) {
            None => Err(StoreError::not_found(id)),
            Some(stored) if stored.deleted => Err(StoreError::deleted(id)),
            Some(stored) => Ok(Self::raw_of(id, stored)),
        }
    }

    fn all_docs(&self, options: &AllDocsOptions) -> StoreResult<Vec<DocRow>> {
        if options.key.is_some() && options.keys.is_some() {
            return Err(StoreError::invalid_request(
                "key and keys are mutually exclusive",
            ));
        }

        let inner = self.inner.read();

        if let Some(key) = &options.key {
            return Ok(Self::keyed_rows(
                &inner,
                std::slice::from_ref(key),
                options.include_docs,
            ));
        }
        if let Some(keys) = &options.keys {
            return Ok(Self::keyed_rows(&inner, keys, options.include_docs));
        }

        let start = options
            .startkey
            .as_deref()
            .map_or(Bound::Unbounded, Bound::Included);
        let end = options
            .endkey
            .as_deref()
            .map_or(Bound::Unbounded, Bound::Included);

        let rows = inner
            .docs
            .range::<str, _>((start, end))
            .filter(|(_, stored)| !stored.deleted)
            .skip(options.skip.unwrap_or(0))
            .take(options.limit.unwrap_or(usize::MAX))
            .map(|(id, stored)| DocRow {
                id: id.clone(),
                rev: Some(stored.rev.clone()),
                deleted: false,
                doc: options.include_docs.then(|| Self::raw_of(id, stored)),
            })
            .collect();

        Ok(rows)
    }

    fn find(&self, request: &FindRequest) -> StoreResult<Vec<RawDocument>> {
        let inner = self.inner.read();

        let start = request
            .selector
            .id_above
            .as_deref()
            .map_or(Bound::Unbounded, Bound::Excluded);
        let end = request
            .selector
            .id_below
            .as_deref()
            .map_or(Bound::Unbounded, Bound::Excluded);

        let docs = inner
            .docs
            .range::<str, _>((start, end))
            .filter(|(_, stored)| !stored.deleted)
            .map(|(id, stored)| Self::raw_of(id, stored))
            .filter(|doc| request.selector.matches(doc))
            .take(request.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(docs)
    }

    fn put_attachment(
        &self,
        doc_id: &str,
        name: &str,
        rev: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<PutResult> {
        let mut inner = self.inner.write();

        let head = match inner.docs.get(doc_id) {
            None => return Err(StoreError::not_found(doc_id)),
            Some(stored) if stored.deleted => return Err(StoreError::deleted(doc_id)),
            Some(stored) => stored.rev.clone(),
        };
        if rev != head {
            return Err(StoreError::conflict(doc_id));
        }

        let next_generation = generation_of(&head)? + 1;
        inner.update_seq += 1;
        let seq = inner.update_seq;
        let new_rev = make_rev(doc_id, next_generation, seq);

        let stored = inner.docs.get_mut(doc_id).expect("checked above");
        stored
            .attachments
            .insert(name.to_owned(), Attachment::new(content_type, data));
        stored.rev = new_rev.clone();
        stored.seq = seq;

        Ok(PutResult {
            id: doc_id.to_owned(),
            rev: new_rev,
        })
    }

    fn remove_attachment(&self, doc_id: &str, name: &str, rev: &str) -> StoreResult<PutResult> {
        let mut inner = self.inner.write();

        let head = match inner.docs.get(doc_id) {
            None => return Err(StoreError::not_found(doc_id)),
            Some(stored) if stored.deleted => return Err(StoreError::deleted(doc_id)),
            Some(stored) => {
                if !stored.attachments.contains_key(name) {
                    return Err(StoreError::attachment_not_found(doc_id, name));
                }
                stored.rev.clone()
            }
        };
        if rev != head {
            return Err(StoreError::conflict(doc_id));
        }

        let next_generation = generation_of(&head)? + 1;
        inner.update_seq += 1;
        let seq = inner.update_seq;
        let new_rev = make_rev(doc_id, next_generation, seq);

        let stored = inner.docs.get_mut(doc_id).expect("checked above");
        stored.attachments.remove(name);
        stored.rev = new_rev.clone();
        stored.seq = seq;

        Ok(PutResult {
            id: doc_id.to_owned(),
            rev: new_rev,
        })
    }

    fn get_attachment(&self, doc_id: &str, name: &str) -> StoreResult<Vec<u8>> {
        let inner = self.inner.read();
        match inner.docs.get(doc_id) {
            None => Err(StoreError::not_found(doc_id)),
            Some(stored) if stored.deleted => Err(StoreError::deleted(doc_id)),
            Some(stored) => stored
                .attachments
                .get(name)
                .map(|attachment| attachment.data.clone())
                .ok_or_else(|| StoreError::attachment_not_found(doc_id, name)),
        }
    }

    fn changes(&self) -> StoreResult<Vec<ChangeRow>> {
        let inner = self.inner.read();
        let mut rows: Vec<ChangeRow> = inner
            .docs
            .iter()
            .map(|(id, stored)| ChangeRow {
                seq: stored.seq,
                id: id.clone(),
                rev: stored.rev.clone(),
                deleted: stored.deleted,
            })
            .collect();
        rows.sort_by_key(|row| row.seq);
        Ok(rows)
    }
}
