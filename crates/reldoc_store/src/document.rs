//! Document envelope types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A binary attachment on a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// MIME type of the attachment body.
    pub content_type: String,
    /// Attachment body.
    #[serde(default)]
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment.
    pub fn new(content_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// A store-facing document.
///
/// The envelope fields (`_id`, `_rev`, `_deleted`, `_attachments`) carry the
/// store's bookkeeping; everything the mapping layer persists lives under
/// `data`. Serde round-trips through the underscore-prefixed names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    /// Document ID, unique within the store.
    #[serde(rename = "_id")]
    pub id: String,

    /// Head revision; absent on the first write.
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    /// Tombstone marker.
    #[serde(rename = "_deleted", default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,

    /// Named binary attachments.
    #[serde(
        rename = "_attachments",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub attachments: BTreeMap<String, Attachment>,

    /// The document body.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl RawDocument {
    /// Creates an empty live document with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rev: None,
            deleted: false,
            attachments: BTreeMap::new(),
            data: Map::new(),
        }
    }

    /// Sets the revision.
    #[must_use]
    pub fn with_rev(mut self, rev: impl Into<String>) -> Self {
        self.rev = Some(rev.into());
        self
    }

    /// Inserts a field into the document body.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.data.insert(name.into(), value);
        self
    }
}

/// The store's answer to a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutResult {
    /// ID of the written document.
    pub id: String,
    /// The newly assigned head revision.
    pub rev: String,
}

/// One row of an [`crate::DocumentStore::all_docs`] response.
#[derive(Debug, Clone, PartialEq)]
pub struct DocRow {
    /// Document ID.
    pub id: String,
    /// Head revision.
    pub rev: Option<String>,
    /// Whether the head revision is a tombstone.
    pub deleted: bool,
    /// The document body, when requested and the row is live.
    pub doc: Option<RawDocument>,
}

/// One row of a change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRow {
    /// Store-wide update sequence of the change.
    pub seq: u64,
    /// Document ID.
    pub id: String,
    /// Revision written by the change.
    pub rev: String,
    /// Whether the change was a deletion.
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_field_names() {
        let doc = RawDocument::new("post_2_abc")
            .with_rev("1-deadbeef")
            .with_field("title", json!("Hello"));

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["_id"], json!("post_2_abc"));
        assert_eq!(value["_rev"], json!("1-deadbeef"));
        assert_eq!(value["data"]["title"], json!("Hello"));
        assert!(value.get("_deleted").is_none());
        assert!(value.get("_attachments").is_none());
    }

    #[test]
    fn envelope_round_trip() {
        let mut doc = RawDocument::new("post_1_0000000000000001").with_rev("2-cafe");
        doc.attachments
            .insert("file".into(), Attachment::new("text/plain", b"hi".to_vec()));
        doc.data.insert("n".into(), json!(1));

        let text = serde_json::to_string(&doc).unwrap();
        let back: RawDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn tombstone_serializes_deleted_flag() {
        let mut doc = RawDocument::new("post_2_x").with_rev("3-00");
        doc.deleted = true;

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["_deleted"], json!(true));
    }
}
