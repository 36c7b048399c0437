//! Entity ↔ document transformation.
//!
//! [`to_raw_doc`] flattens a relational entity into its storable form:
//! belongs-to references become bare foreign keys, has-many references
//! become foreign-key arrays, and the revision/attachments move into the
//! document envelope. [`from_raw_doc`] is the inverse. Embedded related
//! objects are never stored — only their keys survive the flattening.

use crate::entity::Entity;
use crate::error::RelResult;
use crate::schema::{RelationKind, TypeInfo};
use reldoc_codec::{doc_id, split_doc_id, EntityId};
use reldoc_store::RawDocument;
use serde_json::Value;

/// Flattens an entity into a storable document under `id`.
pub(crate) fn to_raw_doc(info: &TypeInfo, id: &EntityId, entity: &Entity) -> RelResult<RawDocument> {
    let mut data = entity.fields.clone();

    for relation in &info.relations {
        match relation.kind {
            RelationKind::BelongsTo => {
                // An embedded object collapses to its own ID.
                let embedded_id = data
                    .get(&relation.field)
                    .and_then(|value| value.get("id").cloned());
                if let Some(embedded_id) = embedded_id {
                    data.insert(relation.field.clone(), embedded_id);
                }
            }
            RelationKind::HasMany => {
                if relation.query_inverse.is_some() {
                    // Derivable by the inverse query; never stored.
                    data.remove(&relation.field);
                    continue;
                }
                let keys: Vec<Value> = match data.get(&relation.field) {
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(|item| item.get("id").cloned().unwrap_or_else(|| item.clone()))
                        .collect(),
                    _ => Vec::new(),
                };
                data.insert(relation.field.clone(), Value::Array(keys));
            }
        }
    }

    Ok(RawDocument {
        id: doc_id(&info.document_type, id)?,
        rev: entity.rev.clone(),
        deleted: false,
        attachments: entity.attachments.clone(),
        data,
    })
}

/// Lifts a stored document back into an entity.
pub(crate) fn from_raw_doc(doc: RawDocument) -> RelResult<Entity> {
    let id = split_doc_id(&doc.id)?.1;
    Ok(Entity {
        id: Some(id),
        rev: doc.rev,
        attachments: doc.attachments,
        fields: doc.data,
    })
}
