//! Caller-facing entity records and result bundles.

use reldoc_codec::EntityId;
use reldoc_store::Attachment;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A caller-facing relational record.
///
/// An entity is an open record: `id` and `rev` are lifted out of the field
/// map, everything else — declared relation fields and arbitrary extras —
/// lives in `fields` as plain JSON values. A belongs-to field holds a
/// foreign key (or an embedded object carrying its own `id`); a has-many
/// field holds an array of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    /// The entity's ID; `None` before the first save, when the layer
    /// generates one.
    pub id: Option<EntityId>,
    /// Opaque revision token; `None` before the first save.
    pub rev: Option<String>,
    /// Named binary attachments.
    pub attachments: BTreeMap<String, Attachment>,
    /// All other fields.
    pub fields: Map<String, Value>,
}

impl Entity {
    /// Creates an empty entity with no ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty entity with the given ID.
    pub fn with_id(id: impl Into<EntityId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Sets a field, builder style.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Sets a field in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Reads a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Converts a JSON value to an entity ID, if it is a number or string.
pub(crate) fn id_from_value(value: &Value) -> Option<EntityId> {
    match value {
        Value::Number(n) => n.as_u64().map(EntityId::Number),
        Value::String(s) => Some(EntityId::Text(s.clone())),
        _ => None,
    }
}

/// Converts an entity ID to its JSON field representation.
pub(crate) fn id_to_value(id: &EntityId) -> Value {
    match id {
        EntityId::Number(n) => Value::from(*n),
        EntityId::Text(s) => Value::from(s.as_str()),
    }
}

/// A resolved multi-type result.
///
/// Each reachable type contributes one list, keyed by the type's plural
/// name. The seed type's key is always present, even when no documents
/// matched. Lists are in fetch order by default; see
/// [`crate::RelConfig::sort_results`] for ID-sorted lists — ordering is a
/// documented choice here, not a contract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bundle {
    lists: BTreeMap<String, Vec<Entity>>,
}

impl Bundle {
    /// The entities of one type, by plural name; empty when absent.
    #[must_use]
    pub fn get(&self, plural: &str) -> &[Entity] {
        self.lists.get(plural).map_or(&[], Vec::as_slice)
    }

    /// Whether the bundle carries a list for `plural`.
    #[must_use]
    pub fn contains(&self, plural: &str) -> bool {
        self.lists.contains_key(plural)
    }

    /// Iterates over `(plural name, entities)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Entity])> {
        self.lists
            .iter()
            .map(|(plural, list)| (plural.as_str(), list.as_slice()))
    }

    /// Consumes the bundle into its underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Vec<Entity>> {
        self.lists
    }

    pub(crate) fn insert_list(&mut self, plural: String, list: Vec<Entity>) {
        self.lists.insert(plural, list);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_sets_fields() {
        let entity = Entity::with_id(42u64)
            .field("title", json!("Rails is Omakase"))
            .field("text", json!("..."));
        assert_eq!(entity.id, Some(EntityId::Number(42)));
        assert_eq!(entity.get("title"), Some(&json!("Rails is Omakase")));
        assert_eq!(entity.get("missing"), None);
    }

    #[test]
    fn id_value_conversions() {
        assert_eq!(id_from_value(&json!(7)), Some(EntityId::Number(7)));
        assert_eq!(id_from_value(&json!("x")), Some(EntityId::from("x")));
        assert_eq!(id_from_value(&json!(null)), None);
        assert_eq!(id_from_value(&json!({"id": 1})), None);
        assert_eq!(id_from_value(&json!(-1)), None);

        assert_eq!(id_to_value(&EntityId::Number(7)), json!(7));
        assert_eq!(id_to_value(&EntityId::from("x")), json!("x"));
    }

    #[test]
    fn bundle_get_is_total() {
        let mut bundle = Bundle::default();
        bundle.insert_list("posts".into(), vec![Entity::with_id(1u64)]);
        assert_eq!(bundle.get("posts").len(), 1);
        assert!(bundle.get("authors").is_empty());
        assert!(bundle.contains("posts"));
        assert!(!bundle.contains("authors"));
    }
}
