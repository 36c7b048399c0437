//! Relational database facade.

use crate::config::RelConfig;
use crate::entity::{Bundle, Entity};
use crate::error::{RelError, RelResult};
use crate::resolver::{FindSpec, Resolver};
use crate::schema::Schema;
use crate::transform;
use reldoc_codec::{doc_id, split_doc_id, EntityId};
use reldoc_store::{DocumentStore, RawDocument, StoreError};
use tracing::debug;
use uuid::Uuid;

/// A stored document ID decomposed into its logical parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocId {
    /// The entity type name the ID belongs to.
    pub type_name: String,
    /// The entity's ID.
    pub id: EntityId,
}

/// The relational mapping facade over a document store.
///
/// A handle owns the store, a compiled [`Schema`], and a [`RelConfig`].
/// Every operation accepts type names in singular or plural form.
///
/// # Example
///
/// ```rust,ignore
/// use reldoc_core::{Entity, RelDatabase, RelationSpec, Schema, TypeDef};
/// use reldoc_store::InMemoryStore;
/// use serde_json::json;
///
/// let schema = Schema::compile(vec![
///     TypeDef::new("post", "posts"),
/// ])?;
/// let db = RelDatabase::new(InMemoryStore::new(), schema);
///
/// let saved = db.save("post", Entity::new().field("title", json!("Rails is Omakase")))?;
/// let found = db.find_one("post", saved.id.clone().unwrap())?;
/// assert_eq!(found.get("posts")[0].get("title"), Some(&json!("Rails is Omakase")));
/// ```
pub struct RelDatabase<S: DocumentStore> {
    store: S,
    schema: Schema,
    config: RelConfig,
}

impl<S: DocumentStore> RelDatabase<S> {
    /// Creates a handle with the default configuration.
    pub fn new(store: S, schema: Schema) -> Self {
        Self::with_config(store, schema, RelConfig::default())
    }

    /// Creates a handle with an explicit configuration.
    pub fn with_config(store: S, schema: Schema, config: RelConfig) -> Self {
        Self {
            store,
            schema,
            config,
        }
    }

    /// The compiled schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The handle's configuration.
    pub fn config(&self) -> &RelConfig {
        &self.config
    }

    /// Generates a collision-resistant random entity ID.
    ///
    /// Used for entities saved without one; exposed for callers who assign
    /// IDs up front.
    #[must_use]
    pub fn generate_id(&self) -> EntityId {
        EntityId::Text(Uuid::new_v4().simple().to_string())
    }

    /// Saves an entity, returning a copy with the store-assigned `id` and
    /// `rev` merged on.
    ///
    /// # Errors
    ///
    /// Surfaces the store's revision conflict when `rev` is stale, or
    /// missing for an existing document. Conflicts are never resolved here.
    pub fn save(&self, type_name: &str, entity: Entity) -> RelResult<Entity> {
        let info = self.schema.type_info(type_name)?;
        let id = match &entity.id {
            Some(id) => id.clone(),
            None => self.generate_id(),
        };
        let doc = transform::to_raw_doc(info, &id, &entity)?;
        debug!(doc_id = %doc.id, "saving entity");
        let result = self.store.put(doc)?;

        let stored_id = split_doc_id(&result.id)?.1;
        let mut saved = entity;
        saved.id = Some(stored_id);
        saved.rev = Some(result.rev);
        Ok(saved)
    }

    /// Deletes an entity by writing a bare tombstone.
    ///
    /// The tombstone carries no data fields so it stays compatible with
    /// filtered replication in the underlying store.
    pub fn del(&self, type_name: &str, entity: &Entity) -> RelResult<()> {
        let info = self.schema.type_info(type_name)?;
        let id = entity.id.as_ref().ok_or(RelError::MissingId)?;

        let mut tombstone = RawDocument::new(doc_id(&info.document_type, id)?);
        tombstone.rev = entity.rev.clone();
        tombstone.deleted = true;
        debug!(doc_id = %tombstone.id, "deleting entity");
        self.store.put(tombstone)?;
        Ok(())
    }

    /// Finds entities of one type and resolves every reachable non-lazy
    /// relation into the returned [`Bundle`].
    pub fn find(&self, type_name: &str, spec: impl Into<FindSpec>) -> RelResult<Bundle> {
        let singular = self.schema.type_info(type_name)?.singular.clone();
        Resolver::new(&self.store, &self.schema, &self.config).run_query(singular, spec.into())
    }

    /// Finds every entity of a type.
    pub fn find_all(&self, type_name: &str) -> RelResult<Bundle> {
        self.find(type_name, FindSpec::All)
    }

    /// Finds one entity by ID.
    pub fn find_one(&self, type_name: &str, id: impl Into<EntityId>) -> RelResult<Bundle> {
        self.find(type_name, FindSpec::Id(id.into()))
    }

    /// Finds several entities by ID in one batch.
    pub fn find_many(&self, type_name: &str, ids: Vec<EntityId>) -> RelResult<Bundle> {
        self.find(type_name, FindSpec::Ids(ids))
    }

    /// Queries the "many" side of an inverse relation directly: entities of
    /// `type_name` whose `foreign_key` field holds `owner`'s ID.
    pub fn find_has_many(
        &self,
        type_name: &str,
        foreign_key: &str,
        owner: impl Into<EntityId>,
    ) -> RelResult<Bundle> {
        let singular = self.schema.type_info(type_name)?.singular.clone();
        Resolver::new(&self.store, &self.schema, &self.config).run_inverse(
            singular,
            foreign_key.to_owned(),
            owner.into(),
        )
    }

    /// Hydrates relations starting from externally obtained documents, e.g.
    /// the results of an ad hoc secondary-index query.
    pub fn parse_rel_docs(&self, type_name: &str, docs: Vec<RawDocument>) -> RelResult<Bundle> {
        let singular = self.schema.type_info(type_name)?.singular.clone();
        Resolver::new(&self.store, &self.schema, &self.config).run_docs(singular, docs)
    }

    /// Whether the entity is deleted.
    ///
    /// Three-valued: `Some(true)` when the document is tombstoned,
    /// `Some(false)` when it is live, `None` when no document for the ID
    /// was ever written.
    pub fn is_deleted(&self, type_name: &str, id: &EntityId) -> RelResult<Option<bool>> {
        let info = self.schema.type_info(type_name)?;
        match self.store.get(&doc_id(&info.document_type, id)?) {
            Ok(_) => Ok(Some(false)),
            Err(StoreError::Deleted { .. }) => Ok(Some(true)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes an attachment on an entity's document and returns the new
    /// revision.
    ///
    /// The entity must carry its current `rev`; the facade does not refetch
    /// on a conflict.
    pub fn put_attachment(
        &self,
        type_name: &str,
        entity: &Entity,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> RelResult<String> {
        let (document_id, rev) = self.attachment_target(type_name, entity)?;
        let result = self
            .store
            .put_attachment(&document_id, name, &rev, data, content_type)?;
        Ok(result.rev)
    }

    /// Removes an attachment and returns the new revision.
    pub fn remove_attachment(
        &self,
        type_name: &str,
        entity: &Entity,
        name: &str,
    ) -> RelResult<String> {
        let (document_id, rev) = self.attachment_target(type_name, entity)?;
        let result = self.store.remove_attachment(&document_id, name, &rev)?;
        Ok(result.rev)
    }

    /// Reads an attachment body.
    pub fn get_attachment(
        &self,
        type_name: &str,
        id: &EntityId,
        name: &str,
    ) -> RelResult<Vec<u8>> {
        let info = self.schema.type_info(type_name)?;
        Ok(self
            .store
            .get_attachment(&doc_id(&info.document_type, id)?, name)?)
    }

    /// Decomposes a stored document ID into its type name and entity ID.
    ///
    /// A prefix matching no registered name is searched against the types'
    /// storage discriminators, so several logical types can share one
    /// physical discriminator; an entirely unregistered prefix passes
    /// through verbatim.
    pub fn parse_doc_id(&self, raw: &str) -> RelResult<ParsedDocId> {
        let (prefix, id) = split_doc_id(raw)?;
        let type_name = if self.schema.contains(prefix) {
            prefix.to_owned()
        } else if let Some(singular) = self.schema.singular_for_document_type(prefix) {
            singular.to_owned()
        } else {
            prefix.to_owned()
        };
        Ok(ParsedDocId { type_name, id })
    }

    /// Builds the stored document ID for `(type_name, id)`.
    ///
    /// A registered name resolves to its storage discriminator; an
    /// unregistered one is used verbatim.
    pub fn make_doc_id(&self, type_name: &str, id: &EntityId) -> RelResult<String> {
        let document_type = self
            .schema
            .get(type_name)
            .map_or(type_name, |info| info.document_type.as_str());
        Ok(doc_id(document_type, id)?)
    }

    fn attachment_target(&self, type_name: &str, entity: &Entity) -> RelResult<(String, String)> {
        let info = self.schema.type_info(type_name)?;
        let id = entity.id.as_ref().ok_or(RelError::MissingId)?;
        let rev = entity
            .rev
            .clone()
            .ok_or_else(|| RelError::MissingRevision { id: id.clone() })?;
        Ok((doc_id(&info.document_type, id)?, rev))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RelationSpec, TypeDef};
    use reldoc_store::InMemoryStore;
    use serde_json::json;

    fn blog_db() -> RelDatabase<InMemoryStore> {
        let schema = Schema::compile(vec![TypeDef::new("post", "posts")]).unwrap();
        RelDatabase::new(InMemoryStore::new(), schema)
    }

    #[test]
    fn save_merges_id_and_rev() {
        let db = blog_db();
        let saved = db
            .save("post", Entity::new().field("title", json!("Rails is Omakase")))
            .unwrap();
        assert!(saved.id.is_some());
        assert!(saved.rev.as_deref().unwrap().starts_with("1-"));
        assert_eq!(saved.get("title"), Some(&json!("Rails is Omakase")));
    }

    #[test]
    fn save_accepts_plural_names() {
        let db = blog_db();
        let saved = db.save("posts", Entity::with_id(1u64)).unwrap();
        assert_eq!(saved.id, Some(EntityId::Number(1)));
    }

    #[test]
    fn save_without_rev_on_existing_entity_conflicts() {
        let db = blog_db();
        db.save("post", Entity::with_id(1u64)).unwrap();
        let err = db.save("post", Entity::with_id(1u64)).unwrap_err();
        assert_eq!(err.status(), 409);
    }

    #[test]
    fn del_requires_an_id() {
        let db = blog_db();
        let err = db.del("post", &Entity::new()).unwrap_err();
        assert!(matches!(err, RelError::MissingId));
    }

    #[test]
    fn tombstone_tri_state() {
        let db = blog_db();
        let id = EntityId::from("doomed");

        assert_eq!(db.is_deleted("post", &id).unwrap(), None);

        let saved = db.save("post", Entity::with_id(id.clone())).unwrap();
        assert_eq!(db.is_deleted("post", &id).unwrap(), Some(false));

        db.del("post", &saved).unwrap();
        assert_eq!(db.is_deleted("post", &id).unwrap(), Some(true));
    }

    #[test]
    fn deleted_entities_disappear_from_finds() {
        let db = blog_db();
        let saved = db.save("post", Entity::with_id(1u64)).unwrap();
        db.del("post", &saved).unwrap();

        let bundle = db.find_all("post").unwrap();
        assert!(bundle.get("posts").is_empty());
    }

    #[test]
    fn unknown_types_fail_every_operation() {
        let db = blog_db();
        assert!(matches!(
            db.find_all("gizmo").unwrap_err(),
            RelError::UnknownType { .. }
        ));
        assert!(matches!(
            db.save("gizmo", Entity::new()).unwrap_err(),
            RelError::UnknownType { .. }
        ));
    }

    #[test]
    fn attachment_round_trip() {
        let db = blog_db();
        let saved = db.save("post", Entity::with_id("art")).unwrap();

        let rev = db
            .put_attachment("post", &saved, "file", b"Is there life on Mars?".to_vec(), "text/plain")
            .unwrap();
        assert!(rev.starts_with("2-"));

        let body = db
            .get_attachment("post", saved.id.as_ref().unwrap(), "file")
            .unwrap();
        assert_eq!(body, b"Is there life on Mars?");

        let mut current = saved.clone();
        current.rev = Some(rev);
        let rev = db.remove_attachment("post", &current, "file").unwrap();
        assert!(rev.starts_with("3-"));
    }

    #[test]
    fn attachments_require_id_and_rev() {
        let db = blog_db();
        let err = db
            .put_attachment("post", &Entity::new(), "file", vec![], "text/plain")
            .unwrap_err();
        assert!(matches!(err, RelError::MissingId));

        let err = db
            .put_attachment("post", &Entity::with_id("x"), "file", vec![], "text/plain")
            .unwrap_err();
        assert!(matches!(err, RelError::MissingRevision { .. }));
    }

    #[test]
    fn attachments_survive_into_found_entities() {
        let db = blog_db();
        let saved = db.save("post", Entity::with_id("art")).unwrap();
        db.put_attachment("post", &saved, "file", b"hello".to_vec(), "text/plain")
            .unwrap();

        let bundle = db.find_one("post", "art").unwrap();
        let post = &bundle.get("posts")[0];
        assert_eq!(post.attachments["file"].content_type, "text/plain");
    }

    #[test]
    fn doc_id_symmetry() {
        let db = blog_db();
        let raw = "post_2_abc123";
        let parsed = db.parse_doc_id(raw).unwrap();
        assert_eq!(parsed.type_name, "post");
        assert_eq!(parsed.id, EntityId::from("abc123"));
        assert_eq!(db.make_doc_id(&parsed.type_name, &parsed.id).unwrap(), raw);
    }

    #[test]
    fn doc_ids_work_for_unregistered_types() {
        let db = blog_db();
        assert_eq!(
            db.make_doc_id("something", &EntityId::from("quux")).unwrap(),
            "something_2_quux"
        );
        let parsed = db.parse_doc_id("something_2_bar").unwrap();
        assert_eq!(parsed.type_name, "something");
        assert_eq!(parsed.id, EntityId::from("bar"));
    }

    #[test]
    fn shared_document_type_resolves_through_the_schema() {
        let schema = Schema::compile(vec![
            TypeDef::new("postSummary", "postSummaries").document_type("post")
        ])
        .unwrap();
        let db = RelDatabase::new(InMemoryStore::new(), schema);

        assert_eq!(
            db.make_doc_id("postSummary", &EntityId::from("foo")).unwrap(),
            "post_2_foo"
        );
        let parsed = db.parse_doc_id("post_2_bar").unwrap();
        assert_eq!(parsed.type_name, "postSummary");
        assert_eq!(parsed.id, EntityId::from("bar"));
    }

    #[test]
    fn generated_ids_are_unique_text() {
        let db = blog_db();
        let a = db.generate_id();
        let b = db.generate_id();
        assert_ne!(a, b);
        assert!(a.as_text().is_some());
    }

    #[test]
    fn find_range_with_paging() {
        let db = blog_db();
        for n in [1u64, 2, 3, 4, 10] {
            db.save("post", Entity::with_id(n)).unwrap();
        }

        let bundle = db
            .find(
                "post",
                crate::resolver::RangeSpec::new().start(2u64).limit(2),
            )
            .unwrap();
        let ids: Vec<_> = bundle
            .get("posts")
            .iter()
            .map(|entity| entity.id.clone().unwrap())
            .collect();
        assert_eq!(ids, [EntityId::Number(2), EntityId::Number(3)]);
    }

    #[test]
    fn parse_rel_docs_hydrates_relations() {
        let schema = Schema::compile(vec![
            TypeDef::new("book", "books")
                .relation("author", RelationSpec::belongs_to("author")),
            TypeDef::new("author", "authors"),
        ])
        .unwrap();
        let db = RelDatabase::new(InMemoryStore::new(), schema);
        db.save("author", Entity::with_id("king").field("name", json!("Stephen King")))
            .unwrap();
        db.save(
            "book",
            Entity::with_id("it").field("author", json!("king")),
        )
        .unwrap();

        // Hand the resolver raw documents, as an ad hoc query would.
        let doc = db.store().get("book_2_it").unwrap();
        let bundle = db.parse_rel_docs("book", vec![doc]).unwrap();
        assert_eq!(bundle.get("books").len(), 1);
        assert_eq!(bundle.get("authors").len(), 1);
    }
}
