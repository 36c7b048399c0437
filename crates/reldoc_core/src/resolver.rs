//! Relationship resolution.
//!
//! Given a seed set of documents of one type, the resolver materializes the
//! transitive closure of entities reachable over declared non-lazy edges. It
//! is a worklist algorithm: a queue of fetch tasks and a visited set keyed
//! by `(type, id)`, iterated until the queue drains.
//!
//! Each round fetches one task's documents, materializes the new ones
//! (already-visited entities are skipped, which is what terminates cycles),
//! and discovers the next round's work from their relation fields. The
//! discovered foreign keys of a round are merged per target type — one
//! batched fetch per related type per round, so the number of store round
//! trips grows with the number of related types touched, not the number of
//! related entities.

use crate::config::RelConfig;
use crate::entity::{id_from_value, id_to_value, Bundle, Entity};
use crate::error::RelResult;
use crate::schema::{RelationKind, Schema};
use crate::transform;
use reldoc_codec::{bound_key, doc_id, EntityId, IdBound};
use reldoc_store::{AllDocsOptions, DocumentStore, FindRequest, RawDocument, Selector};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::{debug, trace};

/// The shape of a top-level entity query.
#[derive(Debug, Clone)]
pub enum FindSpec {
    /// Every entity of the type.
    All,
    /// One entity by ID.
    Id(EntityId),
    /// Several entities by ID, fetched in one batch.
    Ids(Vec<EntityId>),
    /// An ID range with optional paging.
    Range(RangeSpec),
}

impl From<EntityId> for FindSpec {
    fn from(id: EntityId) -> Self {
        Self::Id(id)
    }
}

impl From<Vec<EntityId>> for FindSpec {
    fn from(ids: Vec<EntityId>) -> Self {
        Self::Ids(ids)
    }
}

impl From<RangeSpec> for FindSpec {
    fn from(range: RangeSpec) -> Self {
        Self::Range(range)
    }
}

/// An inclusive ID range with optional paging.
///
/// Missing endpoints default to the type's full key range.
#[derive(Debug, Clone, Default)]
pub struct RangeSpec {
    /// Inclusive lower ID bound.
    pub start: Option<EntityId>,
    /// Inclusive upper ID bound.
    pub end: Option<EntityId>,
    /// Maximum number of seed entities.
    pub limit: Option<usize>,
    /// Number of leading seed entities to drop.
    pub skip: Option<usize>,
}

impl RangeSpec {
    /// Creates an unbounded range.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inclusive lower bound.
    #[must_use]
    pub fn start(mut self, id: impl Into<EntityId>) -> Self {
        self.start = Some(id.into());
        self
    }

    /// Sets the inclusive upper bound.
    #[must_use]
    pub fn end(mut self, id: impl Into<EntityId>) -> Self {
        self.end = Some(id.into());
        self
    }

    /// Sets the seed limit.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of leading seeds to drop.
    #[must_use]
    pub const fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }
}

/// One unit of fetch work. Type names are always singular here.
enum FetchTask {
    /// The seed query of a resolution.
    Query { type_name: String, spec: FindSpec },
    /// A batch of foreign keys discovered in one round.
    ByIds { type_name: String, ids: Vec<EntityId> },
    /// An inverse edge: documents of `type_name` whose `field` holds
    /// `owner`'s ID.
    Inverse {
        type_name: String,
        field: String,
        owner: EntityId,
    },
}

/// The per-call working set: fetch-ordered entity lists plus the visited
/// set that deduplicates fetches and terminates cycles.
#[derive(Default)]
struct FoundObjects {
    lists: BTreeMap<String, Vec<Entity>>,
    seen: HashMap<String, HashSet<EntityId>>,
}

impl FoundObjects {
    /// Guarantees the type has a (possibly empty) list in the result.
    fn ensure_type(&mut self, singular: &str) {
        self.lists.entry(singular.to_owned()).or_default();
    }

    fn contains(&self, singular: &str, id: &EntityId) -> bool {
        self.seen
            .get(singular)
            .is_some_and(|ids| ids.contains(id))
    }

    fn insert(&mut self, singular: &str, id: EntityId, entity: Entity) {
        if self.seen.entry(singular.to_owned()).or_default().insert(id) {
            self.lists.entry(singular.to_owned()).or_default().push(entity);
        }
    }
}

/// A single resolution run. Created per top-level call and discarded after.
pub(crate) struct Resolver<'a, S: DocumentStore> {
    store: &'a S,
    schema: &'a Schema,
    config: &'a RelConfig,
    found: FoundObjects,
    queue: VecDeque<FetchTask>,
}

impl<'a, S: DocumentStore> Resolver<'a, S> {
    pub(crate) fn new(store: &'a S, schema: &'a Schema, config: &'a RelConfig) -> Self {
        Self {
            store,
            schema,
            config,
            found: FoundObjects::default(),
            queue: VecDeque::new(),
        }
    }

    /// Resolves from a seed query.
    pub(crate) fn run_query(mut self, type_name: String, spec: FindSpec) -> RelResult<Bundle> {
        self.queue.push_back(FetchTask::Query { type_name, spec });
        self.drain()?;
        self.assemble()
    }

    /// Resolves from caller-supplied documents.
    pub(crate) fn run_docs(
        mut self,
        type_name: String,
        docs: Vec<RawDocument>,
    ) -> RelResult<Bundle> {
        let tasks = self.materialize(&type_name, docs)?;
        self.queue.extend(tasks);
        self.drain()?;
        self.assemble()
    }

    /// Resolves from an inverse-edge query.
    pub(crate) fn run_inverse(
        mut self,
        type_name: String,
        field: String,
        owner: EntityId,
    ) -> RelResult<Bundle> {
        self.queue.push_back(FetchTask::Inverse {
            type_name,
            field,
            owner,
        });
        self.drain()?;
        self.assemble()
    }

    fn drain(&mut self) -> RelResult<()> {
        while let Some(task) = self.queue.pop_front() {
            let (type_name, docs) = match task {
                FetchTask::Query { type_name, spec } => {
                    let docs = self.fetch_query(&type_name, &spec)?;
                    (type_name, docs)
                }
                FetchTask::ByIds { type_name, mut ids } => {
                    // Objects materialized since this batch was queued no
                    // longer need fetching.
                    ids.retain(|id| !self.found.contains(&type_name, id));
                    if ids.is_empty() {
                        continue;
                    }
                    let docs = self.fetch_query(&type_name, &FindSpec::Ids(ids))?;
                    (type_name, docs)
                }
                FetchTask::Inverse {
                    type_name,
                    field,
                    owner,
                } => {
                    let docs = self.fetch_inverse(&type_name, &field, &owner)?;
                    (type_name, docs)
                }
            };

            let tasks = self.materialize(&type_name, docs)?;
            self.queue.extend(tasks);
        }
        Ok(())
    }

    fn fetch_query(&self, type_name: &str, spec: &FindSpec) -> RelResult<Vec<RawDocument>> {
        let info = self.schema.type_info(type_name)?;
        let storage = &info.document_type;

        let mut options = AllDocsOptions::new().include_docs(true);
        match spec {
            FindSpec::All => {
                options = options
                    .startkey(bound_key(storage, &IdBound::Lowest)?)
                    .endkey(bound_key(storage, &IdBound::Highest)?);
            }
            FindSpec::Id(id) => {
                options = options.key(doc_id(storage, id)?);
            }
            FindSpec::Ids(ids) => {
                let keys = ids
                    .iter()
                    .map(|id| doc_id(storage, id))
                    .collect::<Result<Vec<_>, _>>()?;
                options = options.keys(keys);
            }
            FindSpec::Range(range) => {
                let startkey = match &range.start {
                    Some(id) => doc_id(storage, id)?,
                    None => bound_key(storage, &IdBound::Lowest)?,
                };
                let endkey = match &range.end {
                    Some(id) => doc_id(storage, id)?,
                    None => bound_key(storage, &IdBound::Highest)?,
                };
                options = options.startkey(startkey).endkey(endkey);
                if let Some(limit) = range.limit {
                    options = options.limit(limit);
                }
                if let Some(skip) = range.skip {
                    options = options.skip(skip);
                }
            }
        }

        let rows = self.store.all_docs(&options)?;
        trace!(type_name, rows = rows.len(), "fetched seed rows");
        Ok(rows
            .into_iter()
            .filter(|row| !row.deleted)
            .filter_map(|row| row.doc)
            .collect())
    }

    fn fetch_inverse(
        &self,
        type_name: &str,
        field: &str,
        owner: &EntityId,
    ) -> RelResult<Vec<RawDocument>> {
        let info = self.schema.type_info(type_name)?;
        let storage = &info.document_type;

        let selector = Selector::new()
            .id_above(bound_key(storage, &IdBound::Lowest)?)
            .id_below(bound_key(storage, &IdBound::Highest)?)
            .field_equals(format!("data.{field}"), id_to_value(owner));
        let mut request = FindRequest::new(selector);
        if let Some(limit) = self.config.inverse_query_limit {
            request = request.limit(limit);
        }

        let docs = self.store.find(&request)?;
        trace!(type_name, field, docs = docs.len(), "fetched inverse rows");
        Ok(docs)
    }

    /// Materializes fetched documents and discovers the next round's tasks.
    fn materialize(
        &mut self,
        type_name: &str,
        docs: Vec<RawDocument>,
    ) -> RelResult<Vec<FetchTask>> {
        let info = self.schema.type_info(type_name)?;
        let singular = info.singular.clone();
        self.found.ensure_type(&singular);

        let mut inverse_tasks = Vec::new();
        let mut batched: BTreeMap<String, Vec<EntityId>> = BTreeMap::new();
        let mut queued: HashSet<(String, EntityId)> = HashSet::new();
        let mut fresh = 0usize;

        for doc in docs {
            let mut entity = transform::from_raw_doc(doc)?;
            let Some(id) = entity.id.clone() else {
                continue;
            };
            if self.found.contains(&singular, &id) {
                continue;
            }
            fresh += 1;

            for relation in &info.relations {
                if relation.lazy {
                    continue;
                }
                match relation.kind {
                    RelationKind::BelongsTo => {
                        let related = entity.fields.get(&relation.field).and_then(id_from_value);
                        if let Some(related_id) = related {
                            if !self.found.contains(&relation.target, &related_id)
                                && queued.insert((relation.target.clone(), related_id.clone()))
                            {
                                batched
                                    .entry(relation.target.clone())
                                    .or_default()
                                    .push(related_id);
                            }
                        }
                    }
                    RelationKind::HasMany => {
                        if let Some(inverse_field) = &relation.query_inverse {
                            // A stale forward array (written under an older
                            // schema) must not resurface in results.
                            entity.fields.remove(&relation.field);
                            inverse_tasks.push(FetchTask::Inverse {
                                type_name: relation.target.clone(),
                                field: inverse_field.clone(),
                                owner: id.clone(),
                            });
                            continue;
                        }
                        let Some(serde_json::Value::Array(items)) =
                            entity.fields.get(&relation.field)
                        else {
                            continue;
                        };
                        for item in items {
                            let Some(related_id) = id_from_value(item) else {
                                continue;
                            };
                            if !self.found.contains(&relation.target, &related_id)
                                && queued.insert((relation.target.clone(), related_id.clone()))
                            {
                                batched
                                    .entry(relation.target.clone())
                                    .or_default()
                                    .push(related_id);
                            }
                        }
                    }
                }
            }

            self.found.insert(&singular, id, entity);
        }

        debug!(
            type_name = %singular,
            fresh,
            related_types = batched.len(),
            inverse_edges = inverse_tasks.len(),
            "materialized round"
        );

        let mut tasks = inverse_tasks;
        tasks.extend(
            batched
                .into_iter()
                .map(|(type_name, ids)| FetchTask::ByIds { type_name, ids }),
        );
        Ok(tasks)
    }

    fn assemble(self) -> RelResult<Bundle> {
        let Self {
            schema,
            config,
            found,
            ..
        } = self;

        let mut bundle = Bundle::default();
        for (singular, mut list) in found.lists {
            let info = schema.type_info(&singular)?;
            if config.sort_results {
                list.sort_by(|a, b| a.id.cmp(&b.id));
            }
            bundle.insert_list(info.plural.clone(), list);
        }
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RelationSpec, TypeDef};
    use reldoc_store::InMemoryStore;
    use serde_json::json;

    fn store_with(docs: Vec<RawDocument>) -> InMemoryStore {
        let store = InMemoryStore::new();
        for doc in docs {
            store.put(doc).unwrap();
        }
        store
    }

    fn doc(id: &str, data: serde_json::Value) -> RawDocument {
        let mut raw = RawDocument::new(id);
        raw.data = data.as_object().cloned().unwrap();
        raw
    }

    #[test]
    fn cyclic_references_terminate() {
        let schema = Schema::compile(vec![
            TypeDef::new("author", "authors")
                .relation("profile", RelationSpec::belongs_to("profile")),
            TypeDef::new("profile", "profiles")
                .relation("author", RelationSpec::belongs_to("author")),
        ])
        .unwrap();
        let store = store_with(vec![
            doc("author_2_king", json!({"name": "King", "profile": "p1"})),
            doc("profile_2_p1", json!({"author": "king"})),
        ]);
        let config = RelConfig::default();

        let bundle = Resolver::new(&store, &schema, &config)
            .run_query("author".into(), FindSpec::All)
            .unwrap();

        assert_eq!(bundle.get("authors").len(), 1);
        assert_eq!(bundle.get("profiles").len(), 1);
    }

    #[test]
    fn lazy_edges_are_not_resolved() {
        let schema = Schema::compile(vec![
            TypeDef::new("author", "authors").relation(
                "books",
                RelationSpec::has_many("book").lazy(),
            ),
            TypeDef::new("book", "books"),
        ])
        .unwrap();
        let store = store_with(vec![
            doc("author_2_king", json!({"books": ["it"]})),
            doc("book_2_it", json!({"title": "It"})),
        ]);
        let config = RelConfig::default();

        let bundle = Resolver::new(&store, &schema, &config)
            .run_query("author".into(), FindSpec::All)
            .unwrap();

        assert_eq!(bundle.get("authors").len(), 1);
        assert!(!bundle.contains("books"));
    }

    #[test]
    fn seed_type_is_present_even_when_empty() {
        let schema = Schema::compile(vec![TypeDef::new("post", "posts")]).unwrap();
        let store = InMemoryStore::new();
        let config = RelConfig::default();

        let bundle = Resolver::new(&store, &schema, &config)
            .run_query("post".into(), FindSpec::All)
            .unwrap();

        assert!(bundle.contains("posts"));
        assert!(bundle.get("posts").is_empty());
    }

    #[test]
    fn undefined_foreign_keys_are_ignored() {
        let schema = Schema::compile(vec![
            TypeDef::new("book", "books")
                .relation("author", RelationSpec::belongs_to("author"))
                .relation("readers", RelationSpec::has_many("reader")),
            TypeDef::new("author", "authors"),
            TypeDef::new("reader", "readers"),
        ])
        .unwrap();
        let store = store_with(vec![
            doc("book_2_it", json!({"readers": [null, "a", null]})),
            doc("reader_2_a", json!({})),
        ]);
        let config = RelConfig::default();

        let bundle = Resolver::new(&store, &schema, &config)
            .run_query("book".into(), FindSpec::All)
            .unwrap();

        assert_eq!(bundle.get("books").len(), 1);
        assert_eq!(bundle.get("readers").len(), 1);
        // No author key at all, so no author fetch and no list.
        assert!(!bundle.contains("authors"));
    }

    #[test]
    fn sorted_results_are_ordered_by_id() {
        let schema = Schema::compile(vec![
            TypeDef::new("author", "authors")
                .relation("books", RelationSpec::has_many("book")),
            TypeDef::new("book", "books"),
        ])
        .unwrap();
        let store = store_with(vec![
            doc("author_2_a", json!({"books": ["z", "m", "a"]})),
            doc("book_2_z", json!({})),
            doc("book_2_m", json!({})),
            doc("book_2_a", json!({})),
        ]);
        let config = RelConfig::new().sort_results(true);

        let bundle = Resolver::new(&store, &schema, &config)
            .run_query("author".into(), FindSpec::All)
            .unwrap();

        let ids: Vec<_> = bundle
            .get("books")
            .iter()
            .map(|entity| entity.id.clone().unwrap().to_string())
            .collect();
        assert_eq!(ids, ["a", "m", "z"]);
    }
}
