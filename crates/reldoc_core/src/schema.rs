//! Schema declaration and compilation.
//!
//! Callers declare entity types as a list of [`TypeDef`]s and compile them
//! once into an immutable [`Schema`]. Compilation validates every relation
//! up front, so resolution code never re-inspects declaration shape: each
//! [`Relation`] carries its kind, its target's singular name, and its
//! normalized options.

use crate::error::{RelError, RelResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A declared entity type.
///
/// Serde round-trips through the camelCase declaration format, so schemas
/// can be embedded in configuration files:
///
/// ```json
/// {
///   "singular": "author",
///   "plural": "authors",
///   "relations": {
///     "books": { "hasMany": "book" },
///     "profile": { "belongsTo": { "type": "profile", "options": { "lazy": true } } }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    /// Singular name, e.g. `"post"`.
    pub singular: String,
    /// Plural name, e.g. `"posts"`; keys the type's list in result bundles.
    pub plural: String,
    /// Physical storage discriminator; defaults to the singular name.
    ///
    /// Several logical types may share one discriminator, e.g. a summary
    /// view type reading the same documents as the full type.
    #[serde(
        rename = "documentType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub document_type: Option<String>,
    /// Relations by field name. `Some` with an empty map is a compile error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<BTreeMap<String, RelationSpec>>,
}

impl TypeDef {
    /// Creates a type declaration.
    pub fn new(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            singular: singular.into(),
            plural: plural.into(),
            document_type: None,
            relations: None,
        }
    }

    /// Sets the storage discriminator.
    #[must_use]
    pub fn document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = Some(document_type.into());
        self
    }

    /// Declares a relation field.
    #[must_use]
    pub fn relation(mut self, field: impl Into<String>, spec: RelationSpec) -> Self {
        self.relations
            .get_or_insert_with(BTreeMap::new)
            .insert(field.into(), spec);
        self
    }
}

/// A declared relation.
///
/// The serde encoding is externally tagged (`{"belongsTo": ...}` /
/// `{"hasMany": ...}`), which makes "a relation descriptor has exactly one
/// kind" a parse-time guarantee for schemas read from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelationSpec {
    /// A to-one relation stored as a foreign key on this type.
    #[serde(rename = "belongsTo")]
    BelongsTo(TargetRef),
    /// A to-many relation stored as a foreign-key array on this type,
    /// or resolved by an inverse query when so configured.
    #[serde(rename = "hasMany")]
    HasMany(TargetRef),
}

impl RelationSpec {
    /// Declares a to-one relation to `target`.
    pub fn belongs_to(target: impl Into<String>) -> Self {
        Self::BelongsTo(TargetRef::Name(target.into()))
    }

    /// Declares a to-many relation to `target`.
    pub fn has_many(target: impl Into<String>) -> Self {
        Self::HasMany(TargetRef::Name(target.into()))
    }

    /// Opts this relation out of eager resolution.
    #[must_use]
    pub fn lazy(self) -> Self {
        self.map_options(|options| options.lazy = true)
    }

    /// Resolves this relation by querying the target type's `field` for the
    /// owner's ID instead of storing a foreign-key array.
    ///
    /// Only valid on has-many relations; compilation rejects it elsewhere.
    #[must_use]
    pub fn query_inverse(self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.map_options(|options| options.query_inverse = Some(field))
    }

    fn map_options(self, apply: impl FnOnce(&mut RelationOptions)) -> Self {
        match self {
            Self::BelongsTo(target) => Self::BelongsTo(target.map_options(apply)),
            Self::HasMany(target) => Self::HasMany(target.map_options(apply)),
        }
    }
}

/// The target of a relation: a bare type name, or a name with options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetRef {
    /// A bare type name with default options.
    Name(String),
    /// A type name with explicit options.
    Detailed {
        /// The target type name (singular or plural).
        #[serde(rename = "type")]
        type_name: String,
        /// Relation options.
        #[serde(default)]
        options: RelationOptions,
    },
}

impl TargetRef {
    fn type_name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Detailed { type_name, .. } => type_name,
        }
    }

    fn options(&self) -> RelationOptions {
        match self {
            Self::Name(_) => RelationOptions::default(),
            Self::Detailed { options, .. } => options.clone(),
        }
    }

    fn map_options(self, apply: impl FnOnce(&mut RelationOptions)) -> Self {
        let (type_name, mut options) = match self {
            Self::Name(name) => (name, RelationOptions::default()),
            Self::Detailed { type_name, options } => (type_name, options),
        };
        apply(&mut options);
        Self::Detailed { type_name, options }
    }
}

/// Options on a relation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationOptions {
    /// Skip this edge during eager resolution; the caller fetches the
    /// related entities on demand.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub lazy: bool,
    /// Resolve this edge by querying the target type's named foreign-key
    /// field for the owner's ID. The forward foreign-key array is never
    /// stored.
    #[serde(
        rename = "queryInverse",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub query_inverse: Option<String>,
}

/// The kind of a compiled relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// To-one, stored as a foreign key.
    BelongsTo,
    /// To-many, stored as a foreign-key array or resolved inversely.
    HasMany,
}

/// A compiled relation.
#[derive(Debug, Clone)]
pub struct Relation {
    /// Field name on the owning entity.
    pub field: String,
    /// Relation kind.
    pub kind: RelationKind,
    /// The target type's singular name, fully resolved.
    pub target: String,
    /// Skip during eager resolution.
    pub lazy: bool,
    /// Foreign-key field on the target type for inverse resolution.
    pub query_inverse: Option<String>,
}

/// A compiled entity type.
#[derive(Debug)]
pub struct TypeInfo {
    /// Singular name.
    pub singular: String,
    /// Plural name.
    pub plural: String,
    /// Physical storage discriminator.
    pub document_type: String,
    /// Compiled relations.
    pub relations: Vec<Relation>,
}

/// An immutable, validated schema.
///
/// Built once by [`Schema::compile`] and then only read. Lookup accepts
/// both singular and plural names.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    types: Vec<Arc<TypeInfo>>,
    lookup: HashMap<String, usize>,
}

impl Schema {
    /// Compiles and validates a list of type declarations.
    ///
    /// Fails fast, before any store I/O, on: an empty-but-present relations
    /// map, a relation target that resolves to no declared type, an inverse
    /// query on a belongs-to relation, and a name registered twice.
    pub fn compile(defs: Vec<TypeDef>) -> RelResult<Self> {
        let mut lookup = HashMap::new();
        for (index, def) in defs.iter().enumerate() {
            for name in [&def.singular, &def.plural] {
                if let Some(previous) = lookup.insert(name.clone(), index) {
                    if previous != index {
                        return Err(RelError::DuplicateTypeName { name: name.clone() });
                    }
                }
            }
        }

        let mut types = Vec::with_capacity(defs.len());
        for def in &defs {
            let relations = match &def.relations {
                None => Vec::new(),
                Some(map) if map.is_empty() => {
                    return Err(RelError::EmptyRelations {
                        type_name: def.singular.clone(),
                    });
                }
                Some(map) => map
                    .iter()
                    .map(|(field, spec)| compile_relation(&defs, &lookup, def, field, spec))
                    .collect::<RelResult<Vec<_>>>()?,
            };

            types.push(Arc::new(TypeInfo {
                singular: def.singular.clone(),
                plural: def.plural.clone(),
                document_type: def
                    .document_type
                    .clone()
                    .unwrap_or_else(|| def.singular.clone()),
                relations,
            }));
        }

        Ok(Self { types, lookup })
    }

    /// Looks up a type by singular or plural name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeInfo> {
        self.lookup.get(name).map(|index| self.types[*index].as_ref())
    }

    /// Looks up a type by singular or plural name, failing with a client
    /// error when unknown.
    pub fn type_info(&self, name: &str) -> RelResult<&TypeInfo> {
        self.get(name).ok_or_else(|| RelError::unknown_type(name))
    }

    /// Whether `name` is a registered singular or plural.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    /// Iterates over the declared types in declaration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeInfo> {
        self.types.iter().map(AsRef::as_ref)
    }

    /// Finds the singular name of the first type whose storage discriminator
    /// is `document_type`.
    #[must_use]
    pub fn singular_for_document_type(&self, document_type: &str) -> Option<&str> {
        self.types
            .iter()
            .find(|info| info.document_type == document_type)
            .map(|info| info.singular.as_str())
    }
}

fn compile_relation(
    defs: &[TypeDef],
    lookup: &HashMap<String, usize>,
    owner: &TypeDef,
    field: &str,
    spec: &RelationSpec,
) -> RelResult<Relation> {
    let (kind, target_ref) = match spec {
        RelationSpec::BelongsTo(target) => (RelationKind::BelongsTo, target),
        RelationSpec::HasMany(target) => (RelationKind::HasMany, target),
    };

    let target_index =
        lookup
            .get(target_ref.type_name())
            .ok_or_else(|| RelError::UnknownRelatedType {
                type_name: owner.singular.clone(),
                field: field.to_owned(),
                target: target_ref.type_name().to_owned(),
            })?;
    let target = defs[*target_index].singular.clone();

    let options = target_ref.options();
    if options.query_inverse.is_some() && kind == RelationKind::BelongsTo {
        return Err(RelError::invalid_relation(
            &owner.singular,
            field,
            "an inverse query is only valid on a has-many relation",
        ));
    }

    Ok(Relation {
        field: field.to_owned(),
        kind,
        target,
        lazy: options.lazy,
        query_inverse: options.query_inverse,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author_book_defs() -> Vec<TypeDef> {
        vec![
            TypeDef::new("author", "authors").relation("books", RelationSpec::has_many("book")),
            TypeDef::new("book", "books").relation("author", RelationSpec::belongs_to("author")),
        ]
    }

    #[test]
    fn compiles_and_indexes_both_names() {
        let schema = Schema::compile(author_book_defs()).unwrap();
        assert_eq!(schema.type_info("author").unwrap().plural, "authors");
        assert_eq!(schema.type_info("authors").unwrap().singular, "author");
        assert!(schema.contains("books"));
    }

    #[test]
    fn document_type_defaults_to_singular() {
        let schema = Schema::compile(vec![TypeDef::new("post", "posts")]).unwrap();
        assert_eq!(schema.type_info("post").unwrap().document_type, "post");
    }

    #[test]
    fn relation_targets_resolve_to_singular() {
        let defs = vec![
            TypeDef::new("author", "authors")
                .relation("books", RelationSpec::has_many("books")),
            TypeDef::new("book", "books"),
        ];
        let schema = Schema::compile(defs).unwrap();
        let relation = &schema.type_info("author").unwrap().relations[0];
        assert_eq!(relation.target, "book");
        assert_eq!(relation.kind, RelationKind::HasMany);
    }

    #[test]
    fn unknown_type_lookup_fails() {
        let schema = Schema::compile(author_book_defs()).unwrap();
        let err = schema.type_info("gizmo").unwrap_err();
        assert!(matches!(err, RelError::UnknownType { .. }));
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn empty_relations_map_is_rejected() {
        let mut def = TypeDef::new("foo", "foos");
        def.relations = Some(BTreeMap::new());
        let err = Schema::compile(vec![def]).unwrap_err();
        assert!(matches!(err, RelError::EmptyRelations { .. }));
    }

    #[test]
    fn unknown_relation_target_is_rejected() {
        let def =
            TypeDef::new("author", "authors").relation("books", RelationSpec::has_many("book"));
        let err = Schema::compile(vec![def]).unwrap_err();
        assert!(matches!(err, RelError::UnknownRelatedType { .. }));
    }

    #[test]
    fn inverse_query_on_belongs_to_is_rejected() {
        let defs = vec![
            TypeDef::new("book", "books").relation(
                "author",
                RelationSpec::belongs_to("author").query_inverse("books"),
            ),
            TypeDef::new("author", "authors"),
        ];
        let err = Schema::compile(defs).unwrap_err();
        assert!(matches!(err, RelError::InvalidRelation { .. }));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let defs = vec![
            TypeDef::new("post", "posts"),
            TypeDef::new("post", "entries"),
        ];
        let err = Schema::compile(defs).unwrap_err();
        assert!(matches!(err, RelError::DuplicateTypeName { .. }));
    }

    #[test]
    fn identical_singular_and_plural_is_allowed() {
        let schema = Schema::compile(vec![TypeDef::new("sheep", "sheep")]).unwrap();
        assert!(schema.contains("sheep"));
    }

    #[test]
    fn declaration_round_trips_through_serde() {
        let json = r#"{
            "singular": "author",
            "plural": "authors",
            "relations": {
                "books": {"hasMany": {"type": "book", "options": {"queryInverse": "author"}}},
                "profile": {"belongsTo": "profile"}
            }
        }"#;
        let def: TypeDef = serde_json::from_str(json).unwrap();

        let relations = def.relations.as_ref().unwrap();
        assert_eq!(
            relations["profile"],
            RelationSpec::belongs_to("profile")
        );
        assert_eq!(
            relations["books"],
            RelationSpec::has_many("book").query_inverse("author")
        );

        let text = serde_json::to_string(&def).unwrap();
        let back: TypeDef = serde_json::from_str(&text).unwrap();
        assert_eq!(back, def);
    }

    #[test]
    fn builder_options_accumulate() {
        let spec = RelationSpec::has_many("comment").lazy().query_inverse("post");
        let RelationSpec::HasMany(TargetRef::Detailed { type_name, options }) = spec else {
            panic!("expected detailed target");
        };
        assert_eq!(type_name, "comment");
        assert!(options.lazy);
        assert_eq!(options.query_inverse.as_deref(), Some("post"));
    }
}
