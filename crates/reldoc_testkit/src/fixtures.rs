//! Schema fixtures and seeded test databases.
//!
//! The shapes here cover the relational patterns the mapping layer has to
//! get right: flat types, one-to-many pairs, mutually referencing types,
//! inverse-query relations, and a dense many-to-many graph.

use reldoc_core::{Entity, RelDatabase, RelationSpec, Schema, TypeDef};
use reldoc_store::InMemoryStore;
use serde_json::json;

/// A database over a fresh in-memory store.
#[must_use]
pub fn memory_db(schema: Schema) -> RelDatabase<InMemoryStore> {
    RelDatabase::new(InMemoryStore::new(), schema)
}

/// A single flat `post` type with no relations.
#[must_use]
pub fn post_schema() -> Schema {
    Schema::compile(vec![TypeDef::new("post", "posts")]).expect("valid schema")
}

/// `author` has many `book`s; each `book` belongs to one `author`.
#[must_use]
pub fn author_book_schema() -> Schema {
    Schema::compile(vec![
        TypeDef::new("author", "authors").relation("books", RelationSpec::has_many("book")),
        TypeDef::new("book", "books").relation("author", RelationSpec::belongs_to("author")),
    ])
    .expect("valid schema")
}

/// `author` and `profile` reference each other, forming a two-node cycle.
#[must_use]
pub fn cyclic_schema() -> Schema {
    Schema::compile(vec![
        TypeDef::new("author", "authors").relation("profile", RelationSpec::belongs_to("profile")),
        TypeDef::new("profile", "profiles").relation("author", RelationSpec::belongs_to("author")),
    ])
    .expect("valid schema")
}

/// `author.books` is resolved by querying `book.author`, not stored.
#[must_use]
pub fn inverse_schema() -> Schema {
    Schema::compile(vec![
        TypeDef::new("author", "authors").relation(
            "books",
            RelationSpec::has_many("book").query_inverse("author"),
        ),
        TypeDef::new("book", "books").relation("author", RelationSpec::belongs_to("author")),
    ])
    .expect("valid schema")
}

/// Many-to-many authors/books plus a publisher on both sides.
#[must_use]
pub fn publisher_graph_schema() -> Schema {
    Schema::compile(vec![
        TypeDef::new("author", "authors")
            .relation("books", RelationSpec::has_many("book"))
            .relation("publisher", RelationSpec::belongs_to("publisher")),
        TypeDef::new("book", "books")
            .relation("authors", RelationSpec::has_many("author"))
            .relation("publisher", RelationSpec::belongs_to("publisher")),
        TypeDef::new("publisher", "publishers")
            .relation("authors", RelationSpec::has_many("author"))
            .relation("books", RelationSpec::has_many("book")),
    ])
    .expect("valid schema")
}

/// A database seeded with the publisher graph: 4 authors, 5 books, and
/// 2 publishers, every one transitively reachable from any author.
#[must_use]
pub fn publisher_graph_db() -> RelDatabase<InMemoryStore> {
    let db = memory_db(publisher_graph_schema());
    seed_publisher_graph(&db);
    db
}

/// Seeds the publisher graph into `db` (which must use a compatible schema).
pub fn seed_publisher_graph(db: &RelDatabase<InMemoryStore>) {
    let authors = [
        ("king", "Stephen King", json!(["it", "talisman"]), "penguin"),
        ("straub", "Peter Straub", json!(["ghost", "talisman"]), "bantam"),
        ("melville", "Herman Melville", json!(["moby"]), "bantam"),
        ("orwell", "George Orwell", json!(["1984"]), "penguin"),
    ];
    for (id, name, books, publisher) in authors {
        db.save(
            "author",
            Entity::with_id(id)
                .field("name", json!(name))
                .field("books", books)
                .field("publisher", json!(publisher)),
        )
        .expect("seed author");
    }

    let books = [
        ("it", "It", json!(["king"]), "penguin"),
        ("talisman", "The Talisman", json!(["king", "straub"]), "penguin"),
        ("ghost", "Ghost Story", json!(["straub"]), "bantam"),
        ("moby", "Moby Dick", json!(["melville"]), "bantam"),
        ("1984", "1984", json!(["orwell"]), "penguin"),
    ];
    for (id, title, authors, publisher) in books {
        db.save(
            "book",
            Entity::with_id(id)
                .field("title", json!(title))
                .field("authors", authors)
                .field("publisher", json!(publisher)),
        )
        .expect("seed book");
    }

    let publishers = [
        ("bantam", "Bantam", json!(["straub", "melville"]), json!(["moby", "ghost"])),
        ("penguin", "Penguin", json!(["orwell", "king"]), json!(["it", "talisman", "1984"])),
    ];
    for (id, name, authors, books) in publishers {
        db.save(
            "publisher",
            Entity::with_id(id)
                .field("name", json!(name))
                .field("authors", authors)
                .field("books", books),
        )
        .expect("seed publisher");
    }
}
