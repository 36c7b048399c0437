//! Property-based test generators using proptest.

use proptest::prelude::*;
use reldoc_codec::{EntityId, MAX_NUMERIC_ID};

/// Strategy for numeric entity IDs within the encodable range.
pub fn numeric_id_strategy() -> impl Strategy<Value = EntityId> {
    (0u64..=MAX_NUMERIC_ID).prop_map(EntityId::Number)
}

/// Strategy for text entity IDs.
pub fn text_id_strategy() -> impl Strategy<Value = EntityId> {
    prop::string::string_regex("[a-zA-Z0-9][a-zA-Z0-9_-]{0,23}")
        .expect("valid regex")
        .prop_map(EntityId::from)
}

/// Strategy for any valid entity ID.
pub fn entity_id_strategy() -> impl Strategy<Value = EntityId> {
    prop_oneof![numeric_id_strategy(), text_id_strategy()]
}

/// Strategy for valid type names (no underscores, which the document-ID
/// grammar strips).
pub fn type_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9]{0,15}").expect("valid regex")
}
