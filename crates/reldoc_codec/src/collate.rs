//! Document-ID collation.
//!
//! A document ID is a single sortable string:
//!
//! ```text
//! <document-type>_<discriminator>[_<payload>]
//! ```
//!
//! The discriminator encodes the ID's kind in collation order: the lower
//! range sentinel (`0`), numbers (`1`), text (`2`), the upper range sentinel
//! (`3`). Numeric payloads are zero-padded to a fixed width so that
//! lexicographic order equals numeric order; text payloads are the raw
//! string. Underscores are stripped from the document type so that the first
//! `_` of an ID unambiguously ends the type prefix.
//!
//! Under this scheme the documents of one type occupy the contiguous key
//! range `(bound_key(t, Lowest), bound_key(t, Highest))`, sorted by ID.

use crate::error::{CodecError, CodecResult};
use crate::id::EntityId;
use std::fmt::Write as _;

/// Maximum number of decimal digits in a numeric ID payload.
pub const MAX_NUMERIC_DIGITS: usize = 16;

/// Largest encodable numeric ID (sixteen nines).
pub const MAX_NUMERIC_ID: u64 = 9_999_999_999_999_999;

const DISC_LOWEST: char = '0';
const DISC_NUMBER: char = '1';
const DISC_TEXT: char = '2';
const DISC_HIGHEST: char = '3';

/// An endpoint of a document-ID range.
///
/// The sentinels bracket every real ID of a type: `Lowest` sorts before any
/// stored ID and `Highest` after. They are only ever used to build range
/// queries; a stored document never carries one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdBound {
    /// Sorts before every stored ID of the type.
    Lowest,
    /// A concrete ID.
    Exact(EntityId),
    /// Sorts after every stored ID of the type.
    Highest,
}

impl From<EntityId> for IdBound {
    fn from(id: EntityId) -> Self {
        Self::Exact(id)
    }
}

fn type_prefix(document_type: &str) -> String {
    document_type.replace('_', "")
}

/// Encodes `(document_type, id)` as a sortable document ID.
///
/// # Errors
///
/// Returns [`CodecError::NumericIdOutOfRange`] for numeric IDs wider than
/// [`MAX_NUMERIC_DIGITS`] decimal digits.
pub fn doc_id(document_type: &str, id: &EntityId) -> CodecResult<String> {
    let mut out = type_prefix(document_type);
    match id {
        EntityId::Number(n) => {
            if *n > MAX_NUMERIC_ID {
                return Err(CodecError::NumericIdOutOfRange {
                    id: *n,
                    max: MAX_NUMERIC_DIGITS,
                });
            }
            let _ = write!(out, "_{DISC_NUMBER}_{n:016}");
        }
        EntityId::Text(s) => {
            let _ = write!(out, "_{DISC_TEXT}_{s}");
        }
    }
    Ok(out)
}

/// Encodes a range endpoint for `document_type`.
///
/// # Errors
///
/// Returns an error for an out-of-range numeric ID in the `Exact` case.
pub fn bound_key(document_type: &str, bound: &IdBound) -> CodecResult<String> {
    match bound {
        IdBound::Lowest => Ok(format!("{}_{DISC_LOWEST}", type_prefix(document_type))),
        IdBound::Exact(id) => doc_id(document_type, id),
        IdBound::Highest => Ok(format!("{}_{DISC_HIGHEST}", type_prefix(document_type))),
    }
}

/// Splits a stored document ID into its type prefix and entity ID.
///
/// Only the number and text discriminators decode; the range sentinels never
/// appear in a stored ID and are rejected.
///
/// # Errors
///
/// Returns an error if the ID does not follow the grammar or carries a
/// sentinel discriminator.
pub fn split_doc_id(raw: &str) -> CodecResult<(&str, EntityId)> {
    let sep = raw.find('_').ok_or_else(|| CodecError::malformed(raw))?;
    let prefix = &raw[..sep];
    let rest = &raw[sep + 1..];

    let disc = rest.chars().next().ok_or_else(|| CodecError::malformed(raw))?;
    match disc {
        DISC_NUMBER | DISC_TEXT => {}
        DISC_LOWEST | DISC_HIGHEST => return Err(CodecError::sentinel(raw)),
        _ => return Err(CodecError::malformed(raw)),
    }

    let payload = rest
        .strip_prefix(disc)
        .and_then(|p| p.strip_prefix('_'))
        .ok_or_else(|| CodecError::malformed(raw))?;

    let id = if disc == DISC_NUMBER {
        let n: u64 = payload.parse().map_err(|_| CodecError::malformed(raw))?;
        EntityId::Number(n)
    } else {
        EntityId::Text(payload.to_owned())
    };

    Ok((prefix, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn numeric_ids_are_zero_padded() {
        let id = doc_id("post", &EntityId::Number(42)).unwrap();
        assert_eq!(id, "post_1_0000000000000042");
    }

    #[test]
    fn text_ids_are_raw() {
        let id = doc_id("post", &EntityId::from("abc123")).unwrap();
        assert_eq!(id, "post_2_abc123");
    }

    #[test]
    fn underscores_are_stripped_from_type() {
        let id = doc_id("blog_post", &EntityId::from("x")).unwrap();
        assert_eq!(id, "blogpost_2_x");
    }

    #[test]
    fn numeric_id_too_wide_is_rejected() {
        let err = doc_id("post", &EntityId::Number(MAX_NUMERIC_ID + 1)).unwrap_err();
        assert!(matches!(err, CodecError::NumericIdOutOfRange { .. }));
    }

    #[test]
    fn bounds_bracket_real_ids() {
        let lowest = bound_key("post", &IdBound::Lowest).unwrap();
        let highest = bound_key("post", &IdBound::Highest).unwrap();
        let num = doc_id("post", &EntityId::Number(0)).unwrap();
        let max_num = doc_id("post", &EntityId::Number(MAX_NUMERIC_ID)).unwrap();
        let text = doc_id("post", &EntityId::from("zzz")).unwrap();

        assert!(lowest < num);
        assert!(num < max_num);
        assert!(max_num < text);
        assert!(text < highest);
    }

    #[test]
    fn split_decodes_numbers() {
        let (prefix, id) = split_doc_id("post_1_0000000000000042").unwrap();
        assert_eq!(prefix, "post");
        assert_eq!(id, EntityId::Number(42));
    }

    #[test]
    fn split_decodes_text_with_underscores() {
        let (prefix, id) = split_doc_id("post_2_my_fancy_id").unwrap();
        assert_eq!(prefix, "post");
        assert_eq!(id, EntityId::from("my_fancy_id"));
    }

    #[test]
    fn split_rejects_sentinels() {
        assert!(matches!(
            split_doc_id("post_0"),
            Err(CodecError::SentinelDocId { .. })
        ));
        assert!(matches!(
            split_doc_id("post_3"),
            Err(CodecError::SentinelDocId { .. })
        ));
    }

    #[test]
    fn split_rejects_garbage() {
        assert!(split_doc_id("no-separator").is_err());
        assert!(split_doc_id("post_9_x").is_err());
        assert!(split_doc_id("post_1_notanumber").is_err());
        assert!(split_doc_id("post_").is_err());
        assert!(split_doc_id("post_1").is_err());
    }

    proptest! {
        #[test]
        fn numeric_round_trip(n in 0u64..=MAX_NUMERIC_ID) {
            let encoded = doc_id("post", &EntityId::Number(n)).unwrap();
            let (prefix, id) = split_doc_id(&encoded).unwrap();
            prop_assert_eq!(prefix, "post");
            prop_assert_eq!(id, EntityId::Number(n));
        }

        #[test]
        fn text_round_trip(s in ".*") {
            let encoded = doc_id("post", &EntityId::from(s.as_str())).unwrap();
            let (prefix, id) = split_doc_id(&encoded).unwrap();
            prop_assert_eq!(prefix, "post");
            prop_assert_eq!(id, EntityId::from(s.as_str()));
        }

        #[test]
        fn numeric_order_matches_lexicographic_order(
            a in 0u64..=MAX_NUMERIC_ID,
            b in 0u64..=MAX_NUMERIC_ID,
        ) {
            let ka = doc_id("post", &EntityId::Number(a)).unwrap();
            let kb = doc_id("post", &EntityId::Number(b)).unwrap();
            prop_assert_eq!(a.cmp(&b), ka.cmp(&kb));
        }

        #[test]
        fn id_order_matches_key_order(
            a in prop_oneof![
                (0u64..=MAX_NUMERIC_ID).prop_map(EntityId::Number),
                "[a-z0-9]{1,12}".prop_map(EntityId::from),
            ],
            b in prop_oneof![
                (0u64..=MAX_NUMERIC_ID).prop_map(EntityId::Number),
                "[a-z0-9]{1,12}".prop_map(EntityId::from),
            ],
        ) {
            let ka = doc_id("post", &a).unwrap();
            let kb = doc_id("post", &b).unwrap();
            prop_assert_eq!(a.cmp(&b), ka.cmp(&kb));
        }
    }
}
