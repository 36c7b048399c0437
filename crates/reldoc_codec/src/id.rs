//! Entity identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an entity within its type.
///
/// Entity IDs are either numbers or text. The derived ordering is the
/// collation ordering of the encoded form: every number sorts before every
/// string, numbers sort numerically, strings sort lexicographically.
///
/// Serde representation is the bare value (`42`, `"abc123"`), so IDs
/// round-trip through document fields unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    /// Numeric ID. Limited to [`crate::MAX_NUMERIC_DIGITS`] decimal digits.
    Number(u64),
    /// Text ID.
    Text(String),
}

impl EntityId {
    /// Returns the numeric value, if this is a numeric ID.
    #[must_use]
    pub const fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Returns the text value, if this is a text ID.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<u32> for EntityId {
    fn from(n: u32) -> Self {
        Self::Number(u64::from(n))
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}
