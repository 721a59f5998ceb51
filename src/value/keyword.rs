use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A possibly namespaced identifier such as `account/name` or `admin`.
///
/// Ordering is lexicographic on the full text, which keeps schema maps and
/// pulled records deterministic.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Keyword(String);

impl Keyword {
    /// Build a qualified keyword from a namespace and a name.
    pub fn new(namespace: &str, name: &str) -> Self {
        Keyword(format!("{}/{}", namespace, name))
    }

    /// Build a keyword without a namespace.
    pub fn plain(name: &str) -> Self {
        Keyword(name.to_string())
    }

    /// The part before the last `/`, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.0.rfind('/').map(|idx| &self.0[..idx])
    }

    /// The part after the last `/`, or the whole text when unqualified.
    pub fn name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.namespace().is_some()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl FromStr for Keyword {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.strip_prefix(':').unwrap_or(s);
        if text.is_empty() || text.starts_with('/') || text.ends_with('/') {
            return Err(format!("invalid keyword '{}'", s));
        }
        Ok(Keyword(text.to_string()))
    }
}

impl From<&str> for Keyword {
    /// Accepts `ns/name`, `:ns/name` or a bare `name`.
    fn from(value: &str) -> Self {
        Keyword(value.strip_prefix(':').unwrap_or(value).to_string())
    }
}

impl Serialize for Keyword {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Keyword {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Built-in store attributes.
pub mod builtin {
    use super::Keyword;

    /// The store's internal entity id, as it appears in pulled records.
    pub fn db_id() -> Keyword {
        Keyword::new("db", "id")
    }

    /// The symbolic identifier of an entity (used by enum materialization).
    pub fn db_ident() -> Keyword {
        Keyword::new("db", "ident")
    }
}
