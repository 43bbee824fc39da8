//! Typed selectors for ad-hoc queries over the raw document collection.
//!
//! A [`Selector`] is the backend-neutral form of a filter. Backends either
//! evaluate it directly ([`Selector::matches`]) or translate it to their own
//! query language ([`Selector::to_mango`] for CouchDB `_find`).

use serde_json::{Map, Value, json};

/// A filter over JSON documents.
///
/// Field names may be dotted paths (`"a.b"`) into nested objects.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// The field equals the value.
    Eq {
        /// Field path.
        field: String,
        /// Expected value.
        value: Value,
    },
    /// The field is an array containing the value.
    Contains {
        /// Field path.
        field: String,
        /// Element that must be present.
        value: Value,
    },
    /// The field is an array containing every value.
    ContainsAll {
        /// Field path.
        field: String,
        /// Elements that must all be present.
        values: Vec<Value>,
    },
    /// Every inner selector matches.
    And(Vec<Selector>),
}

impl Selector {
    /// Field equality.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Array membership.
    #[must_use]
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Array superset.
    #[must_use]
    pub fn contains_all<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::ContainsAll {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Conjunction of `self` and `other`, flattening nested conjunctions.
    #[must_use]
    pub fn and(self, other: Selector) -> Self {
        let mut parts = match self {
            Self::And(parts) => parts,
            single => vec![single],
        };
        match other {
            Self::And(more) => parts.extend(more),
            single => parts.push(single),
        }
        Self::And(parts)
    }

    /// Evaluates the selector against a document.
    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Self::Eq { field, value } => lookup(document, field) == Some(value),
            Self::Contains { field, value } => lookup(document, field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
            Self::ContainsAll { field, values } => lookup(document, field)
                .and_then(Value::as_array)
                .is_some_and(|items| values.iter().all(|v| items.contains(v))),
            Self::And(parts) => parts.iter().all(|part| part.matches(document)),
        }
    }

    /// Renders the selector as a CouchDB Mango selector.
    #[must_use]
    pub fn to_mango(&self) -> Value {
        match self {
            Self::Eq { field, value } => single(field, json!({ "$eq": value })),
            Self::Contains { field, value } => {
                single(field, json!({ "$elemMatch": { "$eq": value } }))
            }
            Self::ContainsAll { field, values } => single(field, json!({ "$all": values })),
            Self::And(parts) => {
                json!({ "$and": parts.iter().map(Selector::to_mango).collect::<Vec<_>>() })
            }
        }
    }
}

fn single(field: &str, condition: Value) -> Value {
    let mut map = Map::new();
    map.insert(field.to_string(), condition);
    Value::Object(map)
}

fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Value {
        json!({
            "_id": "t1",
            "discriminator": "openiddict.token",
            "subject": "alice",
            "scopes": ["openid", "profile"],
            "nested": { "status": "valid" }
        })
    }

    #[test]
    fn test_eq_and_nested_path() {
        assert!(Selector::eq("subject", "alice").matches(&token()));
        assert!(!Selector::eq("subject", "bob").matches(&token()));
        assert!(Selector::eq("nested.status", "valid").matches(&token()));
        assert!(!Selector::eq("missing", "x").matches(&token()));
    }

    #[test]
    fn test_contains_and_contains_all() {
        assert!(Selector::contains("scopes", "openid").matches(&token()));
        assert!(!Selector::contains("scopes", "email").matches(&token()));
        assert!(!Selector::contains("subject", "alice").matches(&token()));

        assert!(Selector::contains_all("scopes", ["openid", "profile"]).matches(&token()));
        assert!(!Selector::contains_all("scopes", ["openid", "email"]).matches(&token()));
        assert!(Selector::contains_all("scopes", Vec::<String>::new()).matches(&token()));
    }

    #[test]
    fn test_and_flattens() {
        let selector = Selector::eq("discriminator", "openiddict.token")
            .and(Selector::eq("subject", "alice"))
            .and(Selector::contains("scopes", "openid"));

        match &selector {
            Selector::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected conjunction, got {other:?}"),
        }
        assert!(selector.matches(&token()));
    }

    #[test]
    fn test_to_mango() {
        let selector = Selector::eq("discriminator", "openiddict.application")
            .and(Selector::contains("redirect_uris", "https://app/cb"));

        assert_eq!(
            selector.to_mango(),
            json!({
                "$and": [
                    { "discriminator": { "$eq": "openiddict.application" } },
                    { "redirect_uris": { "$elemMatch": { "$eq": "https://app/cb" } } }
                ]
            })
        );
        assert_eq!(
            Selector::contains_all("scopes", ["a", "b"]).to_mango(),
            json!({ "scopes": { "$all": ["a", "b"] } })
        );
    }
}
