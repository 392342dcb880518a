//! Endpoint table and `{name}` template substitution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT_KEY: &str = "getModel";
pub const DEFAULT_ENDPOINT_TEMPLATE: &str = "/user/{id}";

/// Immutable mapping from endpoint key to URL path template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointTable {
    entries: BTreeMap<String, String>,
}

impl EndpointTable {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn with_endpoint(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.entries.insert(key.into(), template.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for EndpointTable {
    fn default() -> Self {
        Self::empty().with_endpoint(DEFAULT_ENDPOINT_KEY, DEFAULT_ENDPOINT_TEMPLATE)
    }
}

impl<K, V> FromIterator<(K, V)> for EndpointTable
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Result of expanding a template against a set of path parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitution {
    pub path: String,
    /// Placeholder names left in `path` because no parameter matched, in
    /// order of first appearance.
    pub unresolved: Vec<String>,
}

impl Substitution {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Expands every `{name}` in `template` whose name is a key of `params`.
///
/// The template is scanned once, left to right. Inserted values are never
/// rescanned, so a value containing `{other}` ends up in the path verbatim.
/// Unmatched placeholders, `{}` and unbalanced braces are copied unchanged.
pub fn substitute(template: &str, params: &BTreeMap<String, String>) -> Substitution {
    let mut path = String::with_capacity(template.len());
    let mut unresolved: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        path.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            rest = &rest[open..];
            break;
        };
        let name = &after[..close];

        // "{a{b}": the outer brace is literal, rescan from the inner one
        if let Some(inner) = name.find('{') {
            path.push('{');
            path.push_str(&name[..inner]);
            rest = &after[inner..];
            continue;
        }

        match params.get(name) {
            Some(value) if !name.is_empty() => path.push_str(value),
            _ => {
                path.push('{');
                path.push_str(name);
                path.push('}');
                if !name.is_empty() && !unresolved.iter().any(|n| n == name) {
                    unresolved.push(name.to_owned());
                }
            }
        }
        rest = &after[close + 1..];
    }
    path.push_str(rest);

    Substitution { path, unresolved }
}

/// Placeholder names in `template`, in order of first appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    substitute(template, &BTreeMap::new()).unresolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn default_table_has_the_model_endpoint() {
        let table = EndpointTable::default();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("getModel"), Some("/user/{id}"));
        assert!(!table.contains("getUser"));
    }

    #[test]
    fn replaces_single_placeholder() {
        let out = substitute("/user/{id}", &params(&[("id", "42")]));
        assert_eq!(out.path, "/user/42");
        assert!(out.is_complete());
    }

    #[test]
    fn replaces_every_occurrence() {
        let out = substitute("/a/{id}/b/{id}", &params(&[("id", "7")]));
        assert_eq!(out.path, "/a/7/b/7");
    }

    #[test]
    fn leaves_unknown_placeholders_verbatim() {
        let out = substitute("/org/{org}/user/{id}/{org}", &params(&[("id", "1")]));
        assert_eq!(out.path, "/org/{org}/user/1/{org}");
        assert_eq!(out.unresolved, vec!["org".to_string()]);
    }

    #[test]
    fn inserted_values_are_not_rescanned() {
        let out = substitute("/{a}/{b}", &params(&[("a", "{b}"), ("b", "x")]));
        assert_eq!(out.path, "/{b}/x");
        assert!(out.is_complete());
    }

    #[test]
    fn values_are_inserted_without_escaping() {
        let out = substitute("/user/{id}", &params(&[("id", "a b/c?d=1")]));
        assert_eq!(out.path, "/user/a b/c?d=1");
    }

    #[test]
    fn unused_params_are_ignored() {
        let out = substitute("/health", &params(&[("id", "1")]));
        assert_eq!(out.path, "/health");
    }

    #[test]
    fn malformed_braces_are_copied() {
        let p = params(&[("id", "9")]);
        assert_eq!(substitute("/user/{id", &p).path, "/user/{id");
        assert_eq!(substitute("/user/id}", &p).path, "/user/id}");
        assert_eq!(substitute("/user/{}", &p).path, "/user/{}");
        assert_eq!(substitute("/user/{x{id}", &p).path, "/user/{x9");
    }

    #[test]
    fn lists_placeholders_once_in_order() {
        assert_eq!(
            placeholders("/{b}/{a}/{b}"),
            vec!["b".to_string(), "a".to_string()]
        );
        assert!(placeholders("/static").is_empty());
    }
}
