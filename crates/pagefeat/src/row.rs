// ABOUTME: FeatureValue and FeatureRow: the per-document extraction result keyed by feature name.
// ABOUTME: Values serialize untagged so rows render as plain JSON objects or CSV cells.

use std::fmt;

use indexmap::map::{self, IndexMap};

use serde::{Deserialize, Serialize};

/// One extracted value: a match count or a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Count(usize),
    Text(String),
}

impl FeatureValue {
    pub fn as_count(&self) -> Option<usize> {
        match self {
            FeatureValue::Count(n) => Some(*n),
            FeatureValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Count(_) => None,
            FeatureValue::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Count(n) => write!(f, "{}", n),
            FeatureValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<usize> for FeatureValue {
    fn from(n: usize) -> Self {
        FeatureValue::Count(n)
    }
}

impl From<String> for FeatureValue {
    fn from(s: String) -> Self {
        FeatureValue::Text(s)
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        FeatureValue::Text(s.to_string())
    }
}

/// The features extracted from one document, plus any meta values attached to it.
///
/// Names keep insertion order, so rows serialize in the order features were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRow {
    values: IndexMap<String, FeatureValue>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, returning the previous one if the name was already present.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FeatureValue>,
    ) -> Option<FeatureValue> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    pub fn count(&self, name: &str) -> Option<usize> {
        self.get(name).and_then(FeatureValue::as_count)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FeatureValue::as_text)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> map::Iter<'_, String, FeatureValue> {
        self.values.iter()
    }
}

impl<'a> IntoIterator for &'a FeatureRow {
    type Item = (&'a String, &'a FeatureValue);
    type IntoIter = map::Iter<'a, String, FeatureValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl IntoIterator for FeatureRow {
    type Item = (String, FeatureValue);
    type IntoIter = map::IntoIter<String, FeatureValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<K: Into<String>, V: Into<FeatureValue>> Extend<(K, V)> for FeatureRow {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Into<String>, V: Into<FeatureValue>> FromIterator<(K, V)> for FeatureRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = FeatureRow::new();
        row.extend(iter);
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_as_flat_object() {
        let row: FeatureRow = [
            ("num_forms", FeatureValue::Count(2)),
            ("title_text", FeatureValue::from("Hello")),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"num_forms":2,"title_text":"Hello"}"#);

        let back: FeatureRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back.count("num_forms"), Some(2));
        assert_eq!(back.text("title_text"), Some("Hello"));
    }

    #[test]
    fn serializes_in_insertion_order() {
        let row: FeatureRow = [
            ("requested_url", FeatureValue::from("http://a/")),
            ("zeta_forms", FeatureValue::Count(1)),
            ("alpha_text", FeatureValue::from("x")),
        ]
        .into_iter()
        .collect();

        let names: Vec<&str> = row.names().collect();
        assert_eq!(names, vec!["requested_url", "zeta_forms", "alpha_text"]);
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"requested_url":"http://a/","zeta_forms":1,"alpha_text":"x"}"#
        );
    }

    #[test]
    fn equality_ignores_order() {
        let a: FeatureRow = [("x", 1usize), ("y", 2usize)].into_iter().collect();
        let b: FeatureRow = [("y", 2usize), ("x", 1usize)].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn typed_accessors_do_not_cross_kinds() {
        let mut row = FeatureRow::new();
        row.insert("n", 3usize);
        row.insert("t", "x");
        assert_eq!(row.text("n"), None);
        assert_eq!(row.count("t"), None);
        assert_eq!(row.get("n").unwrap().to_string(), "3");
    }
}
