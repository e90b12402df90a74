//! Insertion-ordered query parameters.
//!
//! The server rebuilds the signing string from the query exactly as it was
//! sent, so parameter order is part of the signature. [`QueryParams`] keeps
//! keys in insertion order; overwriting a key keeps its original position.

/// An ordered mapping of query parameter names to values.
///
/// # Examples
///
/// ```
/// use bsdtools_auth::QueryParams;
///
/// let mut query = QueryParams::new();
/// query.set("b", "1");
/// query.set("a", "2");
/// query.set("b", "3");
///
/// let keys: Vec<&str> = query.iter().map(|(k, _)| k).collect();
/// assert_eq!(keys, ["b", "a"]);
/// assert_eq!(query.get("b"), Some("3"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing the value in place if the key already exists.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Get the value of a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the parameter is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Remove a parameter, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.pairs.iter().position(|(k, _)| k == key)?;
        Some(self.pairs.remove(idx).1)
    }

    /// Iterate over `(key, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Self::new();
        for (k, v) in iter {
            query.set(k, v);
        }
        query
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for QueryParams {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_preserve_insertion_order() {
        let query: QueryParams = [("z", "1"), ("a", "2"), ("m", "3")].into_iter().collect();
        let keys: Vec<&str> = query.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_should_overwrite_in_place() {
        let mut query: QueryParams = [("api_id", "old"), ("cons_ids", "1")].into_iter().collect();
        query.set("api_id", "new");
        assert_eq!(
            query.iter().collect::<Vec<_>>(),
            [("api_id", "new"), ("cons_ids", "1")]
        );
    }

    #[test]
    fn test_should_remove_parameter() {
        let mut query: QueryParams = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(query.remove("a").as_deref(), Some("1"));
        assert!(!query.contains_key("a"));
        assert_eq!(query.len(), 1);
        assert!(query.remove("missing").is_none());
    }
}
