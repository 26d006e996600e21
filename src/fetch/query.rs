//! Immutable query parameter lists.

use chrono::NaiveDate;

/// Name of the query parameter carrying the caller's API key.
pub const API_KEY_PARAM: &str = "api_key";

/// Ordered `name=value` pairs for one request.
///
/// Built once through [`QueryBuilder`] and never mutated afterwards. The
/// `api_key` pair is always present and is redacted from [`Debug`] output.
#[derive(Clone, PartialEq, Eq)]
pub struct QueryParameters {
    pairs: Vec<(String, String)>,
}

impl QueryParameters {
    /// Starts a parameter list for the given API key.
    #[must_use]
    pub fn builder(api_key: &str) -> QueryBuilder {
        QueryBuilder {
            pairs: Vec::new(),
            api_key: api_key.to_string(),
        }
    }

    /// Returns the value for `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over the pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of pairs, including `api_key`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True only for an empty list; lists from [`QueryBuilder::build`]
    /// always carry an API key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl std::fmt::Debug for QueryParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.pairs {
            if key == API_KEY_PARAM {
                map.entry(key, &"***");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

/// Builder for [`QueryParameters`].
pub struct QueryBuilder {
    pairs: Vec<(String, String)>,
    api_key: String,
}

impl std::fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("pairs", &self.pairs)
            .field("api_key", &"***")
            .finish()
    }
}

impl QueryBuilder {
    /// Adds a string parameter.
    #[must_use]
    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.pairs.push((name.to_string(), value.into()));
        self
    }

    /// Adds a date parameter formatted as `YYYY-MM-DD`.
    #[must_use]
    pub fn date(self, name: &str, value: NaiveDate) -> Self {
        self.text(name, value.format("%Y-%m-%d").to_string())
    }

    /// Adds an integer parameter.
    #[must_use]
    pub fn integer(self, name: &str, value: impl Into<i64>) -> Self {
        self.text(name, value.into().to_string())
    }

    /// Adds a string parameter when `value` is `Some`.
    #[must_use]
    pub fn optional_text(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    /// Finishes the list, appending `api_key` last.
    #[must_use]
    pub fn build(mut self) -> QueryParameters {
        self.pairs.push((API_KEY_PARAM.to_string(), self.api_key));
        QueryParameters { pairs: self.pairs }
    }
}
