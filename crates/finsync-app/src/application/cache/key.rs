use std::collections::BTreeMap;
use std::fmt;

/// Structural identity of a cached query.
///
/// `scope` is the resource path (`["transactions"]`, `["goals", "42",
/// "contributions"]`). Filter parameters live in a sorted map so the order
/// they were supplied in does not matter; the pagination cursor is kept
/// apart and always compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    scope: Vec<String>,
    params: BTreeMap<String, String>,
    cursor: Option<String>,
}

impl QueryKey {
    pub fn new(resource: &str) -> Self {
        Self {
            scope: vec![resource.to_string()],
            params: BTreeMap::new(),
            cursor: None,
        }
    }

    pub fn segment(mut self, segment: impl fmt::Display) -> Self {
        self.scope.push(segment.to_string());
        self
    }

    /// Empty values are treated as absent
    pub fn param(mut self, name: &str, value: impl fmt::Display) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.params.insert(name.to_string(), value);
        }
        self
    }

    pub fn param_opt<V: fmt::Display>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self,
        }
    }

    pub fn cursor(mut self, cursor: impl fmt::Display) -> Self {
        self.cursor = Some(cursor.to_string());
        self
    }

    pub fn resource(&self) -> &str {
        &self.scope[0]
    }

    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn cursor_value(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn matches(&self, prefix: &KeyPrefix) -> bool {
        self.scope.starts_with(&prefix.segments)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scope.join("/"))?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, name, value)?;
        }
        if let Some(cursor) = &self.cursor {
            write!(f, "#{}", cursor)?;
        }
        Ok(())
    }
}

/// Leading scope segments selecting a family of cached queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPrefix {
    segments: Vec<String>,
}

impl KeyPrefix {
    pub fn new(resource: &str) -> Self {
        Self {
            segments: vec![resource.to_string()],
        }
    }

    pub fn segment(mut self, segment: impl fmt::Display) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    /// Matches every key
    pub fn all() -> Self {
        Self {
            segments: Vec::new(),
        }
    }
}

impl From<&str> for KeyPrefix {
    fn from(resource: &str) -> Self {
        KeyPrefix::new(resource)
    }
}

impl From<&QueryKey> for KeyPrefix {
    fn from(key: &QueryKey) -> Self {
        Self {
            segments: key.scope.clone(),
        }
    }
}

impl fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "*");
        }
        write!(f, "{}/*", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_order_does_not_matter() {
        let a = QueryKey::new("transactions")
            .param("type", "expense")
            .param("category_id", 3);
        let b = QueryKey::new("transactions")
            .param("category_id", 3)
            .param("type", "expense");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "transactions?category_id=3&type=expense");
    }

    #[test]
    fn test_empty_params_are_dropped() {
        let a = QueryKey::new("transactions").param("search", "");
        let b = QueryKey::new("transactions").param_opt::<&str>("search", None);
        assert_eq!(a, QueryKey::new("transactions"));
        assert_eq!(b, QueryKey::new("transactions"));
    }

    #[test]
    fn test_cursor_distinguishes_keys() {
        let page1 = QueryKey::new("transactions").cursor(1);
        let page2 = QueryKey::new("transactions").cursor(2);
        assert_ne!(page1, page2);
        assert_eq!(page2.to_string(), "transactions#2");
    }

    #[test]
    fn test_prefix_matching() {
        let goal = QueryKey::new("goals").segment(42);
        let contributions = QueryKey::new("goals").segment(42).segment("contributions");
        let other = QueryKey::new("goals").segment(7);

        let prefix = KeyPrefix::new("goals").segment(42);
        assert!(goal.matches(&prefix));
        assert!(contributions.matches(&prefix));
        assert!(!other.matches(&prefix));
        assert!(other.matches(&KeyPrefix::from("goals")));
        assert!(other.matches(&KeyPrefix::all()));
        assert!(!QueryKey::new("goalsx").matches(&KeyPrefix::from("goals")));
    }
}
