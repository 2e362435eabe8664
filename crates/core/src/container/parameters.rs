use std::collections::BTreeMap;

use crate::container::value::Value;

/// Nested key-value store for container parameters.
///
/// Lookups try the exact top-level key first and then walk a dotted path
/// through nested maps, so `director.age` finds `{"director": {"age": 26}}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBag {
    data: BTreeMap<String, Value>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all parameters
    pub fn set_parameters(&mut self, parameters: BTreeMap<String, Value>) {
        self.data = parameters;
    }

    /// Add parameters, replacing top-level keys that already exist
    pub fn add_parameters(&mut self, parameters: BTreeMap<String, Value>) {
        self.data.extend(parameters);
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(name.into(), value.into());
    }

    /// Look up a parameter by exact name or dotted path
    pub fn get(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.data.get(name) {
            return Some(value);
        }

        let mut segments = name.split('.');
        let first = segments.next()?;
        segments.try_fold(self.data.get(first)?, |current, segment| current.child(segment))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.data.remove(name)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get all parameters
    pub fn to_map(&self) -> &BTreeMap<String, Value> {
        &self.data
    }
}

impl From<BTreeMap<String, Value>> for ParameterBag {
    fn from(data: BTreeMap<String, Value>) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag() -> ParameterBag {
        let mut bag = ParameterBag::new();
        bag.set_parameter("directorName", "James");
        bag.set_parameter(
            "director",
            Value::Map(BTreeMap::from([("age".to_string(), Value::Int(26))])),
        );
        bag
    }

    #[test]
    fn test_exact_and_dotted_lookup() {
        let bag = bag();
        assert_eq!(bag.get("directorName"), Some(&Value::from("James")));
        assert_eq!(bag.get("director.age"), Some(&Value::Int(26)));
        assert_eq!(bag.get("director.height"), None);
        assert_eq!(bag.get("missing"), None);
    }

    #[test]
    fn test_exact_key_wins_over_path() {
        let mut bag = bag();
        bag.set_parameter("director.age", 30);
        assert_eq!(bag.get("director.age"), Some(&Value::Int(30)));
    }

    #[test]
    fn test_set_and_add_parameters() {
        let mut bag = ParameterBag::new();
        bag.set_parameters(BTreeMap::from([("foo".to_string(), Value::from("bar"))]));
        assert_eq!(bag.get("foo"), Some(&Value::from("bar")));

        bag.add_parameters(BTreeMap::from([
            ("foo".to_string(), Value::from("baz")),
            ("bar".to_string(), Value::from("baz")),
        ]));
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("foo"), Some(&Value::from("baz")));
    }
}
