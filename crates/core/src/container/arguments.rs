use std::fmt;

use crate::container::value::Value;

/// Key of a raw argument: a parameter position or a parameter name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArgumentKey {
    Index(usize),
    Name(String),
}

impl ArgumentKey {
    pub fn is_index(&self) -> bool {
        matches!(self, ArgumentKey::Index(_))
    }
}

impl fmt::Display for ArgumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentKey::Index(index) => write!(f, "{}", index),
            ArgumentKey::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<usize> for ArgumentKey {
    fn from(index: usize) -> Self {
        ArgumentKey::Index(index)
    }
}

impl From<&str> for ArgumentKey {
    fn from(name: &str) -> Self {
        ArgumentKey::Name(name.to_string())
    }
}

impl From<String> for ArgumentKey {
    fn from(name: String) -> Self {
        ArgumentKey::Name(name)
    }
}

/// Ordered mapping of raw argument values keyed by position or name.
///
/// Insertion order is kept: the first key decides whether binding is
/// positional only (see `is_positional`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    entries: Vec<(ArgumentKey, Value)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build positional arguments from a list of values
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| (ArgumentKey::Index(index), value.into()))
            .collect()
    }

    /// Build named arguments from `(name, value)` pairs
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        pairs
            .into_iter()
            .map(|(name, value)| (ArgumentKey::Name(name.into()), value.into()))
            .collect()
    }

    /// Append a value at the next free position
    pub fn push(&mut self, value: impl Into<Value>) -> &mut Self {
        let next = self
            .entries
            .iter()
            .filter_map(|(key, _)| match key {
                ArgumentKey::Index(index) => Some(index + 1),
                ArgumentKey::Name(_) => None,
            })
            .max()
            .unwrap_or(0);
        self.entries.push((ArgumentKey::Index(next), value.into()));
        self
    }

    /// Set a value, replacing any previous value under the same key
    pub fn set(&mut self, key: impl Into<ArgumentKey>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &ArgumentKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.entries.iter().find_map(|(key, value)| match key {
            ArgumentKey::Index(i) if *i == index => Some(value),
            _ => None,
        })
    }

    pub fn get_name(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find_map(|(key, value)| match key {
            ArgumentKey::Name(n) if n == name => Some(value),
            _ => None,
        })
    }

    pub fn first_key(&self) -> Option<&ArgumentKey> {
        self.entries.first().map(|(key, _)| key)
    }

    /// Whether the first key is numeric; binding then matches by position only
    pub fn is_positional(&self) -> bool {
        self.first_key().is_some_and(ArgumentKey::is_index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArgumentKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Map every value, keeping keys and order; stops at the first error
    pub fn try_map<F, E>(&self, mut f: F) -> Result<Arguments, E>
    where
        F: FnMut(&Value) -> Result<Value, E>,
    {
        let entries = self
            .entries
            .iter()
            .map(|(key, value)| f(value).map(|resolved| (key.clone(), resolved)))
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Arguments { entries })
    }
}

impl FromIterator<(ArgumentKey, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (ArgumentKey, Value)>>(iter: I) -> Self {
        let mut arguments = Arguments::new();
        for (key, value) in iter {
            arguments.set(key, value);
        }
        arguments
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Arguments::positional(values)
    }
}
