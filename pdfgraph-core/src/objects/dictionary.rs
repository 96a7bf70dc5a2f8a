use crate::objects::primitive::normalize_name;
use crate::objects::Object;
use indexmap::IndexMap;

/// Name-keyed map that keeps keys in first-insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    entries: IndexMap<String, Object>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Inserts or overwrites a key. An overwritten key keeps its position.
    pub fn set(&mut self, key: impl AsRef<str>, value: impl Into<Object>) {
        self.entries
            .insert(normalize_name(key.as_ref()).to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.entries.get(normalize_name(key))
    }

    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.entries.shift_remove(normalize_name(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(normalize_name(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Object> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Object)> {
        self.entries.iter()
    }
}

impl FromIterator<(String, Object)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (String, Object)>>(iter: T) -> Self {
        let mut dict = Dictionary::new();
        for (key, value) in iter {
            dict.set(key, value);
        }
        dict
    }
}
