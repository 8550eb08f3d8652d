use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn to_hash_map(&self) -> HashMap<String, String> {
        self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// `None` when empty, so create calls can pass it straight to `set_tags`.
    pub fn to_optional_map(&self) -> Option<HashMap<String, String>> {
        if self.is_empty() { None } else { Some(self.to_hash_map()) }
    }
}

impl From<HashMap<String, String>> for Tags {
    fn from(value: HashMap<String, String>) -> Self {
        Tags(value.into_iter().collect())
    }
}

impl From<Option<HashMap<String, String>>> for Tags {
    fn from(value: Option<HashMap<String, String>>) -> Self {
        value.map(Tags::from).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Tags(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// From a pair of tag sets, determine the keys to untag and the tags to
/// (re)apply, respectively.
pub fn tag_diff(old_tags: &Tags, new_tags: &Tags) -> (Vec<String>, Tags) {
    let remove_keys = old_tags
        .0
        .keys()
        .filter(|k| !new_tags.0.contains_key(*k))
        .cloned()
        .collect();

    let upsert = new_tags
        .0
        .iter()
        .filter(|(k, v)| old_tags.0.get(*k) != Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    (remove_keys, upsert)
}
