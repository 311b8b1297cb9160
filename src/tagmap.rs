//! Node name → tag list mapping produced by the block parser.
use std::collections::HashMap;
use std::collections::hash_map;

/// Tags collected per node. Values keep input order; duplicates are kept.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagMapping {
    entries: HashMap<String, Vec<String>>,
}

impl TagMapping {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Insert or replace the entry for `node`.
    pub fn insert(&mut self, node: impl Into<String>, tags: Vec<String>) {
        self.entries.insert(node.into(), tags);
    }

    pub fn get(&self, node: &str) -> Option<&[String]> {
        self.entries.get(node).map(Vec::as_slice)
    }

    pub fn contains(&self, node: &str) -> bool {
        self.entries.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in arbitrary order. Use `report` for sorted output.
    pub fn iter(&self) -> hash_map::Iter<'_, String, Vec<String>> {
        self.entries.iter()
    }

    /// Total number of tag values across all nodes.
    pub fn tag_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

impl<'a> IntoIterator for &'a TagMapping {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = hash_map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<(String, Vec<String>)> for TagMapping {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
