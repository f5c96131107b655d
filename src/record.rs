//! Flat key/value records.

use std::sync::Arc;

use ahash::AHashMap;

/// One flat record: resolved field labels mapped to field values.
///
/// Keys are unique; insertion order is preserved so repeated runs produce
/// columns in a reproducible order. Keys and values are shared `Arc<str>`
/// instances handed out by the canonicalization cache, so cloning a record
/// (the duplicate-parent path) copies pointers, not string content.
#[derive(Debug, Clone, Default)]
pub struct FlatRecord {
    index: AHashMap<Arc<str>, usize>,
    fields: Vec<(Arc<str>, Arc<str>)>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.index.get(label).map(|&i| &*self.fields[i].1)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Insert or overwrite a field. A new label appends; an existing label
    /// keeps its position and takes the new value.
    pub fn insert(&mut self, label: Arc<str>, value: Arc<str>) {
        if let Some(&i) = self.index.get(&*label) {
            self.fields[i].1 = value;
        } else {
            self.index.insert(Arc::clone(&label), self.fields.len());
            self.fields.push((label, value));
        }
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(label, value)| (&**label, &**value))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(label, _)| &**label)
    }
}

impl PartialEq for FlatRecord {
    /// Content equality over (label, value) pairs in insertion order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut record = FlatRecord::new();
        record.insert(arc("b"), arc("2"));
        record.insert(arc("a"), arc("1"));
        record.insert(arc("c"), arc("3"));
        let labels: Vec<&str> = record.labels().collect();
        assert_eq!(labels, vec!["b", "a", "c"]);
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut record = FlatRecord::new();
        record.insert(arc("a"), arc("1"));
        record.insert(arc("b"), arc("2"));
        record.insert(arc("a"), arc("9"));
        assert_eq!(record.get("a"), Some("9"));
        assert_eq!(record.len(), 2);
        let labels: Vec<&str> = record.labels().collect();
        assert_eq!(labels, vec!["a", "b"]);
    }

    #[test]
    fn clone_is_independent() {
        let mut base = FlatRecord::new();
        base.insert(arc("a"), arc("1"));
        let mut copy = base.clone();
        copy.insert(arc("b"), arc("2"));
        assert_eq!(base.len(), 1);
        assert_eq!(copy.len(), 2);
        assert_eq!(base.get("b"), None);
    }

    #[test]
    fn content_equality() {
        let mut a = FlatRecord::new();
        a.insert(arc("x"), arc("1"));
        let mut b = FlatRecord::new();
        b.insert(arc("x"), arc("1"));
        assert_eq!(a, b);
        b.insert(arc("y"), arc("2"));
        assert_ne!(a, b);
    }
}
