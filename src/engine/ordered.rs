use std::collections::HashSet;

/// Insertion-ordered string set used wherever a reordering step must
/// deduplicate while keeping the position of the first occurrence. Carried
/// as an explicit value instead of leaning on a map type's iteration order.
#[derive(Debug, Default)]
pub struct OrderedSet {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl OrderedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the item was already present; the original
    /// position is kept either way.
    pub fn insert(&mut self, item: &str) -> bool {
        if self.seen.contains(item) {
            return false;
        }
        self.seen.insert(item.to_string());
        self.items.push(item.to_string());
        true
    }

    pub fn contains(&self, item: &str) -> bool {
        self.seen.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_first_occurrence_position() {
        let mut set = OrderedSet::new();
        assert!(set.insert("b"));
        assert!(set.insert("a"));
        assert!(!set.insert("b"));
        assert!(set.insert("c"));

        assert_eq!(set.into_vec(), vec!["b", "a", "c"]);
    }

    #[test]
    fn contains_and_len_track_inserts() {
        let mut set = OrderedSet::new();
        assert!(set.is_empty());
        set.insert("x");
        set.insert("x");
        assert!(set.contains("x"));
        assert!(!set.contains("y"));
        assert_eq!(set.len(), 1);
    }
}
