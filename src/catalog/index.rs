//! Key to position index over the entry sequence

use std::collections::HashMap;

use super::entry::{Entry, Key};

#[derive(Debug, Clone, Default)]
pub(crate) struct KeyIndex {
    positions: HashMap<Key, usize>,
}

impl KeyIndex {
    /// Index a sequence; active entries take precedence over retired ones
    /// with the same key, and earlier entries over later ones.
    pub fn build(entries: &[Entry]) -> Self {
        let mut positions = HashMap::with_capacity(entries.len());
        for active in [true, false] {
            for (pos, entry) in entries.iter().enumerate() {
                if entry.is_active() == active {
                    positions.entry(entry.key()).or_insert(pos);
                }
            }
        }
        Self { positions }
    }

    pub fn get(&self, key: &Key) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn insert(&mut self, key: Key, pos: usize) {
        self.positions.insert(key, pos);
    }

    pub fn remove(&mut self, key: &Key) -> Option<usize> {
        self.positions.remove(key)
    }

    /// Account for an entry inserted at `at`.
    pub fn shift_up(&mut self, at: usize) {
        for pos in self.positions.values_mut() {
            if *pos >= at {
                *pos += 1;
            }
        }
    }

    /// Account for the entry at `at` having been removed.
    pub fn shift_down(&mut self, at: usize) {
        for pos in self.positions.values_mut() {
            if *pos > at {
                *pos -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prefers_active() {
        let entries = vec![
            Entry::new("a").retired(),
            Entry::new("b"),
            Entry::new("a"),
        ];
        let index = KeyIndex::build(&entries);
        assert_eq!(index.get(&Key::new("", "a")), Some(2));
        assert_eq!(index.get(&Key::new("", "b")), Some(1));
        assert_eq!(index.get(&Key::new("", "c")), None);
    }

    #[test]
    fn test_shifts() {
        let entries = vec![Entry::new("a"), Entry::new("b"), Entry::new("c")];
        let mut index = KeyIndex::build(&entries);
        index.shift_up(1);
        assert_eq!(index.get(&Key::new("", "a")), Some(0));
        assert_eq!(index.get(&Key::new("", "b")), Some(2));

        index.remove(&Key::new("", "b"));
        index.shift_down(2);
        assert_eq!(index.get(&Key::new("", "c")), Some(2));
        assert_eq!(index.get(&Key::new("", "b")), None);
    }
}
