use serde::{Deserialize, Serialize};

/// Stable index into an [`Arena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArenaIndex(u32);

impl ArenaIndex {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Append-only arena. Indices stay valid for the arena's lifetime.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, v: T) -> ArenaIndex {
        let idx = ArenaIndex(self.items.len() as u32);
        self.items.push(v);
        idx
    }

    pub fn get(&self, idx: ArenaIndex) -> Option<&T> {
        self.items.get(idx.index())
    }

    pub fn get_mut(&mut self, idx: ArenaIndex) -> Option<&mut T> {
        self.items.get_mut(idx.index())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArenaIndex, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, v)| (ArenaIndex(i as u32), v))
    }
}
