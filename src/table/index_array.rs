//! Rows ordered by index OID.

use crate::oid::Oid;

/// Rows keyed by their index OID, kept in OID order.
///
/// Inserts append and mark the array unsorted; the next lookup sorts it once.
/// Bulk loading a table therefore costs one sort instead of one shift per
/// row. Because lookups may sort, they take `&mut self`.
///
/// Keys are unique: inserting a key that is already present replaces its row
/// once the array is next sorted.
#[derive(Debug, Clone)]
pub struct OrderedIndexArray<V> {
    entries: Vec<(Oid, V)>,
    dirty: bool,
}

impl<V> OrderedIndexArray<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            dirty: false,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            dirty: false,
        }
    }

    /// Append a row; ordering is restored lazily.
    pub fn insert(&mut self, index: Oid, row: V) {
        if let Some((last, _)) = self.entries.last()
            && *last >= index
        {
            self.dirty = true;
        }
        self.entries.push((index, row));
    }

    /// Whether a sort is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Sort pending inserts now. Later duplicates replace earlier ones.
    pub fn sort(&mut self) {
        if !self.dirty {
            return;
        }
        // Stable, so among equal keys the last inserted ends up last
        self.entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        let mut sorted: Vec<(Oid, V)> = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            match sorted.last_mut() {
                Some(last) if last.0 == entry.0 => *last = entry,
                _ => sorted.push(entry),
            }
        }
        self.entries = sorted;
        self.dirty = false;
    }

    fn search(&mut self, index: &Oid) -> Result<usize, usize> {
        self.sort();
        self.entries.binary_search_by(|(k, _)| k.cmp(index))
    }

    /// Row with exactly this index.
    pub fn get(&mut self, index: &Oid) -> Option<&V> {
        let pos = self.search(index).ok()?;
        Some(&self.entries[pos].1)
    }

    pub fn get_mut(&mut self, index: &Oid) -> Option<&mut V> {
        let pos = self.search(index).ok()?;
        Some(&mut self.entries[pos].1)
    }

    /// First row whose index is `>= index`.
    pub fn get_at_or_after(&mut self, index: &Oid) -> Option<(&Oid, &V)> {
        let pos = match self.search(index) {
            Ok(pos) | Err(pos) => pos,
        };
        self.entries.get(pos).map(|(k, v)| (k, v))
    }

    /// First row whose index is strictly greater than `index`.
    pub fn get_next(&mut self, index: &Oid) -> Option<(&Oid, &V)> {
        let pos = match self.search(index) {
            Ok(pos) => pos + 1,
            Err(pos) => pos,
        };
        self.entries.get(pos).map(|(k, v)| (k, v))
    }

    /// Row with the smallest index.
    pub fn first(&mut self) -> Option<(&Oid, &V)> {
        self.sort();
        self.entries.first().map(|(k, v)| (k, v))
    }

    /// Remove the row with this index.
    pub fn remove(&mut self, index: &Oid) -> Option<V> {
        let pos = self.search(index).ok()?;
        Some(self.entries.remove(pos).1)
    }

    /// Number of rows.
    pub fn len(&mut self) -> usize {
        self.sort();
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows in index order.
    pub fn iter(&mut self) -> impl Iterator<Item = (&Oid, &V)> {
        self.sort();
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.dirty = false;
    }
}

impl<V> Default for OrderedIndexArray<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(Oid, V)> for OrderedIndexArray<V> {
    fn from_iter<I: IntoIterator<Item = (Oid, V)>>(iter: I) -> Self {
        let mut array = Self::new();
        for (index, row) in iter {
            array.insert(index, row);
        }
        array
    }
}
