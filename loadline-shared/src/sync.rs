/// Row mirror with last-write-wins merge
///
/// Long-lived processes keep local mirrors of remote rows (the worker's view
/// of active hunt plans, a session's view of its flags). Updates arrive as
/// whole rows keyed by id and merge last-write-wins; there is no ordering
/// guarantee beyond arrival order, and no tombstone protocol; a refresh
/// replaces the full set.

use std::collections::HashMap;
use uuid::Uuid;

/// A row that can live in a [`RowCache`]
pub trait RowId {
    /// Stable identity of the row
    fn row_id(&self) -> Uuid;
}

/// In-memory mirror of remote rows, keyed by row id
///
/// Merge semantics are last-write-wins: an upsert for an existing id replaces
/// the stored row unconditionally.
#[derive(Debug, Clone)]
pub struct RowCache<T: RowId> {
    rows: HashMap<Uuid, T>,
}

impl<T: RowId> Default for RowCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RowId> RowCache<T> {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    /// Merges a single row, last write wins
    pub fn upsert(&mut self, row: T) {
        self.rows.insert(row.row_id(), row);
    }

    /// Merges a batch of rows in arrival order
    pub fn merge(&mut self, rows: impl IntoIterator<Item = T>) {
        for row in rows {
            self.upsert(row);
        }
    }

    /// Replaces the entire mirror with a fresh snapshot
    pub fn replace_all(&mut self, rows: impl IntoIterator<Item = T>) {
        self.rows.clear();
        self.merge(rows);
    }

    /// Removes a row by id
    pub fn remove(&mut self, id: Uuid) -> Option<T> {
        self.rows.remove(&id)
    }

    /// Looks up a row by id
    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.rows.get(&id)
    }

    /// Number of mirrored rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the mirror is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over mirrored rows in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: Uuid,
        value: i64,
    }

    impl RowId for Row {
        fn row_id(&self) -> Uuid {
            self.id
        }
    }

    #[test]
    fn test_last_write_wins() {
        let id = Uuid::new_v4();
        let mut cache = RowCache::new();

        cache.upsert(Row { id, value: 1 });
        cache.upsert(Row { id, value: 2 });

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(id).unwrap().value, 2);
    }

    #[test]
    fn test_merge_preserves_arrival_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut cache = RowCache::new();

        cache.merge(vec![
            Row { id: a, value: 1 },
            Row { id: b, value: 10 },
            Row { id: a, value: 3 },
        ]);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(a).unwrap().value, 3);
        assert_eq!(cache.get(b).unwrap().value, 10);
    }

    #[test]
    fn test_replace_all_drops_stale_rows() {
        let stale = Uuid::new_v4();
        let fresh = Uuid::new_v4();
        let mut cache = RowCache::new();

        cache.upsert(Row {
            id: stale,
            value: 1,
        });
        cache.replace_all(vec![Row {
            id: fresh,
            value: 2,
        }]);

        assert!(cache.get(stale).is_none());
        assert_eq!(cache.get(fresh).unwrap().value, 2);
    }

    #[test]
    fn test_remove() {
        let id = Uuid::new_v4();
        let mut cache = RowCache::new();
        cache.upsert(Row { id, value: 7 });

        assert_eq!(cache.remove(id).unwrap().value, 7);
        assert!(cache.is_empty());
    }
}
