use std::sync::{Arc, Mutex, MutexGuard};

/// `Table` is an insertion ordered in memory collection, clones share the same rows
///
/// Rows keep the position of their first save, so iterating backward yields the
/// newest rows first.
pub struct Table<T> {
    rows: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
        }
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> Table<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Vec<T>>, String> {
        self.rows.lock().map_err(|err| err.to_string())
    }

    /// `upsert` replaces the row matching `same`, or appends it
    pub fn upsert(&self, row: T, same: impl Fn(&T) -> bool) -> Result<(), String> {
        let mut rows = self.lock()?;
        match rows.iter_mut().find(|current| same(current)) {
            Some(current) => *current = row,
            None => rows.push(row),
        }

        Ok(())
    }

    pub fn find(&self, matcher: impl Fn(&T) -> bool) -> Result<Option<T>, String> {
        let rows = self.lock()?;
        Ok(rows.iter().find(|row| matcher(row)).cloned())
    }

    pub fn newest_first(&self, matcher: impl Fn(&T) -> bool) -> Result<Vec<T>, String> {
        let rows = self.lock()?;
        Ok(rows.iter().rev().filter(|row| matcher(row)).cloned().collect())
    }

    /// `remove` tells whether a row was removed
    pub fn remove(&self, matcher: impl Fn(&T) -> bool) -> Result<bool, String> {
        let mut rows = self.lock()?;
        let before = rows.len();
        rows.retain(|row| !matcher(row));

        Ok(rows.len() != before)
    }
}
