//! Persistence collaborator: a small get/put/query interface over expense
//! documents, with an in-memory and a JSON-file implementation.

use dashmap::DashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use tally_core::{Expense, ExpenseQuery};

use crate::error::StoreError;

pub trait ExpenseStore: Send + Sync {
    /// Insert or replace by id
    fn put(&self, expense: Expense) -> Result<(), StoreError>;
    fn get(&self, id: &str) -> Result<Option<Expense>, StoreError>;
    /// Returns whether something was removed
    fn delete(&self, id: &str) -> Result<bool, StoreError>;
    /// Everything, ordered by date then id
    fn all(&self) -> Result<Vec<Expense>, StoreError>;

    fn query(&self, q: &ExpenseQuery) -> Result<Vec<Expense>, StoreError> {
        Ok(self.all()?.into_iter().filter(|e| q.matches(e)).collect())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: DashMap<String, Expense>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expenses(expenses: impl IntoIterator<Item = Expense>) -> Self {
        let store = Self::new();
        for e in expenses {
            store.docs.insert(e.id.clone(), e);
        }
        store
    }

    fn sorted(&self) -> Vec<Expense> {
        let mut out: Vec<Expense> = self.docs.iter().map(|r| r.value().clone()).collect();
        sort_by_date(&mut out);
        out
    }
}

impl ExpenseStore for MemoryStore {
    fn put(&self, expense: Expense) -> Result<(), StoreError> {
        self.docs.insert(expense.id.clone(), expense);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Expense>, StoreError> {
        Ok(self.docs.get(id).map(|r| r.value().clone()))
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.docs.remove(id).is_some())
    }

    fn all(&self) -> Result<Vec<Expense>, StoreError> {
        Ok(self.sorted())
    }
}

fn sort_by_date(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
}

/// Whole-file JSON array, rewritten on every change.
/// Writes go to disk first; memory is only updated once the file is saved.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    mem: MemoryStore,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (or start) a store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mem = if path.exists() {
            let s = fs::read_to_string(&path)?;
            let expenses: Vec<Expense> = if s.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&s)?
            };
            debug!(count = expenses.len(), path = %path.display(), "loaded expenses");
            MemoryStore::with_expenses(expenses)
        } else {
            MemoryStore::new()
        };
        Ok(Self {
            path,
            mem,
            write_lock: Mutex::new(()),
        })
    }

    fn write(&self, snapshot: &[Expense]) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ExpenseStore for JsonFileStore {
    fn put(&self, expense: Expense) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut next: Vec<Expense> = self.mem.sorted().into_iter().filter(|e| e.id != expense.id).collect();
        next.push(expense.clone());
        sort_by_date(&mut next);
        self.write(&next)?;

        let id = expense.id.clone();
        self.mem.put(expense)?;
        info!(%id, path = %self.path.display(), "expense saved");
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Expense>, StoreError> {
        self.mem.get(id)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        if self.mem.get(id)?.is_none() {
            return Ok(false);
        }
        let next: Vec<Expense> = self.mem.sorted().into_iter().filter(|e| e.id != id).collect();
        self.write(&next)?;
        self.mem.delete(id)
    }

    fn all(&self) -> Result<Vec<Expense>, StoreError> {
        self.mem.all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tally_core::{Category, DateRange};

    fn exp(id: &str, amount: f64, cat: Category, m: u32, d: u32) -> Expense {
        Expense::manual(id, format!("item {id}"), amount, cat, NaiveDate::from_ymd_opt(2026, m, d).unwrap())
    }

    #[test]
    fn test_memory_put_get_delete() {
        let s = MemoryStore::new();
        s.put(exp("a", 10.0, Category::Food, 1, 2)).unwrap();
        assert_eq!(s.get("a").unwrap().unwrap().amount, 10.0);
        assert!(s.delete("a").unwrap());
        assert!(!s.delete("a").unwrap());
        assert!(s.get("a").unwrap().is_none());
    }

    #[test]
    fn test_all_is_date_ordered() {
        let s = MemoryStore::with_expenses([
            exp("b", 1.0, Category::Food, 3, 1),
            exp("a", 1.0, Category::Food, 1, 1),
            exp("c", 1.0, Category::Food, 2, 1),
        ]);
        let ids: Vec<_> = s.all().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["a", "c", "b"]);
    }

    #[test]
    fn test_query_filters() {
        let s = MemoryStore::with_expenses([
            exp("a", 1.0, Category::Food, 1, 5),
            exp("b", 1.0, Category::Bills, 1, 6),
            exp("c", 1.0, Category::Food, 2, 1),
        ]);
        let q = ExpenseQuery {
            range: DateRange::month(2026, 1),
            category: Some(Category::Food),
        };
        let hits = s.query(&q).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[test]
    fn test_json_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("expenses.json");
        {
            let s = JsonFileStore::open(&path).unwrap();
            s.put(exp("a", 12.5, Category::Transport, 4, 1)).unwrap();
            s.put(exp("b", 7.0, Category::Food, 4, 2)).unwrap();
            assert!(s.delete("b").unwrap());
        }
        let reopened = JsonFileStore::open(&path).unwrap();
        let all = reopened.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].category, Category::Transport);
        assert_eq!(all[0].amount, 12.5);
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();
        let s = JsonFileStore::open(blocker.join("expenses.json")).unwrap();

        assert!(s.put(exp("a", 1.0, Category::Food, 1, 1)).is_err());
        assert!(s.all().unwrap().is_empty());
        assert!(s.get("a").unwrap().is_none());
    }

    #[test]
    fn test_json_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let s = JsonFileStore::open(dir.path().join("none.json")).unwrap();
        assert!(s.all().unwrap().is_empty());
    }
}
