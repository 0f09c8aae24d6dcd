//! Generic in-memory collection backed by one JSON file
//!
//! Each collection file holds a JSON array of records ordered by creation
//! time. Records live in a `RwLock<HashMap>` between load and save.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::{
    Category, CategoryId, Expense, ExpenseId, GoalId, Location, LocationId, Receipt, ReceiptId,
    RecurringExpense, RecurringId, SavingsGoal, Settlement, SettlementId, User, UserId,
};

use super::file_io::{read_json, write_json_atomic};

/// A persisted record with a typed id
pub trait Record: Clone + Serialize + DeserializeOwned {
    type Id: Copy + Eq + Hash + fmt::Display;

    fn id(&self) -> Self::Id;

    fn created_at(&self) -> DateTime<Utc>;

    /// Whether `identifier` names this record's id (full UUID or short prefix)
    fn id_matches(&self, identifier: &str) -> bool;
}

macro_rules! impl_record {
    ($model:ty, $id:ty, $created:ident) => {
        impl Record for $model {
            type Id = $id;

            fn id(&self) -> $id {
                self.id
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.$created
            }

            fn id_matches(&self, identifier: &str) -> bool {
                self.id.matches(identifier)
            }
        }
    };
}

impl_record!(User, UserId, created_at);
impl_record!(Category, CategoryId, created_at);
impl_record!(Location, LocationId, created_at);
impl_record!(Expense, ExpenseId, created_at);
impl_record!(RecurringExpense, RecurringId, created_at);
impl_record!(Settlement, SettlementId, created_at);
impl_record!(SavingsGoal, GoalId, created_at);
impl_record!(Receipt, ReceiptId, uploaded_at);

pub struct Collection<T: Record> {
    path: PathBuf,
    data: RwLock<HashMap<T::Id, T>>,
}

impl<T: Record> Collection<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> HalfsiesResult<RwLockReadGuard<'_, HashMap<T::Id, T>>> {
        self.data
            .read()
            .map_err(|e| HalfsiesError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> HalfsiesResult<RwLockWriteGuard<'_, HashMap<T::Id, T>>> {
        self.data
            .write()
            .map_err(|e| HalfsiesError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Replace the in-memory contents with what is on disk
    pub fn load(&self) -> HalfsiesResult<()> {
        let records: Vec<T> = read_json(&self.path)?;
        let mut data = self.write()?;
        data.clear();
        for record in records {
            data.insert(record.id(), record);
        }
        Ok(())
    }

    pub fn save(&self) -> HalfsiesResult<()> {
        let records = self.all()?;
        write_json_atomic(&self.path, &records)
    }

    pub fn get(&self, id: T::Id) -> HalfsiesResult<Option<T>> {
        Ok(self.read()?.get(&id).cloned())
    }

    pub fn contains(&self, id: T::Id) -> HalfsiesResult<bool> {
        Ok(self.read()?.contains_key(&id))
    }

    /// Every record, oldest first
    pub fn all(&self) -> HalfsiesResult<Vec<T>> {
        let mut records: Vec<T> = self.read()?.values().cloned().collect();
        records.sort_by_key(|r| (r.created_at(), r.id().to_string()));
        Ok(records)
    }

    /// Records matching `predicate`, oldest first
    pub fn filter<F>(&self, predicate: F) -> HalfsiesResult<Vec<T>>
    where
        F: Fn(&T) -> bool,
    {
        let mut records: Vec<T> = self
            .read()?
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.created_at(), r.id().to_string()));
        Ok(records)
    }

    pub fn count_where<F>(&self, predicate: F) -> HalfsiesResult<usize>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self.read()?.values().filter(|r| predicate(r)).count())
    }

    pub fn len(&self) -> HalfsiesResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> HalfsiesResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Records whose id matches a full UUID or short display prefix
    pub fn find_by_identifier(&self, identifier: &str) -> HalfsiesResult<Vec<T>> {
        self.filter(|r| r.id_matches(identifier))
    }

    /// Insert or replace a record
    pub fn upsert(&self, record: T) -> HalfsiesResult<()> {
        self.write()?.insert(record.id(), record);
        Ok(())
    }

    /// Remove a record, returning it if it existed
    pub fn delete(&self, id: T::Id) -> HalfsiesResult<Option<T>> {
        Ok(self.write()?.remove(&id))
    }

    /// Apply `change` to every record matching `predicate`, returning the
    /// updated records
    pub fn update_where<P, F>(&self, predicate: P, mut change: F) -> HalfsiesResult<Vec<T>>
    where
        P: Fn(&T) -> bool,
        F: FnMut(&mut T),
    {
        let mut data = self.write()?;
        let mut updated = Vec::new();
        for record in data.values_mut().filter(|r| predicate(r)) {
            change(record);
            updated.push(record.clone());
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use tempfile::TempDir;

    fn collection(dir: &TempDir) -> Collection<Location> {
        Collection::new(dir.path().join("locations.json"))
    }

    #[test]
    fn test_upsert_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let locations = collection(&temp_dir);
        let market = Location::new("Farmers Market");
        let id = market.id;

        locations.upsert(market).unwrap();
        locations.save().unwrap();

        let reloaded = collection(&temp_dir);
        reloaded.load().unwrap();
        assert_eq!(reloaded.len().unwrap(), 1);
        assert_eq!(reloaded.get(id).unwrap().unwrap().name, "Farmers Market");
    }

    #[test]
    fn test_find_by_short_identifier() {
        let temp_dir = TempDir::new().unwrap();
        let locations = collection(&temp_dir);
        let store = Location::new("Corner Store");
        let short = store.id.to_string();
        locations.upsert(store).unwrap();
        locations.upsert(Location::new("Pharmacy")).unwrap();

        let found = locations.find_by_identifier(&short).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Corner Store");
    }

    #[test]
    fn test_delete_and_update_where() {
        let temp_dir = TempDir::new().unwrap();
        let expenses: Collection<Expense> = Collection::new(temp_dir.path().join("expenses.json"));
        let user = UserId::new();
        let location = LocationId::new();
        let date = chrono::NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

        let mut tagged = Expense::new("Lunch", Money::from_cents(1800), date, CategoryId::new(), user, user);
        tagged.location_id = Some(location);
        let other = Expense::new("Bus", Money::from_cents(250), date, CategoryId::new(), user, user);
        let other_id = other.id;
        expenses.upsert(tagged).unwrap();
        expenses.upsert(other).unwrap();

        let untagged = expenses
            .update_where(|e| e.location_id == Some(location), |e| e.location_id = None)
            .unwrap();
        assert_eq!(untagged.len(), 1);
        assert_eq!(expenses.count_where(|e| e.location_id.is_some()).unwrap(), 0);

        assert!(expenses.delete(other_id).unwrap().is_some());
        assert!(expenses.delete(other_id).unwrap().is_none());
        assert_eq!(expenses.len().unwrap(), 1);
    }
}
