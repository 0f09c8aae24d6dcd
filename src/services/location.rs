//! Location tags for expenses

use chrono::Utc;
use tracing::info;

use crate::audit::EntityType;
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::{Location, LocationId};
use crate::storage::Storage;
use crate::validation::{assert_name, MAX_LABEL_LEN, MAX_NAME_LEN};

use super::pick_unique;

pub struct LocationService<'a> {
    storage: &'a Storage,
}

fn clean_address(address: Option<String>) -> HalfsiesResult<Option<String>> {
    match address.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()) {
        Some(address) => Ok(Some(assert_name("Address", &address, MAX_NAME_LEN * 2)?)),
        None => Ok(None),
    }
}

impl<'a> LocationService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn create(&self, name: &str, address: Option<String>) -> HalfsiesResult<Location> {
        let name = assert_name("Location name", name, MAX_LABEL_LEN)?;
        self.ensure_unique_name(&name, None)?;

        let mut location = Location::new(name);
        location.address = clean_address(address)?;

        self.storage.locations.upsert(location.clone())?;
        self.storage.locations.save()?;
        self.storage.log_create(
            EntityType::Location,
            location.id.to_string(),
            Some(location.name.clone()),
            &location,
        )?;
        Ok(location)
    }

    fn ensure_unique_name(&self, name: &str, except: Option<LocationId>) -> HalfsiesResult<()> {
        let taken = self
            .storage
            .locations
            .count_where(|l| l.matches_name(name) && Some(l.id) != except)?;
        if taken == 0 {
            Ok(())
        } else {
            Err(HalfsiesError::Duplicate {
                entity_type: "Location",
                identifier: name.to_string(),
            })
        }
    }

    pub fn list(&self) -> HalfsiesResult<Vec<Location>> {
        let mut locations = self.storage.locations.all()?;
        locations.sort_by_key(|l| l.name.to_lowercase());
        Ok(locations)
    }

    pub fn get(&self, id: LocationId) -> HalfsiesResult<Option<Location>> {
        self.storage.locations.get(id)
    }

    pub fn find(&self, identifier: &str) -> HalfsiesResult<Option<Location>> {
        let by_name = self.storage.locations.filter(|l| l.matches_name(identifier))?;
        if let Some(location) = by_name.into_iter().next() {
            return Ok(Some(location));
        }
        pick_unique(
            self.storage.locations.find_by_identifier(identifier)?,
            "Location",
            identifier,
        )
    }

    pub fn update(
        &self,
        id: LocationId,
        name: Option<&str>,
        address: Option<Option<String>>,
    ) -> HalfsiesResult<Location> {
        let mut location = self
            .get(id)?
            .ok_or_else(|| HalfsiesError::location_not_found(id.to_string()))?;
        let before = location.clone();

        if let Some(name) = name {
            let name = assert_name("Location name", name, MAX_LABEL_LEN)?;
            self.ensure_unique_name(&name, Some(id))?;
            location.name = name;
        }
        if let Some(address) = address {
            location.address = clean_address(address)?;
        }
        location.updated_at = Utc::now();

        self.storage.locations.upsert(location.clone())?;
        self.storage.locations.save()?;
        self.storage.log_update(
            EntityType::Location,
            location.id.to_string(),
            Some(location.name.clone()),
            &before,
            &location,
        )?;
        Ok(location)
    }

    /// Delete a location and untag everything that used it
    ///
    /// Returns the number of expenses and templates untagged.
    pub fn delete(&self, id: LocationId) -> HalfsiesResult<usize> {
        let location = self
            .get(id)?
            .ok_or_else(|| HalfsiesError::location_not_found(id.to_string()))?;

        let now = Utc::now();
        let expenses = self.storage.expenses.update_where(
            |e| e.location_id == Some(id),
            |e| {
                e.location_id = None;
                e.updated_at = now;
            },
        )?;
        let templates = self.storage.recurring.update_where(
            |r| r.location_id == Some(id),
            |r| {
                r.location_id = None;
                r.updated_at = now;
            },
        )?;
        self.storage.locations.delete(id)?;

        self.storage.expenses.save()?;
        self.storage.recurring.save()?;
        self.storage.locations.save()?;
        self.storage.log_delete(
            EntityType::Location,
            location.id.to_string(),
            Some(location.name.clone()),
            &location,
        )?;

        let untagged = expenses.len() + templates.len();
        info!(location = %id, untagged, "deleted location");
        Ok(untagged)
    }
}
