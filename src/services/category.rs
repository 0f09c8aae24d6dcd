//! Category management
//!
//! A category cannot disappear from under expenses or recurring templates:
//! deleting one that is in use requires naming a category to move them to.

use chrono::Utc;
use tracing::info;

use crate::audit::EntityType;
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::{Category, CategoryId, FALLBACK_CATEGORY};
use crate::storage::Storage;
use crate::validation::{assert_name, MAX_LABEL_LEN};

use super::pick_unique;

pub struct CategoryService<'a> {
    storage: &'a Storage,
}

fn assert_color(color: &str) -> HalfsiesResult<String> {
    let color = color.trim();
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(color.to_lowercase())
    } else {
        Err(HalfsiesError::Validation(format!(
            "Invalid color '{}': expected #rrggbb",
            color
        )))
    }
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl<'a> CategoryService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn create(
        &self,
        name: &str,
        icon: Option<String>,
        color: Option<String>,
    ) -> HalfsiesResult<Category> {
        let name = assert_name("Category name", name, MAX_LABEL_LEN)?;
        self.ensure_unique_name(&name, None)?;

        let mut category = Category::new(name);
        category.icon = clean_optional(icon);
        category.color = clean_optional(color).map(|c| assert_color(&c)).transpose()?;

        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;
        self.storage.log_create(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &category,
        )?;
        info!(category = %category.id, "created category");
        Ok(category)
    }

    fn ensure_unique_name(&self, name: &str, except: Option<CategoryId>) -> HalfsiesResult<()> {
        let clash = self
            .storage
            .categories
            .filter(|c| c.matches_name(name) && Some(c.id) != except)?;
        if clash.is_empty() {
            Ok(())
        } else {
            Err(HalfsiesError::Duplicate {
                entity_type: "Category",
                identifier: name.to_string(),
            })
        }
    }

    /// All categories sorted by name
    pub fn list(&self) -> HalfsiesResult<Vec<Category>> {
        let mut categories = self.storage.categories.all()?;
        categories.sort_by_key(|c| c.name.to_lowercase());
        Ok(categories)
    }

    pub fn get(&self, id: CategoryId) -> HalfsiesResult<Option<Category>> {
        self.storage.categories.get(id)
    }

    /// Find a category by name or id
    pub fn find(&self, identifier: &str) -> HalfsiesResult<Option<Category>> {
        let by_name = self.storage.categories.filter(|c| c.matches_name(identifier))?;
        if let Some(category) = by_name.into_iter().next() {
            return Ok(Some(category));
        }
        pick_unique(
            self.storage.categories.find_by_identifier(identifier)?,
            "Category",
            identifier,
        )
    }

    /// The category used to absorb records whose category disappeared,
    /// created if missing
    pub fn fallback(&self) -> HalfsiesResult<Category> {
        match self.find(FALLBACK_CATEGORY)? {
            Some(category) => Ok(category),
            None => self.create(FALLBACK_CATEGORY, None, None),
        }
    }

    /// Number of expenses and recurring templates using a category
    pub fn usage_count(&self, id: CategoryId) -> HalfsiesResult<usize> {
        Ok(self.storage.expenses.count_where(|e| e.category_id == id)?
            + self.storage.recurring.count_where(|r| r.category_id == id)?)
    }

    pub fn update(
        &self,
        id: CategoryId,
        name: Option<&str>,
        icon: Option<Option<String>>,
        color: Option<Option<String>>,
    ) -> HalfsiesResult<Category> {
        let mut category = self
            .get(id)?
            .ok_or_else(|| HalfsiesError::category_not_found(id.to_string()))?;
        let before = category.clone();

        if let Some(name) = name {
            let name = assert_name("Category name", name, MAX_LABEL_LEN)?;
            self.ensure_unique_name(&name, Some(id))?;
            category.name = name;
        }
        if let Some(icon) = icon {
            category.icon = clean_optional(icon);
        }
        if let Some(color) = color {
            category.color = clean_optional(color).map(|c| assert_color(&c)).transpose()?;
        }
        category.updated_at = Utc::now();

        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;
        self.storage.log_update(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &before,
            &category,
        )?;
        Ok(category)
    }

    /// Delete a category, first moving its records to `reassign_to` if given
    ///
    /// Returns the number of records moved.
    pub fn delete(&self, id: CategoryId, reassign_to: Option<CategoryId>) -> HalfsiesResult<usize> {
        let category = self
            .get(id)?
            .ok_or_else(|| HalfsiesError::category_not_found(id.to_string()))?;

        let in_use = self.usage_count(id)?;
        let moved = match (in_use, reassign_to) {
            (0, _) => 0,
            (count, None) => {
                return Err(HalfsiesError::InUse {
                    entity_type: "Category",
                    name: category.name,
                    count,
                })
            }
            (_, Some(target)) if target == id => {
                return Err(HalfsiesError::Validation(
                    "Cannot reassign a category to itself".into(),
                ))
            }
            (_, Some(target)) => {
                if !self.storage.categories.contains(target)? {
                    return Err(HalfsiesError::category_not_found(target.to_string()));
                }
                self.reassign(id, target)?
            }
        };

        self.storage.categories.delete(id)?;
        self.storage.categories.save()?;
        self.storage.log_delete(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &category,
        )?;
        info!(category = %id, moved, "deleted category");
        Ok(moved)
    }

    fn reassign(&self, from: CategoryId, to: CategoryId) -> HalfsiesResult<usize> {
        let now = Utc::now();
        let expenses = self.storage.expenses.update_where(
            |e| e.category_id == from,
            |e| {
                e.category_id = to;
                e.updated_at = now;
            },
        )?;
        let templates = self.storage.recurring.update_where(
            |r| r.category_id == from,
            |r| {
                r.category_id = to;
                r.updated_at = now;
            },
        )?;
        self.storage.expenses.save()?;
        self.storage.recurring.save()?;
        Ok(expenses.len() + templates.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, DEFAULT_CATEGORIES};
    use crate::services::test_support::{category_id, date, household, storage};
    use crate::services::{CreateExpenseInput, ExpenseService};

    #[test]
    fn test_defaults_sorted_by_name() {
        let (storage, _temp) = storage();
        let names: Vec<_> = CategoryService::new(&storage)
            .list()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names.len(), DEFAULT_CATEGORIES.len());
        assert_eq!(names.first().map(String::as_str), Some("Dining Out"));
        assert_eq!(names.last().map(String::as_str), Some("Utilities"));
    }

    #[test]
    fn test_create_rejects_duplicates_and_long_names() {
        let (storage, _temp) = storage();
        let service = CategoryService::new(&storage);

        let err = service.create("groceries", None, None).unwrap_err();
        assert!(matches!(err, HalfsiesError::Duplicate { .. }));
        assert!(service.create(&"x".repeat(51), None, None).unwrap_err().is_validation());

        let pets = service
            .create("Pets", Some("🐾".into()), Some("#A0B1C2".into()))
            .unwrap();
        assert_eq!(pets.color.as_deref(), Some("#a0b1c2"));
        assert!(service.create("Gifts", None, Some("red".into())).is_err());
    }

    #[test]
    fn test_update_clears_icon() {
        let (storage, _temp) = storage();
        let service = CategoryService::new(&storage);
        let rent = category_id(&storage, "Rent");

        let updated = service
            .update(rent, Some("Rent & Mortgage"), Some(None), None)
            .unwrap();
        assert_eq!(updated.name, "Rent & Mortgage");
        assert!(updated.icon.is_none());
    }

    #[test]
    fn test_delete_in_use_requires_reassignment() {
        let (storage, alex, _sam, _temp) = household();
        let service = CategoryService::new(&storage);
        let dining = category_id(&storage, "Dining Out");
        let other = category_id(&storage, "Other");
        let expense = ExpenseService::new(&storage)
            .create(
                CreateExpenseInput::new("Pizza", Money::from_cents(3200), date(2025, 3, 1), dining, alex.id),
                alex.id,
            )
            .unwrap();

        let err = service.delete(dining, None).unwrap_err();
        assert!(matches!(err, HalfsiesError::InUse { count: 1, .. }));
        assert!(service.delete(dining, Some(dining)).unwrap_err().is_validation());

        assert_eq!(service.delete(dining, Some(other)).unwrap(), 1);
        let moved = storage.expenses.get(expense.id).unwrap().unwrap();
        assert_eq!(moved.category_id, other);
        assert!(service.get(dining).unwrap().is_none());
    }

    #[test]
    fn test_delete_unused() {
        let (storage, _temp) = storage();
        let service = CategoryService::new(&storage);
        let travel = category_id(&storage, "Travel");
        assert_eq!(service.delete(travel, None).unwrap(), 0);
        assert!(service.find("Travel").unwrap().is_none());
    }

    #[test]
    fn test_fallback_recreated_when_missing() {
        let (storage, _temp) = storage();
        let service = CategoryService::new(&storage);
        let other = category_id(&storage, "Other");
        service.delete(other, None).unwrap();

        let fallback = service.fallback().unwrap();
        assert_eq!(fallback.name, "Other");
        assert_ne!(fallback.id, other);
    }
}
