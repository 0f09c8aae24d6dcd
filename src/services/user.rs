//! Household member management

use chrono::Utc;
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::auth::{hash_password, verify_password};
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::{User, UserId};
use crate::storage::Storage;
use crate::validation::{assert_email, assert_name, MAX_NAME_LEN};

use super::pick_unique;

/// Most members a household can have
pub const MAX_MEMBERS: usize = 2;

pub struct UserService<'a> {
    storage: &'a Storage,
}

impl<'a> UserService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Add a member to the household
    pub fn register(&self, name: &str, email: &str, password: &str) -> HalfsiesResult<User> {
        let name = assert_name("Name", name, MAX_NAME_LEN)?;
        let email = assert_email(email)?;

        if self.storage.users.len()? >= MAX_MEMBERS {
            return Err(HalfsiesError::HouseholdFull);
        }
        if self.find_by_email(&email)?.is_some() {
            return Err(HalfsiesError::Duplicate {
                entity_type: "User",
                identifier: email,
            });
        }

        let user = User::new(name, email, hash_password(password)?);
        self.storage.users.upsert(user.clone())?;
        self.storage.users.save()?;
        self.storage.log_create(
            EntityType::User,
            user.id.to_string(),
            Some(user.name.clone()),
            &user,
        )?;

        info!(user = %user.id, "registered household member");
        Ok(user)
    }

    /// Members in registration order
    pub fn list(&self) -> HalfsiesResult<Vec<User>> {
        self.storage.users.all()
    }

    pub fn get(&self, id: UserId) -> HalfsiesResult<Option<User>> {
        self.storage.users.get(id)
    }

    pub fn find_by_email(&self, email: &str) -> HalfsiesResult<Option<User>> {
        Ok(self
            .storage
            .users
            .filter(|u| u.matches_email(email))?
            .into_iter()
            .next())
    }

    /// Find a member by email, name or id
    pub fn find(&self, identifier: &str) -> HalfsiesResult<Option<User>> {
        if let Some(user) = self.find_by_email(identifier)? {
            return Ok(Some(user));
        }
        let by_name = self
            .storage
            .users
            .filter(|u| u.name.eq_ignore_ascii_case(identifier.trim()))?;
        if let Some(user) = pick_unique(by_name, "User", identifier)? {
            return Ok(Some(user));
        }
        pick_unique(
            self.storage.users.find_by_identifier(identifier)?,
            "User",
            identifier,
        )
    }

    fn require(&self, id: UserId) -> HalfsiesResult<User> {
        self.get(id)?
            .ok_or_else(|| HalfsiesError::user_not_found(id.to_string()))
    }

    pub fn update_profile(
        &self,
        id: UserId,
        name: Option<&str>,
        email: Option<&str>,
    ) -> HalfsiesResult<User> {
        let mut user = self.require(id)?;
        let before = user.clone();

        if let Some(name) = name {
            user.name = assert_name("Name", name, MAX_NAME_LEN)?;
        }
        if let Some(email) = email {
            let email = assert_email(email)?;
            if let Some(existing) = self.find_by_email(&email)? {
                if existing.id != id {
                    return Err(HalfsiesError::Duplicate {
                        entity_type: "User",
                        identifier: email,
                    });
                }
            }
            user.email = email;
        }
        user.updated_at = Utc::now();

        self.storage.users.upsert(user.clone())?;
        self.storage.users.save()?;
        self.storage.log_update(
            EntityType::User,
            user.id.to_string(),
            Some(user.name.clone()),
            &before,
            &user,
        )?;
        Ok(user)
    }

    pub fn change_password(
        &self,
        id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> HalfsiesResult<()> {
        let mut user = self.require(id)?;
        if !verify_password(current_password, &user.password_hash)? {
            return Err(HalfsiesError::Auth("Current password is incorrect".into()));
        }

        let before = user.clone();
        user.password_hash = hash_password(new_password)?;
        user.updated_at = Utc::now();

        self.storage.users.upsert(user.clone())?;
        self.storage.users.save()?;
        self.storage.log_update(
            EntityType::User,
            user.id.to_string(),
            Some(user.name.clone()),
            &before,
            &user,
        )?;
        info!(user = %user.id, "password changed");
        Ok(())
    }

    /// The other household member
    pub fn partner_of(&self, id: UserId) -> HalfsiesResult<Option<User>> {
        Ok(self
            .storage
            .users
            .filter(|u| u.id != id)?
            .into_iter()
            .next())
    }

    /// Both members as `(first registered, second registered)`
    pub fn household(&self) -> HalfsiesResult<(User, User)> {
        let mut users = self.list()?;
        if users.len() != MAX_MEMBERS {
            return Err(HalfsiesError::Validation(format!(
                "Balances need exactly two household members, found {}",
                users.len()
            )));
        }
        let second = users.remove(1);
        let first = users.remove(0);
        Ok((first, second))
    }

    /// Number of records that still point at a user
    pub fn reference_count(&self, id: UserId) -> HalfsiesResult<usize> {
        let expenses = self
            .storage
            .expenses
            .count_where(|e| e.paid_by == id || e.created_by == id)?;
        let recurring = self
            .storage
            .recurring
            .count_where(|r| r.paid_by == id || r.created_by == id)?;
        let settlements = self
            .storage
            .settlements
            .count_where(|s| s.involves(id) || s.recorded_by == id)?;
        let goals = self.storage.goals.count_where(|g| {
            g.created_by == id || g.contributions.iter().any(|c| c.user_id == id)
        })?;
        debug!(user = %id, expenses, recurring, settlements, goals, "user references");
        Ok(expenses + recurring + settlements + goals)
    }

    /// Remove a member who no longer owns any records
    pub fn delete(&self, id: UserId) -> HalfsiesResult<User> {
        let user = self.require(id)?;
        let count = self.reference_count(id)?;
        if count > 0 {
            return Err(HalfsiesError::InUse {
                entity_type: "User",
                name: user.name,
                count,
            });
        }

        self.storage.users.delete(id)?;
        self.storage.users.save()?;
        self.storage.log_delete(
            EntityType::User,
            user.id.to_string(),
            Some(user.name.clone()),
            &user,
        )?;
        info!(user = %user.id, "removed household member");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Session;
    use crate::models::Money;
    use crate::services::test_support::{category_id, date, household, storage};
    use crate::services::{CreateExpenseInput, ExpenseService};

    #[test]
    fn test_register_two_members_then_full() {
        let (storage, _temp) = storage();
        let service = UserService::new(&storage);

        service.register("Alex", "alex@example.com", "password123").unwrap();
        service.register("Sam", "sam@example.com", "password456").unwrap();

        let err = service
            .register("Kim", "kim@example.com", "password789")
            .unwrap_err();
        assert!(matches!(err, HalfsiesError::HouseholdFull));
    }

    #[test]
    fn test_duplicate_email_case_insensitive() {
        let (storage, _temp) = storage();
        let service = UserService::new(&storage);
        service.register("Alex", "alex@example.com", "password123").unwrap();

        let err = service
            .register("Other Alex", "ALEX@Example.com", "password456")
            .unwrap_err();
        assert!(matches!(err, HalfsiesError::Duplicate { .. }));
    }

    #[test]
    fn test_register_validates_input() {
        let (storage, _temp) = storage();
        let service = UserService::new(&storage);
        assert!(service.register("  ", "a@example.com", "password123").unwrap_err().is_validation());
        assert!(service.register("Alex", "not-an-email", "password123").unwrap_err().is_validation());
        assert!(service.register("Alex", "a@example.com", "short").unwrap_err().is_validation());
        assert!(service.list().unwrap().is_empty());
    }

    #[test]
    fn test_find_by_email_name_and_id() {
        let (storage, alex, _sam, _temp) = household();
        let service = UserService::new(&storage);

        assert_eq!(service.find("ALEX@example.com").unwrap().unwrap().id, alex.id);
        assert_eq!(service.find("alex").unwrap().unwrap().id, alex.id);
        assert_eq!(service.find(&alex.id.to_string()).unwrap().unwrap().id, alex.id);
        assert!(service.find("nobody").unwrap().is_none());
    }

    #[test]
    fn test_household_order_and_partner() {
        let (storage, alex, sam, _temp) = household();
        let service = UserService::new(&storage);

        let (first, second) = service.household().unwrap();
        assert_eq!(first.id, alex.id);
        assert_eq!(second.id, sam.id);
        assert_eq!(service.partner_of(alex.id).unwrap().unwrap().id, sam.id);
    }

    #[test]
    fn test_change_password() {
        let (storage, alex, _sam, _temp) = household();
        let service = UserService::new(&storage);

        let err = service
            .change_password(alex.id, "wrong-password", "newpassword1")
            .unwrap_err();
        assert!(err.is_auth());

        service
            .change_password(alex.id, "password123", "newpassword1")
            .unwrap();
        assert!(Session::login(&storage, "alex@example.com", "newpassword1").is_ok());
        assert!(Session::login(&storage, "alex@example.com", "password123").is_err());
    }

    #[test]
    fn test_update_profile_rejects_taken_email() {
        let (storage, alex, _sam, _temp) = household();
        let service = UserService::new(&storage);

        let err = service
            .update_profile(alex.id, None, Some("sam@example.com"))
            .unwrap_err();
        assert!(matches!(err, HalfsiesError::Duplicate { .. }));

        let updated = service
            .update_profile(alex.id, Some("Alexandra"), None)
            .unwrap();
        assert_eq!(updated.name, "Alexandra");
    }

    #[test]
    fn test_delete_refuses_referenced_user() {
        let (storage, alex, sam, _temp) = household();
        let groceries = category_id(&storage, "Groceries");
        ExpenseService::new(&storage)
            .create(
                CreateExpenseInput::new("Groceries", Money::from_cents(5000), date(2025, 1, 5), groceries, alex.id),
                alex.id,
            )
            .unwrap();

        let service = UserService::new(&storage);
        let err = service.delete(alex.id).unwrap_err();
        assert!(matches!(err, HalfsiesError::InUse { count: 1, .. }));

        service.delete(sam.id).unwrap();
        assert_eq!(service.list().unwrap().len(), 1);
    }
}
