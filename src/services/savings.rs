//! Shared savings goals

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::audit::EntityType;
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::{Contribution, GoalId, GoalProgress, Money, SavingsGoal, UserId};
use crate::storage::Storage;
use crate::validation::{assert_name, assert_note, assert_positive_amount, MAX_NAME_LEN};

use super::pick_unique;

pub struct SavingsService<'a> {
    storage: &'a Storage,
}

impl<'a> SavingsService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn ensure_unique_name(&self, name: &str, except: Option<GoalId>) -> HalfsiesResult<()> {
        let taken = self.storage.goals.count_where(|g| {
            !g.archived && g.name.eq_ignore_ascii_case(name) && Some(g.id) != except
        })?;
        if taken == 0 {
            Ok(())
        } else {
            Err(HalfsiesError::Duplicate {
                entity_type: "Savings goal",
                identifier: name.to_string(),
            })
        }
    }

    fn persist_update(&self, before: &SavingsGoal, after: &SavingsGoal) -> HalfsiesResult<()> {
        self.storage.goals.upsert(after.clone())?;
        self.storage.goals.save()?;
        self.storage.log_update(
            EntityType::SavingsGoal,
            after.id.to_string(),
            Some(after.name.clone()),
            before,
            after,
        )
    }

    pub fn create(
        &self,
        name: &str,
        target_amount: Money,
        target_date: Option<NaiveDate>,
        created_by: UserId,
    ) -> HalfsiesResult<SavingsGoal> {
        let name = assert_name("Goal name", name, MAX_NAME_LEN)?;
        let target_amount = assert_positive_amount(target_amount)?;
        self.ensure_unique_name(&name, None)?;

        let mut goal = SavingsGoal::new(name, target_amount, created_by);
        goal.target_date = target_date;

        self.storage.goals.upsert(goal.clone())?;
        self.storage.goals.save()?;
        self.storage.log_create(
            EntityType::SavingsGoal,
            goal.id.to_string(),
            Some(goal.name.clone()),
            &goal,
        )?;
        info!(goal = %goal.id, target = %goal.target_amount, "created savings goal");
        Ok(goal)
    }

    /// Goals sorted by name
    pub fn list(&self, include_archived: bool) -> HalfsiesResult<Vec<SavingsGoal>> {
        let mut goals = self
            .storage
            .goals
            .filter(|g| include_archived || !g.archived)?;
        goals.sort_by_key(|g| g.name.to_lowercase());
        Ok(goals)
    }

    pub fn get(&self, id: GoalId) -> HalfsiesResult<Option<SavingsGoal>> {
        self.storage.goals.get(id)
    }

    /// Find a goal by name (active goals first) or id
    pub fn find(&self, identifier: &str) -> HalfsiesResult<Option<SavingsGoal>> {
        let mut by_name = self
            .storage
            .goals
            .filter(|g| g.name.eq_ignore_ascii_case(identifier.trim()))?;
        by_name.sort_by_key(|g| g.archived);
        if let Some(goal) = by_name.into_iter().next() {
            return Ok(Some(goal));
        }
        pick_unique(
            self.storage.goals.find_by_identifier(identifier)?,
            "Savings goal",
            identifier,
        )
    }

    fn require(&self, id: GoalId) -> HalfsiesResult<SavingsGoal> {
        self.get(id)?
            .ok_or_else(|| HalfsiesError::goal_not_found(id.to_string()))
    }

    pub fn update(
        &self,
        id: GoalId,
        name: Option<&str>,
        target_amount: Option<Money>,
        target_date: Option<Option<NaiveDate>>,
    ) -> HalfsiesResult<SavingsGoal> {
        let mut goal = self.require(id)?;
        let before = goal.clone();

        if let Some(name) = name {
            let name = assert_name("Goal name", name, MAX_NAME_LEN)?;
            self.ensure_unique_name(&name, Some(id))?;
            goal.name = name;
        }
        if let Some(target) = target_amount {
            goal.target_amount = assert_positive_amount(target)?;
        }
        if let Some(target_date) = target_date {
            goal.target_date = target_date;
        }
        goal.updated_at = Utc::now();

        self.persist_update(&before, &goal)?;
        Ok(goal)
    }

    /// Archive or restore a goal
    pub fn set_archived(&self, id: GoalId, archived: bool) -> HalfsiesResult<SavingsGoal> {
        let mut goal = self.require(id)?;
        if goal.archived == archived {
            return Ok(goal);
        }
        if !archived {
            self.ensure_unique_name(&goal.name, Some(id))?;
        }
        let before = goal.clone();
        goal.archived = archived;
        goal.updated_at = Utc::now();
        self.persist_update(&before, &goal)?;
        Ok(goal)
    }

    pub fn archive(&self, id: GoalId) -> HalfsiesResult<SavingsGoal> {
        self.set_archived(id, true)
    }

    pub fn delete(&self, id: GoalId) -> HalfsiesResult<SavingsGoal> {
        let goal = self.require(id)?;
        self.storage.goals.delete(id)?;
        self.storage.goals.save()?;
        self.storage.log_delete(
            EntityType::SavingsGoal,
            goal.id.to_string(),
            Some(goal.name.clone()),
            &goal,
        )?;
        Ok(goal)
    }

    /// Record money put toward a goal; `date` defaults to today
    pub fn contribute(
        &self,
        goal_id: GoalId,
        user_id: UserId,
        amount: Money,
        date: Option<NaiveDate>,
        note: &str,
    ) -> HalfsiesResult<Contribution> {
        let mut goal = self.require(goal_id)?;
        if goal.archived {
            return Err(HalfsiesError::Validation(format!(
                "Goal '{}' is archived",
                goal.name
            )));
        }
        if !self.storage.users.contains(user_id)? {
            return Err(HalfsiesError::user_not_found(user_id.to_string()));
        }
        let amount = assert_positive_amount(amount)?;

        let mut contribution = Contribution::new(
            user_id,
            amount,
            date.unwrap_or_else(|| chrono::Local::now().date_naive()),
        );
        contribution.note = assert_note(note)?;

        let before = goal.clone();
        goal.add_contribution(contribution.clone());
        self.persist_update(&before, &goal)?;
        info!(goal = %goal.id, amount = %amount, "recorded contribution");
        Ok(contribution)
    }

    /// Remove a contribution by full or short id
    pub fn remove_contribution(
        &self,
        goal_id: GoalId,
        identifier: &str,
    ) -> HalfsiesResult<Contribution> {
        let mut goal = self.require(goal_id)?;
        let matching: Vec<_> = goal
            .contributions
            .iter()
            .filter(|c| c.id.matches(identifier))
            .map(|c| c.id)
            .collect();
        let id = pick_unique(matching, "Contribution", identifier)?.ok_or_else(|| {
            HalfsiesError::NotFound {
                entity_type: "Contribution",
                identifier: identifier.to_string(),
            }
        })?;

        let before = goal.clone();
        let removed = goal
            .remove_contribution(id)
            .ok_or_else(|| HalfsiesError::Storage("Contribution vanished during removal".into()))?;
        self.persist_update(&before, &goal)?;
        Ok(removed)
    }

    pub fn progress(&self, id: GoalId, today: NaiveDate) -> HalfsiesResult<GoalProgress> {
        Ok(self.require(id)?.progress(today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{date, household};

    #[test]
    fn test_create_contribute_progress() {
        let (storage, alex, sam, _temp) = household();
        let service = SavingsService::new(&storage);
        let goal = service
            .create("Holiday", Money::from_cents(200000), Some(date(2025, 12, 31)), alex.id)
            .unwrap();

        service
            .contribute(goal.id, alex.id, Money::from_cents(50000), Some(date(2025, 1, 3)), "")
            .unwrap();
        service
            .contribute(goal.id, sam.id, Money::from_cents(30000), Some(date(2025, 1, 4)), "bonus")
            .unwrap();

        let progress = service.progress(goal.id, date(2025, 1, 10)).unwrap();
        assert_eq!(progress.saved.cents(), 80000);
        assert_eq!(progress.remaining.cents(), 120000);
        assert_eq!(progress.percent, 40.0);
        assert_eq!(progress.months_left, Some(12));
        assert_eq!(progress.required_monthly, Some(Money::from_cents(10000)));
        assert_eq!(progress.by_user[&sam.id].cents(), 30000);
    }

    #[test]
    fn test_duplicate_names_only_among_active_goals() {
        let (storage, alex, _sam, _temp) = household();
        let service = SavingsService::new(&storage);
        let first = service.create("Car", Money::from_cents(100), None, alex.id).unwrap();

        assert!(matches!(
            service.create("car", Money::from_cents(100), None, alex.id).unwrap_err(),
            HalfsiesError::Duplicate { .. }
        ));

        service.archive(first.id).unwrap();
        service.create("Car", Money::from_cents(100), None, alex.id).unwrap();
        assert_eq!(service.list(false).unwrap().len(), 1);
        assert_eq!(service.list(true).unwrap().len(), 2);
        assert!(service.set_archived(first.id, false).is_err());
    }

    #[test]
    fn test_archived_goal_refuses_contributions() {
        let (storage, alex, _sam, _temp) = household();
        let service = SavingsService::new(&storage);
        let goal = service.create("Sofa", Money::from_cents(90000), None, alex.id).unwrap();
        service.archive(goal.id).unwrap();

        let err = service
            .contribute(goal.id, alex.id, Money::from_cents(100), None, "")
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_remove_contribution_by_short_id() {
        let (storage, alex, _sam, _temp) = household();
        let service = SavingsService::new(&storage);
        let goal = service.create("TV", Money::from_cents(70000), None, alex.id).unwrap();
        let contribution = service
            .contribute(goal.id, alex.id, Money::from_cents(2500), None, "")
            .unwrap();

        let removed = service
            .remove_contribution(goal.id, &contribution.id.to_string())
            .unwrap();
        assert_eq!(removed.id, contribution.id);
        assert!(service.get(goal.id).unwrap().unwrap().contributions.is_empty());
        assert!(service
            .remove_contribution(goal.id, &contribution.id.to_string())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_update_and_delete() {
        let (storage, alex, _sam, _temp) = household();
        let service = SavingsService::new(&storage);
        let goal = service
            .create("Bike", Money::from_cents(50000), Some(date(2025, 6, 1)), alex.id)
            .unwrap();

        let updated = service
            .update(goal.id, Some("E-bike"), Some(Money::from_cents(150000)), Some(None))
            .unwrap();
        assert_eq!(updated.name, "E-bike");
        assert!(updated.target_date.is_none());

        service.delete(goal.id).unwrap();
        assert!(service.find("E-bike").unwrap().is_none());
    }
}
