//! Savings goals and the contributions made toward them

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ids::{ContributionId, GoalId, UserId};
use super::money::Money;
use super::month::Month;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    pub id: ContributionId,
    pub user_id: UserId,
    pub amount: Money,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl Contribution {
    pub fn new(user_id: UserId, amount: Money, date: NaiveDate) -> Self {
        Self {
            id: ContributionId::new(),
            user_id,
            amount,
            date,
            note: String::new(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: GoalId,
    pub name: String,
    pub target_amount: Money,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
    #[serde(default)]
    pub archived: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavingsGoal {
    pub fn new(name: impl Into<String>, target_amount: Money, created_by: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: GoalId::new(),
            name: name.into(),
            target_amount,
            target_date: None,
            contributions: Vec::new(),
            archived: false,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn saved(&self) -> Money {
        self.contributions.iter().map(|c| c.amount).sum()
    }

    pub fn add_contribution(&mut self, contribution: Contribution) {
        self.contributions.push(contribution);
        self.contributions.sort_by_key(|c| (c.date, c.created_at));
        self.updated_at = Utc::now();
    }

    /// Remove a contribution, returning it if it existed
    pub fn remove_contribution(&mut self, id: ContributionId) -> Option<Contribution> {
        let index = self.contributions.iter().position(|c| c.id == id)?;
        self.updated_at = Utc::now();
        Some(self.contributions.remove(index))
    }

    /// Progress toward the target as of `today`
    pub fn progress(&self, today: NaiveDate) -> GoalProgress {
        let saved = self.saved();
        let remaining = if saved >= self.target_amount {
            Money::zero()
        } else {
            self.target_amount - saved
        };

        let mut by_user: BTreeMap<UserId, Money> = BTreeMap::new();
        for contribution in &self.contributions {
            *by_user.entry(contribution.user_id).or_default() += contribution.amount;
        }

        let months_left = self.target_date.map(|target| {
            if target < today {
                0
            } else {
                (Month::of(today).months_until(Month::of(target)) + 1) as u32
            }
        });

        let required_monthly = months_left.map(|months| {
            if remaining.is_zero() {
                Money::zero()
            } else if months == 0 {
                remaining
            } else {
                let months = i64::from(months);
                Money::from_cents(remaining.cents().saturating_add(months - 1) / months)
            }
        });

        GoalProgress {
            saved,
            remaining,
            percent: saved.percentage_of(self.target_amount),
            by_user,
            months_left,
            required_monthly,
            completed: remaining.is_zero(),
            overdue: self
                .target_date
                .map_or(false, |target| target < today && !remaining.is_zero()),
        }
    }
}

impl fmt::Display for SavingsGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} of {})", self.name, self.saved(), self.target_amount)
    }
}

/// Derived progress figures for a goal
#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgress {
    pub saved: Money,
    /// Never negative
    pub remaining: Money,
    /// Raw percentage, may exceed 100
    pub percent: f64,
    pub by_user: BTreeMap<UserId, Money>,
    /// Calendar months left including the current one, if a target date is set
    pub months_left: Option<u32>,
    /// Monthly amount needed to reach the target on time, rounded up
    pub required_monthly: Option<Money>,
    pub completed: bool,
    pub overdue: bool,
}

impl GoalProgress {
    /// Percentage capped at 100 for progress bars
    pub fn display_percent(&self) -> f64 {
        self.percent.min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_progress_with_two_contributors() {
        let alex = UserId::new();
        let sam = UserId::new();
        let mut goal = SavingsGoal::new("Vacation", Money::from_cents(100000), alex);
        goal.target_date = Some(date(2025, 6, 30));
        goal.add_contribution(Contribution::new(alex, Money::from_cents(20000), date(2025, 1, 5)));
        goal.add_contribution(Contribution::new(sam, Money::from_cents(10000), date(2025, 1, 6)));

        let progress = goal.progress(date(2025, 1, 20));
        assert_eq!(progress.saved.cents(), 30000);
        assert_eq!(progress.remaining.cents(), 70000);
        assert_eq!(progress.percent, 30.0);
        assert_eq!(progress.by_user[&alex].cents(), 20000);
        assert_eq!(progress.by_user[&sam].cents(), 10000);
        // January through June
        assert_eq!(progress.months_left, Some(6));
        // 700.00 / 6 rounded up to the cent
        assert_eq!(progress.required_monthly, Some(Money::from_cents(11667)));
        assert!(!progress.completed);
        assert!(!progress.overdue);
    }

    #[test]
    fn test_overfunded_goal() {
        let user = UserId::new();
        let mut goal = SavingsGoal::new("Couch", Money::from_cents(50000), user);
        goal.add_contribution(Contribution::new(user, Money::from_cents(60000), date(2025, 2, 1)));

        let progress = goal.progress(date(2025, 2, 2));
        assert!(progress.remaining.is_zero());
        assert!(progress.completed);
        assert_eq!(progress.percent, 120.0);
        assert_eq!(progress.display_percent(), 100.0);
        assert_eq!(progress.months_left, None);
    }

    #[test]
    fn test_overdue_goal_requires_everything_now() {
        let user = UserId::new();
        let mut goal = SavingsGoal::new("Laptop", Money::from_cents(120000), user);
        goal.target_date = Some(date(2024, 12, 31));

        let progress = goal.progress(date(2025, 1, 15));
        assert_eq!(progress.months_left, Some(0));
        assert_eq!(progress.required_monthly, Some(Money::from_cents(120000)));
        assert!(progress.overdue);
    }

    #[test]
    fn test_remove_contribution() {
        let user = UserId::new();
        let mut goal = SavingsGoal::new("Bike", Money::from_cents(80000), user);
        let contribution = Contribution::new(user, Money::from_cents(5000), date(2025, 3, 1));
        let id = contribution.id;
        goal.add_contribution(contribution);

        assert!(goal.remove_contribution(id).is_some());
        assert!(goal.remove_contribution(id).is_none());
        assert!(goal.saved().is_zero());
    }
}
