//! Recorded settlement payments between the two household members

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{SettlementId, UserId};
use super::money::Money;
use super::month::Month;

/// A payment from one member to the other, counted against a month's balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub id: SettlementId,
    pub from_user: UserId,
    pub to_user: UserId,
    pub amount: Money,
    /// Month whose balance this payment settles
    pub month: Month,
    /// When the money actually changed hands
    pub date: NaiveDate,
    #[serde(default)]
    pub note: String,
    pub recorded_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Settlement {
    pub fn new(
        from_user: UserId,
        to_user: UserId,
        amount: Money,
        month: Month,
        date: NaiveDate,
        recorded_by: UserId,
    ) -> Self {
        Self {
            id: SettlementId::new(),
            from_user,
            to_user,
            amount,
            month,
            date,
            note: String::new(),
            recorded_by,
            created_at: Utc::now(),
        }
    }

    pub fn involves(&self, user: UserId) -> bool {
        self.from_user == user || self.to_user == user
    }
}

impl fmt::Display for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} for {}", self.date, self.amount, self.month)
    }
}
