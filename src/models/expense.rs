//! Shared expense
//!
//! Every expense is paid by one household member and divided between the two
//! according to its split type.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{CategoryId, ExpenseId, LocationId, ReceiptId, RecurringId, UserId};
use super::money::Money;
use super::month::Month;

/// How an expense's cost is divided between the payer and the other member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SplitType {
    /// Each member owes half
    #[default]
    #[serde(rename = "50/50")]
    Equal,
    /// Agreed separately; the full amount is attributed to the non-payer
    #[serde(rename = "custom")]
    Custom,
    /// The non-payer owes the full amount
    #[serde(rename = "100%")]
    Full,
}

impl SplitType {
    pub fn all() -> &'static [Self] {
        &[Self::Equal, Self::Custom, Self::Full]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "50/50",
            Self::Custom => "custom",
            Self::Full => "100%",
        }
    }

    /// Divide `amount` into `(payer_share, other_share)`
    pub fn shares(&self, amount: Money) -> (Money, Money) {
        match self {
            Self::Equal => amount.split_half(),
            Self::Custom | Self::Full => (Money::zero(), amount),
        }
    }
}

impl fmt::Display for SplitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SplitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "50/50" | "equal" | "half" => Ok(Self::Equal),
            "custom" => Ok(Self::Custom),
            "100%" | "100" | "full" => Ok(Self::Full),
            other => Err(format!(
                "Unknown split type '{}': expected 50/50, custom or 100%",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    /// Always positive
    pub amount: Money,
    pub date: NaiveDate,
    pub category_id: CategoryId,
    #[serde(default)]
    pub location_id: Option<LocationId>,
    pub paid_by: UserId,
    #[serde(default)]
    pub split_type: SplitType,
    #[serde(default)]
    pub notes: String,
    /// Template that generated this expense, if any
    #[serde(default)]
    pub recurring_id: Option<RecurringId>,
    #[serde(default)]
    pub receipt_id: Option<ReceiptId>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        description: impl Into<String>,
        amount: Money,
        date: NaiveDate,
        category_id: CategoryId,
        paid_by: UserId,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ExpenseId::new(),
            description: description.into(),
            amount,
            date,
            category_id,
            location_id: None,
            paid_by,
            split_type: SplitType::default(),
            notes: String::new(),
            recurring_id: None,
            receipt_id: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn month(&self) -> Month {
        Month::of(self.date)
    }

    /// `(payer_share, other_share)` of this expense
    pub fn shares(&self) -> (Money, Money) {
        self.split_type.shares(self.amount)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurring_id.is_some()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for Expense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({})",
            self.date.format("%Y-%m-%d"),
            self.description,
            self.amount,
            self.split_type
        )
    }
}
