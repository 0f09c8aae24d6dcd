//! Expense categories and location tags

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, LocationId};

/// Categories created by `init`
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Groceries", "🛒"),
    ("Rent", "🏠"),
    ("Utilities", "💡"),
    ("Dining Out", "🍽"),
    ("Transport", "🚗"),
    ("Household", "🧺"),
    ("Entertainment", "🎬"),
    ("Health", "💊"),
    ("Travel", "✈"),
    ("Other", "📦"),
];

/// Fallback category used when repairing dangling references
pub const FALLBACK_CATEGORY: &str = "Other";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Display color, e.g. "#4f46e5"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CategoryId::new(),
            name: name.into(),
            icon: None,
            color: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_icon(name: impl Into<String>, icon: impl Into<String>) -> Self {
        let mut category = Self::new(name);
        category.icon = Some(icon.into());
        category
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }

    /// Name with the icon in front when one is set
    pub fn label(&self) -> String {
        match &self.icon {
            Some(icon) => format!("{} {}", icon, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A place an expense happened ("Costco", "Lisbon trip")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: LocationId::new(),
            name: name.into(),
            address: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_categories_include_fallback() {
        assert!(DEFAULT_CATEGORIES
            .iter()
            .any(|(name, _)| *name == FALLBACK_CATEGORY));
    }

    #[test]
    fn test_name_matching_is_case_insensitive() {
        let category = Category::with_icon("Dining Out", "🍽");
        assert!(category.matches_name("dining out"));
        assert!(category.matches_name("  DINING OUT "));
        assert_eq!(category.label(), "🍽 Dining Out");

        let location = Location::new("Costco");
        assert!(location.matches_name("costco"));
    }
}
