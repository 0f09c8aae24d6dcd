//! Terminal output
//!
//! Lists render as `tabled` tables; detail views and reports are plain
//! aligned text.

pub mod expense;
pub mod goal;
pub mod household;
pub mod report;

use std::collections::HashMap;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::error::HalfsiesResult;
use crate::models::{CategoryId, LocationId, UserId};
use crate::storage::Storage;

pub use expense::{format_expense_details, format_expense_list};
pub use goal::{format_goal_details, format_goal_list};
pub use household::{
    format_category_list, format_location_list, format_receipt_list, format_recurring_list,
    format_settlement_list, format_user_list,
};
pub use report::{format_analytics, format_integrity_report, format_month_data};

/// Id-to-name lookups for rendering records that reference each other
#[derive(Debug, Default)]
pub struct Names {
    users: HashMap<UserId, String>,
    categories: HashMap<CategoryId, String>,
    locations: HashMap<LocationId, String>,
}

impl Names {
    pub fn load(storage: &Storage) -> HalfsiesResult<Self> {
        Ok(Self {
            users: storage.users.all()?.into_iter().map(|u| (u.id, u.name)).collect(),
            categories: storage
                .categories
                .all()?
                .into_iter()
                .map(|c| (c.id, c.label()))
                .collect(),
            locations: storage
                .locations
                .all()?
                .into_iter()
                .map(|l| (l.id, l.name))
                .collect(),
        })
    }

    pub fn user(&self, id: UserId) -> &str {
        self.users.get(&id).map(String::as_str).unwrap_or("Unknown")
    }

    pub fn category(&self, id: CategoryId) -> &str {
        self.categories.get(&id).map(String::as_str).unwrap_or("Unknown")
    }

    pub fn location(&self, id: Option<LocationId>) -> &str {
        match id {
            Some(id) => self.locations.get(&id).map(String::as_str).unwrap_or("Unknown"),
            None => "",
        }
    }
}

/// Render rows as a table, or `empty` when there are none
pub fn table<T: Tabled>(rows: Vec<T>, empty: &str) -> String {
    if rows.is_empty() {
        return format!("{}\n", empty);
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    format!("{}\n", table)
}

/// Shorten `s` to `max` characters, marking the cut with "..."
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Name")]
        name: &'static str,
    }

    #[test]
    fn test_table_and_empty_message() {
        assert_eq!(table(Vec::<Row>::new(), "Nothing here."), "Nothing here.\n");
        let rendered = table(vec![Row { name: "Alex" }], "Nothing here.");
        assert!(rendered.contains("Name"));
        assert!(rendered.contains("Alex"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long description", 10), "a very ...");
    }
}
