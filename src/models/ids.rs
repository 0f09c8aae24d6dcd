//! Strongly-typed ID wrappers for all entity types
//!
//! Each entity gets its own UUID newtype so a `CategoryId` can never be passed
//! where an `ExpenseId` is expected. IDs display as a short prefixed form
//! (`exp-1a2b3c4d`), which is also accepted back when looking records up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse a full UUID, with or without the display prefix
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                s.parse()
            }

            /// Whether `identifier` names this ID, either as the full UUID or
            /// as any unambiguous-looking prefix of the short display form
            pub fn matches(&self, identifier: &str) -> bool {
                let identifier = identifier.trim().to_lowercase();
                if identifier.is_empty() {
                    return false;
                }
                if let Ok(parsed) = Self::parse(&identifier) {
                    return parsed == *self;
                }
                let bare = identifier
                    .strip_prefix($display_prefix)
                    .unwrap_or(&identifier);
                bare.len() >= 4 && self.0.simple().to_string().starts_with(bare)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, &self.0.simple().to_string()[..8])
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(UserId, "usr-");
define_id!(ExpenseId, "exp-");
define_id!(CategoryId, "cat-");
define_id!(LocationId, "loc-");
define_id!(RecurringId, "rec-");
define_id!(SettlementId, "stl-");
define_id!(GoalId, "goal-");
define_id!(ContributionId, "ctb-");
define_id!(ReceiptId, "rcp-");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        let id = ExpenseId::new();
        let display = id.to_string();
        assert!(display.starts_with("exp-"));
        assert_eq!(display.len(), 12);
    }

    #[test]
    fn test_parse_full_uuid_with_prefix() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let plain = UserId::parse(uuid_str).unwrap();
        let prefixed: UserId = format!("usr-{}", uuid_str).parse().unwrap();
        assert_eq!(plain, prefixed);
        assert_eq!(plain.as_uuid().to_string(), uuid_str);
    }

    #[test]
    fn test_matches_short_form() {
        let id = CategoryId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert!(id.matches("cat-550e8400"));
        assert!(id.matches("550e84"));
        assert!(id.matches("CAT-550E8400"));
        assert!(!id.matches("cat-"));
        assert!(!id.matches("550"));
        assert!(!id.matches("cat-deadbeef"));
    }

    #[test]
    fn test_id_serialization_is_transparent() {
        let id = GoalId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
        let back: GoalId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
