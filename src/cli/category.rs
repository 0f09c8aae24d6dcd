//! Category and location commands

use clap::Subcommand;

use super::{resolve_category, resolve_location};
use crate::auth::Session;
use crate::display::{format_category_list, format_location_list};
use crate::error::HalfsiesResult;
use crate::services::{CategoryService, LocationService};
use crate::storage::Storage;

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories with how often each is used
    List,

    /// Create a category
    Add {
        name: String,
        /// Emoji or short symbol shown before the name
        #[arg(short, long)]
        icon: Option<String>,
        /// Hex color such as #4caf50
        #[arg(short, long)]
        color: Option<String>,
    },

    /// Edit a category
    Edit {
        /// Category name or ID
        category: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        icon: Option<String>,
        #[arg(short, long)]
        color: Option<String>,
        #[arg(long, conflicts_with = "icon")]
        clear_icon: bool,
        #[arg(long, conflicts_with = "color")]
        clear_color: bool,
    },

    /// Delete a category
    Delete {
        /// Category name or ID
        category: String,
        /// Move its expenses and recurring bills to this category first
        #[arg(long)]
        reassign_to: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum LocationCommands {
    /// List locations
    List,

    /// Create a location tag
    Add {
        name: String,
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Edit a location
    Edit {
        /// Location name or ID
        location: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        address: Option<String>,
        #[arg(long, conflicts_with = "address")]
        clear_address: bool,
    },

    /// Delete a location, untagging anything that used it
    Delete {
        /// Location name or ID
        location: String,
    },
}

/// `Some(None)` when `clear` is set, `Some(Some(v))` for a new value
fn optional_change(value: Option<String>, clear: bool) -> Option<Option<String>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

pub fn handle_category_command(storage: &Storage, cmd: CategoryCommands) -> HalfsiesResult<()> {
    let service = CategoryService::new(storage);

    match cmd {
        CategoryCommands::List => {
            let mut rows = Vec::new();
            for category in service.list()? {
                let usage = service.usage_count(category.id)?;
                rows.push((category, usage));
            }
            print!("{}", format_category_list(&rows));
        }

        CategoryCommands::Add { name, icon, color } => {
            Session::require_user(storage)?;
            let category = service.create(&name, icon, color)?;
            println!("Created category: {}", category.label());
            println!("  ID: {}", category.id);
        }

        CategoryCommands::Edit {
            category,
            name,
            icon,
            color,
            clear_icon,
            clear_color,
        } => {
            Session::require_user(storage)?;
            let cat = resolve_category(storage, &category)?;
            if name.is_none() && icon.is_none() && color.is_none() && !clear_icon && !clear_color {
                println!("No changes specified. Use --name, --icon or --color.");
                return Ok(());
            }
            let updated = service.update(
                cat.id,
                name.as_deref(),
                optional_change(icon, clear_icon),
                optional_change(color, clear_color),
            )?;
            println!("Updated category: {}", updated.label());
        }

        CategoryCommands::Delete {
            category,
            reassign_to,
        } => {
            Session::require_user(storage)?;
            let cat = resolve_category(storage, &category)?;
            let target = reassign_to
                .as_deref()
                .map(|t| resolve_category(storage, t))
                .transpose()?;
            let moved = service.delete(cat.id, target.as_ref().map(|t| t.id))?;
            println!("Deleted category: {}", cat.name);
            if let Some(target) = target.filter(|_| moved > 0) {
                println!("  Moved {} record(s) to {}", moved, target.name);
            }
        }
    }

    Ok(())
}

pub fn handle_location_command(storage: &Storage, cmd: LocationCommands) -> HalfsiesResult<()> {
    let service = LocationService::new(storage);

    match cmd {
        LocationCommands::List => {
            print!("{}", format_location_list(&service.list()?));
        }

        LocationCommands::Add { name, address } => {
            Session::require_user(storage)?;
            let location = service.create(&name, address)?;
            println!("Created location: {}", location.name);
            println!("  ID: {}", location.id);
        }

        LocationCommands::Edit {
            location,
            name,
            address,
            clear_address,
        } => {
            Session::require_user(storage)?;
            let loc = resolve_location(storage, &location)?;
            if name.is_none() && address.is_none() && !clear_address {
                println!("No changes specified. Use --name or --address.");
                return Ok(());
            }
            let updated = service.update(
                loc.id,
                name.as_deref(),
                optional_change(address, clear_address),
            )?;
            println!("Updated location: {}", updated.name);
        }

        LocationCommands::Delete { location } => {
            Session::require_user(storage)?;
            let loc = resolve_location(storage, &location)?;
            let untagged = service.delete(loc.id)?;
            println!("Deleted location: {}", loc.name);
            if untagged > 0 {
                println!("  Untagged {} record(s)", untagged);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_change() {
        assert_eq!(optional_change(None, false), None);
        assert_eq!(optional_change(None, true), Some(None));
        assert_eq!(optional_change(Some("x".into()), false), Some(Some("x".to_string())));
    }
}
