//! Household member commands

use clap::Subcommand;
use zeroize::Zeroizing;

use super::{password_or_prompt, resolve_user};
use crate::auth::{prompt_new_password, Session};
use crate::display::format_user_list;
use crate::error::HalfsiesResult;
use crate::services::UserService;
use crate::storage::Storage;

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a household member (at most two)
    Register {
        name: String,
        email: String,
        /// Password; prompted for when omitted
        #[arg(long, env = "HALFSIES_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Log in as a member
    Login {
        email: String,
        #[arg(long, env = "HALFSIES_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// End the current session
    Logout,

    /// Show who is logged in
    Whoami,

    /// List household members
    List,

    /// Change your name or email
    Edit {
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Change your password
    Passwd {
        #[arg(long, env = "HALFSIES_PASSWORD", hide_env_values = true)]
        current: Option<String>,
        #[arg(long = "new", env = "HALFSIES_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },

    /// Remove a member who has no expenses, settlements or contributions
    Delete {
        /// Member name, email or ID
        user: String,
    },
}

pub fn handle_user_command(storage: &Storage, cmd: UserCommands) -> HalfsiesResult<()> {
    let service = UserService::new(storage);

    match cmd {
        UserCommands::Register {
            name,
            email,
            password,
        } => {
            let password = match password {
                Some(p) => Zeroizing::new(p),
                None => prompt_new_password()?,
            };
            let user = service.register(&name, &email, &password)?;
            println!("Registered {} <{}>", user.name, user.email);
            println!("  ID: {}", user.id);
            if service.list()?.len() == 1 {
                println!("Register your partner next, then log in with 'halfsies user login'.");
            }
        }

        UserCommands::Login { email, password } => {
            let password = password_or_prompt(password, "Password: ")?;
            let user = Session::login(storage, &email, &password)?;
            println!("Logged in as {}", user.name);
        }

        UserCommands::Logout => {
            if Session::logout(storage.paths())? {
                println!("Logged out.");
            } else {
                println!("Not logged in.");
            }
        }

        UserCommands::Whoami => match Session::current(storage)? {
            Some(user) => println!("{} <{}>", user.name, user.email),
            None => println!("Not logged in."),
        },

        UserCommands::List => {
            let current = Session::current(storage)?.map(|u| u.id);
            print!("{}", format_user_list(&service.list()?, current));
        }

        UserCommands::Edit { name, email } => {
            let me = Session::require_user(storage)?;
            if name.is_none() && email.is_none() {
                println!("No changes specified. Use --name or --email.");
                return Ok(());
            }
            let updated = service.update_profile(me.id, name.as_deref(), email.as_deref())?;
            println!("Updated profile: {} <{}>", updated.name, updated.email);
        }

        UserCommands::Passwd {
            current,
            new_password,
        } => {
            let me = Session::require_user(storage)?;
            let current = password_or_prompt(current, "Current password: ")?;
            let new_password = match new_password {
                Some(p) => Zeroizing::new(p),
                None => prompt_new_password()?,
            };
            service.change_password(me.id, &current, &new_password)?;
            println!("Password changed.");
        }

        UserCommands::Delete { user } => {
            Session::require_user(storage)?;
            let target = resolve_user(storage, &user)?;
            let deleted = service.delete(target.id)?;
            if Session::current(storage)?.is_none() {
                Session::logout(storage.paths())?;
            }
            println!("Deleted member: {}", deleted.name);
        }
    }

    Ok(())
}

