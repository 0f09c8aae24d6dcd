//! Halfsies - two-person household expense sharing
//!
//! A household of two members records shared expenses, each tagged with who
//! paid and how it splits. Halfsies works out month by month who owes whom,
//! tracks settlement payments, recurring bills, savings goals and receipts,
//! and keeps a change log of every mutation.
//!
//! # Architecture
//!
//! - `config`: data directory resolution and household settings
//! - `error`: the crate error type
//! - `models`: records and value types (money, months, ids)
//! - `storage`: JSON file collections and the receipt file store
//! - `audit`: append-only change log
//! - `auth`: password hashing and the login session
//! - `services`: business rules on top of storage
//! - `display`: terminal formatting
//! - `export`: CSV, JSON and YAML export
//! - `email`: outbound statement email
//! - `cli`: clap subcommands and their handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use halfsies::config::HalfsiesPaths;
//! use halfsies::services::SettlementService;
//! use halfsies::storage::Storage;
//!
//! let storage = Storage::open(HalfsiesPaths::new()?)?;
//! let data = SettlementService::new(&storage).month_data(Month::current())?;
//! println!("{}", data.describe_balance("$"));
//! ```

pub mod audit;
pub mod auth;
pub mod cli;
pub mod config;
pub mod display;
pub mod email;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;
pub mod validation;

pub use error::{HalfsiesError, HalfsiesResult};
