//! Boundary checks shared by the services and the CLI
//!
//! Every function returns the parsed value on success and a
//! `HalfsiesError::Validation` with a user-facing message on failure.

use chrono::NaiveDate;

use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::{Money, MoneyParseError, Month};

/// Longest accepted name for users, expenses, goals and templates
pub const MAX_NAME_LEN: usize = 100;

/// Longest accepted name for categories and locations
pub const MAX_LABEL_LEN: usize = 50;

/// Longest accepted free-text note
pub const MAX_NOTE_LEN: usize = 500;

/// Largest single amount accepted, 1,000,000,000.00
pub const MAX_AMOUNT: Money = Money::from_cents(100_000_000_000);

pub fn assert_valid_month(input: &str) -> HalfsiesResult<Month> {
    input
        .trim()
        .parse::<Month>()
        .map_err(|e| HalfsiesError::Validation(e.to_string()))
}

pub fn assert_valid_date(input: &str) -> HalfsiesResult<NaiveDate> {
    let trimmed = input.trim();
    let well_formed = trimmed.len() == 10
        && trimmed
            .char_indices()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
    if !well_formed {
        return Err(HalfsiesError::Validation(format!(
            "Invalid date '{}': expected YYYY-MM-DD",
            input
        )));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
        HalfsiesError::Validation(format!("Invalid date '{}': no such calendar day", input))
    })
}

pub fn assert_positive_amount(amount: Money) -> HalfsiesResult<Money> {
    if !amount.is_positive() {
        return Err(HalfsiesError::Validation(format!(
            "Amount must be greater than zero, got {}",
            amount
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(HalfsiesError::Validation(format!(
            "Amount must be at most {}, got {}",
            MAX_AMOUNT, amount
        )));
    }
    Ok(amount)
}

/// Parse a user-entered amount such as `12.50`, `$12.50` or `12`
pub fn parse_amount(input: &str) -> HalfsiesResult<Money> {
    let amount = Money::parse(input).map_err(|e| match e {
        MoneyParseError::TooPrecise(_) => HalfsiesError::Validation(format!(
            "Invalid amount '{}': at most two decimal places",
            input
        )),
        MoneyParseError::InvalidFormat(_) => {
            HalfsiesError::Validation(format!("Invalid amount '{}'", input))
        }
    })?;
    assert_positive_amount(amount)
}

/// Trim a name and check it is non-empty and at most `max_len` characters
pub fn assert_name(kind: &str, input: &str, max_len: usize) -> HalfsiesResult<String> {
    let name = input.trim();
    if name.is_empty() {
        return Err(HalfsiesError::Validation(format!("{} cannot be empty", kind)));
    }
    if name.chars().count() > max_len {
        return Err(HalfsiesError::Validation(format!(
            "{} must be at most {} characters",
            kind, max_len
        )));
    }
    Ok(name.to_string())
}

pub fn assert_note(input: &str) -> HalfsiesResult<String> {
    let note = input.trim();
    if note.chars().count() > MAX_NOTE_LEN {
        return Err(HalfsiesError::Validation(format!(
            "Note must be at most {} characters",
            MAX_NOTE_LEN
        )));
    }
    Ok(note.to_string())
}

/// Loose email shape check: one `@` with text on both sides and a dot after it
pub fn assert_email(input: &str) -> HalfsiesResult<String> {
    let email = input.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email.to_lowercase())
    } else {
        Err(HalfsiesError::Validation(format!(
            "Invalid email address '{}'",
            input
        )))
    }
}
