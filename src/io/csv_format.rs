//! CSV format handling for ledger operations and balance output
//!
//! This module centralizes all CSV format concerns:
//! - CsvRecord structure for deserialization (`type,user,counterparty,amount`)
//! - Conversion from CSV records to [`LedgerOperation`]
//! - Balance output serialization (`username,balance`)
//!
//! All functions are pure (no file access) for easy testing.

use crate::types::{Account, LedgerError, LedgerOperation, Money, OperationType};
use serde::Deserialize;
use std::io::Write;

/// One raw CSV row
///
/// `counterparty` and `amount` may be empty; whether they are required depends
/// on the operation type.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub op_type: String,
    pub user: String,
    pub counterparty: Option<String>,
    pub amount: Option<String>,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Convert a raw CSV row into a ledger operation
///
/// Operation types are case-insensitive. Amounts must be decimal numbers with
/// at most two decimal places. Deposits, withdrawals and transfers need an
/// amount; transfers also need a counterparty.
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<LedgerOperation, LedgerError> {
    let op = match csv_record.op_type.trim().to_lowercase().as_str() {
        "open" => OperationType::Open,
        "deposit" => OperationType::Deposit,
        "withdrawal" => OperationType::Withdrawal,
        "transfer" => OperationType::Transfer,
        _ => {
            return Err(LedgerError::parse(format!(
                "Invalid operation type: '{}' for user {}",
                csv_record.op_type, csv_record.user
            )))
        }
    };

    let username = csv_record.user.trim().to_string();
    if username.is_empty() {
        return Err(LedgerError::parse("Missing user"));
    }

    let amount = non_empty(csv_record.amount)
        .map(|raw| raw.parse::<Money>())
        .transpose()?;
    let counterparty = non_empty(csv_record.counterparty);

    match op {
        OperationType::Deposit | OperationType::Withdrawal | OperationType::Transfer
            if amount.is_none() =>
        {
            return Err(LedgerError::parse(format!(
                "{:?} for user {} requires an amount",
                op, username
            )));
        }
        OperationType::Transfer if counterparty.is_none() => {
            return Err(LedgerError::parse(format!(
                "Transfer for user {} requires a counterparty",
                username
            )));
        }
        _ => {}
    }

    Ok(LedgerOperation {
        op,
        username,
        counterparty,
        amount,
    })
}

/// Write `username,balance` rows sorted by username
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["username", "balance"])?;

    let mut sorted: Vec<&Account> = accounts.iter().collect();
    sorted.sort_by(|a, b| a.username.cmp(&b.username));

    for account in sorted {
        let balance = account.balance.to_string();
        writer.write_record([account.username.as_str(), balance.as_str()])?;
    }

    writer.flush()?;
    Ok(())
}
