//! Glue between CSV files and the ledger, shared by the binary and integration tests.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    engine::{TransferEngine, TransferError, TransferOutcome},
    store::{AccountQuery, AccountStore},
};
use csv_parser::read_transfers;
use csv_printer::{Account, print_accounts};

pub mod csv_parser;
pub mod csv_printer;

/// Reads transfer requests from `input`, applies them to `store` and writes
/// the resulting accounts to `output`.
pub struct TransferService<'w, R, W: 'w, S> {
    pub input: R,
    pub output: &'w mut W,
    pub store: S,
    pub error_printer: Box<dyn FnMut(usize, TransferError)>,
}

impl<'w, R, W, S> TransferService<'w, R, W, S>
where
    R: Read,
    W: Write + 'w,
    S: AccountStore,
{
    /// Returns the store so callers can keep using it.
    pub fn run(mut self) -> Result<S> {
        let requests = read_transfers(self.input)?;

        let mut engine = TransferEngine::new(self.store);
        let outcomes = match engine.apply_transfers(&requests) {
            Ok(outcomes) => outcomes,
            Err(mut err) => {
                report_failures(&mut self.error_printer, std::mem::take(&mut err.outcomes));
                return Err(err).context("Transfers aborted");
            }
        };
        report_failures(&mut self.error_printer, outcomes);

        let store = engine.into_store();
        write_accounts(self.output, &store)?;
        Ok(store)
    }
}

fn report_failures(
    error_printer: &mut Box<dyn FnMut(usize, TransferError)>,
    outcomes: Vec<TransferOutcome>,
) {
    for (index, outcome) in outcomes.into_iter().enumerate() {
        if let Err(err) = outcome {
            error_printer(index, err);
        }
    }
}

/// Bulk-inserts the accounts listed in `input`.
pub fn seed_accounts<R, S>(input: R, store: &mut S) -> Result<usize>
where
    R: Read,
    S: AccountStore,
{
    let accounts = csv_parser::read_accounts(input)?;
    let count = store
        .insert_accounts(&accounts)
        .context("Failed to insert accounts")?;
    info!(count, "Accounts created");
    Ok(count)
}

pub fn write_accounts<W, S>(output: &mut W, store: &S) -> Result<()>
where
    W: Write,
    S: AccountStore,
{
    let accounts = store.list_accounts(&AccountQuery::all())?;
    print_accounts(
        output,
        accounts.into_iter().map(|entry| Account::from(entry.account)),
    )
}
