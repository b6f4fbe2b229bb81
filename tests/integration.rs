use std::{cell::RefCell, rc::Rc, str::from_utf8};

use rust_decimal::Decimal;
use transfer_ledger::{
    bin_utils::{TransferService, seed_accounts},
    engine::TransferError,
    store::{
        AccountQuery, AccountStore, in_memory::InMemoryAccountStore, sqlite::SqliteAccountStore,
    },
};

const ACCOUNTS_FILE: &str = include_str!("accounts.csv");
const TRANSFERS_FILE: &str = include_str!("transfers.csv");

fn process_transfers<S: AccountStore>(mut store: S) -> S {
    assert_eq!(seed_accounts(ACCOUNTS_FILE.as_bytes(), &mut store).unwrap(), 3);

    let failures = Rc::new(RefCell::new(Vec::new()));
    let mut output = Vec::new();
    let service = TransferService {
        input: TRANSFERS_FILE.as_bytes(),
        output: &mut output,
        store,
        error_printer: Box::new({
            let failures = Rc::clone(&failures);
            move |index: usize, err: TransferError| failures.borrow_mut().push((index, err))
        }),
    };
    let store = service.run().unwrap();

    let lines: Vec<&str> = from_utf8(&output).unwrap().lines().collect();
    assert_eq!(
        lines,
        vec![
            "id,username,email,age,country,balance",
            "1,ahmed,ahmed@cairotech.net,20,EG,9700",
            "2,omar,omar@cairotech.net,21,EG,9500",
            "3,mahmoud,mahmoud@cairotech.net,22,EG,10800",
        ]
    );

    let failures = failures.borrow();
    assert_eq!(failures.len(), 2);
    assert!(matches!(
        &failures[0],
        (2, TransferError::AccountNotFound { username }) if username == "ghost"
    ));
    assert!(matches!(&failures[1], (3, TransferError::Validation(_))));
    store
}

#[test]
fn process_transfers_in_memory() {
    let store = process_transfers(InMemoryAccountStore::default());
    assert_eq!(store.transfers().len(), 3);
}

#[test]
fn process_transfers_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    process_transfers(SqliteAccountStore::open(&path).unwrap());

    // state is persisted across connections
    let store = SqliteAccountStore::open(&path).unwrap();
    let accounts = store
        .list_accounts(&AccountQuery::all().with_received().with_sent())
        .unwrap();
    let ahmed = &accounts[0];
    assert_eq!(ahmed.account.balance, Decimal::from(9700));
    assert_eq!(ahmed.sent.len(), 1);
    assert_eq!(ahmed.received.len(), 1);
    assert_eq!(ahmed.received[0].description, "Refund");
    let total: usize = accounts.iter().map(|a| a.received.len()).sum();
    assert_eq!(total, 3);
}

#[test]
fn reseeding_existing_accounts_fails() {
    let mut store = InMemoryAccountStore::default();
    seed_accounts(ACCOUNTS_FILE.as_bytes(), &mut store).unwrap();
    let err = seed_accounts(ACCOUNTS_FILE.as_bytes(), &mut store).unwrap_err();
    assert_eq!(
        format!("{err:#}"),
        "Failed to insert accounts: Duplicate username `ahmed`"
    );
}
