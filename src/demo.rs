//! Walk-through of the store operations: single and bulk inserts, updates,
//! deletes, transfers, relational listings and aggregates.
//!
//! Every routine runs in sequence against the same store; failures are
//! captured per routine and reported once all of them ran.

use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;
use tracing::{error, info};

use crate::{
    account::{Account, AccountKey, AccountUpdate, NewAccount},
    command::TransferRequest,
    engine::TransferEngine,
    store::{
        AccountAggregate, AccountGroup, AccountQuery, AccountStore, AccountWithTransfers,
        AggregateSelection, GroupField,
    },
};

pub struct TaskReport {
    pub name: &'static str,
    pub result: Result<()>,
}

type Task<S> = (&'static str, fn(&mut S) -> Result<()>);

pub fn run_all<S: AccountStore>(store: &mut S) -> Vec<TaskReport> {
    let tasks: [Task<S>; 10] = [
        ("create user", |s| create_user(s).map(drop)),
        ("list users", |s| list_users(s).map(drop)),
        ("update user", |s| update_user(s).map(drop)),
        ("delete user", |s| delete_user(s).map(drop)),
        ("create multiple users", |s| create_multiple_users(s).map(drop)),
        ("make transactions", make_transactions),
        ("list users with received transactions", |s| {
            list_users_with_received_transactions(s).map(drop)
        }),
        ("advanced search", |s| advanced_search(s).map(drop)),
        ("aggregations", |s| calculate_aggregations(s).map(drop)),
        ("group by", |s| calculate_group_by(s).map(drop)),
    ];

    let reports: Vec<TaskReport> = tasks
        .into_iter()
        .map(|(name, task)| TaskReport {
            name,
            result: task(&mut *store),
        })
        .collect();

    for report in &reports {
        match &report.result {
            Ok(()) => info!(task = report.name, "Task succeeded"),
            Err(err) => error!(task = report.name, error = %format!("{err:#}"), "Task failed"),
        }
    }
    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    info!(succeeded = reports.len() - failed, failed, "Demo finished");
    reports
}

pub fn create_user<S: AccountStore>(store: &mut S) -> Result<Account> {
    let account = store.insert_account(NewAccount::new(
        "john_doe",
        "john@example.com",
        25,
        "USA",
        Decimal::ZERO,
    ))?;
    info!(?account, "Created user");
    Ok(account)
}

pub fn list_users<S: AccountStore>(store: &mut S) -> Result<Vec<Account>> {
    let accounts: Vec<Account> = store
        .list_accounts(&AccountQuery::all())?
        .into_iter()
        .map(|entry| entry.account)
        .collect();
    info!(?accounts, "Users");
    Ok(accounts)
}

pub fn update_user<S: AccountStore>(store: &mut S) -> Result<Account> {
    let account = store.update_account(
        &AccountKey::username("john_doe"),
        AccountUpdate {
            age: Some(26),
            ..Default::default()
        },
    )?;
    info!(?account, "Updated user");
    Ok(account)
}

pub fn delete_user<S: AccountStore>(store: &mut S) -> Result<Account> {
    let account = store.delete_account(&AccountKey::username("john_doe"))?;
    info!(?account, "Deleted user");
    Ok(account)
}

pub fn create_multiple_users<S: AccountStore>(store: &mut S) -> Result<usize> {
    let count = store.insert_accounts(&[
        NewAccount::new("ahmed", "ahmed@cairotech.net", 20, "EG", Decimal::from(10000)),
        NewAccount::new("omar", "omar@cairotech.net", 21, "EG", Decimal::from(10000)),
        NewAccount::new("mahmoud", "mahmoud@cairotech.net", 22, "EG", Decimal::from(10000)),
    ])?;
    info!(count, "Created users");
    Ok(count)
}

pub fn make_transactions<S: AccountStore>(store: &mut S) -> Result<()> {
    let requests = [
        TransferRequest::new(Decimal::from(500), "Payment for services", "ahmed", "omar"),
        TransferRequest::new(Decimal::from(1000), "Monthly allowance", "omar", "mahmoud"),
        TransferRequest::new(Decimal::from(200), "Refund", "mahmoud", "ahmed"),
    ];
    let outcomes = TransferEngine::new(store).apply_transfers(&requests)?;
    let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
    if failed > 0 {
        bail!("{failed} of {} transfers failed", requests.len());
    }
    Ok(())
}

pub fn list_users_with_received_transactions<S: AccountStore>(
    store: &mut S,
) -> Result<Vec<AccountWithTransfers>> {
    let accounts = store.list_accounts(&AccountQuery::all().with_received())?;
    info!(?accounts, "Users with received transactions");
    Ok(accounts)
}

/// Users from EG who received at least one transfer above 500.
pub fn advanced_search<S: AccountStore>(store: &mut S) -> Result<Vec<AccountWithTransfers>> {
    let accounts = store.list_accounts(
        &AccountQuery::all()
            .in_country("EG")
            .received_more_than(Decimal::from(500))
            .with_received(),
    )?;
    info!(?accounts, "Users with received transactions > 500 (country: EG)");
    Ok(accounts)
}

pub fn calculate_aggregations<S: AccountStore>(store: &mut S) -> Result<AccountAggregate> {
    let total = store.aggregate_accounts(AggregateSelection {
        sum_balance: true,
        avg_age: false,
    })?;
    info!(total_balance = ?total.sum_balance, "Total balance of all users");

    let average = store.aggregate_accounts(AggregateSelection {
        sum_balance: false,
        avg_age: true,
    })?;
    info!(average_age = ?average.avg_age, "Average age of all users");

    Ok(AccountAggregate {
        sum_balance: total.sum_balance,
        avg_age: average.avg_age,
    })
}

pub fn calculate_group_by<S: AccountStore>(store: &mut S) -> Result<Vec<AccountGroup>> {
    let count = store
        .insert_accounts(&[
            NewAccount::new("john_doe", "john_doe@example.com", 25, "USA", Decimal::from(1000)),
            NewAccount::new("emily_smith", "emily_smith@example.com", 28, "USA", Decimal::from(1500)),
            NewAccount::new("ali_khan", "ali_khan@example.com", 30, "Pakistan", Decimal::from(2000)),
            NewAccount::new("maria_garcia", "maria_garcia@example.com", 22, "Spain", Decimal::from(1200)),
            NewAccount::new("antonio_lee", "antonio_lee@example.com", 26, "Spain", Decimal::from(1800)),
        ])
        .context("Failed to insert users for grouping")?;
    info!(count, "Created users");

    let groups = store.group_accounts_by(GroupField::Country)?;
    info!(?groups, "Total users and average age per country");
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use crate::store::{
        GroupKey, TransferStore, in_memory::InMemoryAccountStore, sqlite::SqliteAccountStore,
    };

    use super::*;

    fn check_demo<S: AccountStore>(store: &mut S) {
        let reports = run_all(store);
        assert_eq!(reports.len(), 10);
        for report in &reports {
            assert!(report.result.is_ok(), "task `{}` failed", report.name);
        }

        let found = advanced_search(store).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].account.username, "mahmoud");
        assert_eq!(found[0].account.balance, Decimal::from(10800));
        assert_eq!(found[0].received.len(), 1);
        assert_eq!(found[0].received[0].amount, Decimal::from(1000));

        let groups = store.group_accounts_by(GroupField::Country).unwrap();
        let eg = groups
            .iter()
            .find(|g| g.key == GroupKey::Country("EG".to_string()))
            .unwrap();
        assert_eq!((eg.count, eg.avg_age), (3, 21.0));
        assert!(
            store
                .find_account(&AccountKey::username("john_doe"))
                .unwrap()
                .is_some_and(|acc| acc.email == "john_doe@example.com")
        );
    }

    #[test]
    fn demo_runs_on_memory_store() {
        check_demo(&mut InMemoryAccountStore::default());
    }

    #[test]
    fn demo_runs_on_sqlite_store() {
        check_demo(&mut SqliteAccountStore::open_in_memory().unwrap());
    }

    #[test]
    fn failures_are_captured_per_task() {
        let mut store = InMemoryAccountStore::default();
        create_multiple_users(&mut store).unwrap();

        let reports = run_all(&mut store);
        let failed: Vec<_> = reports
            .iter()
            .filter(|r| r.result.is_err())
            .map(|r| r.name)
            .collect();
        // users already exist, so the bulk insert is rejected; later tasks still run
        assert_eq!(failed, vec!["create multiple users"]);
        assert_eq!(
            store.find_account_by_username("omar").unwrap().unwrap().balance,
            Decimal::from(9500)
        );
    }
}
