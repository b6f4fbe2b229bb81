//! SQLite-backed account store.
//!
//! Balances and amounts are stored as decimal text so no precision is lost;
//! arithmetic on them happens in Rust, inside a savepoint.

use std::{path::Path, str::FromStr};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, ffi, types::Type};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::account::{
    Account, AccountId, AccountKey, AccountUpdate, NewAccount, NewTransferRecord, TransferRecord,
};

use super::{
    AccountAggregate, AccountGroup, AccountQuery, AccountStore, AccountWithTransfers,
    AggregateSelection, GroupField, GroupKey, StoreError, StoreResult, TransferStore,
    sum_balances,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY NOT NULL,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    age INTEGER NOT NULL,
    country TEXT NOT NULL,
    balance TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transfers (
    id INTEGER PRIMARY KEY NOT NULL,
    amount TEXT NOT NULL,
    description TEXT NOT NULL,
    created_at TEXT NOT NULL,
    sender_id INTEGER NOT NULL REFERENCES accounts(id),
    recipient_id INTEGER NOT NULL REFERENCES accounts(id)
);

CREATE INDEX IF NOT EXISTS idx_transfers_sender ON transfers(sender_id);
CREATE INDEX IF NOT EXISTS idx_transfers_recipient ON transfers(recipient_id);
";

const ACCOUNT_COLUMNS: &str = "id, username, email, age, country, balance, created_at";
const TRANSFER_COLUMNS: &str = "id, amount, description, created_at, sender_id, recipient_id";

const TRANSFER_SAVEPOINT: &str = "transfer";

pub struct SqliteAccountStore {
    conn: Connection,
    in_transaction: bool,
}

impl SqliteAccountStore {
    /// Opens (creating if needed) the database file and its tables.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Opening SQLite account store");
        let conn = Connection::open(path).map_err(unavailable)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(unavailable)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(store_error)?;
        conn.execute_batch(SCHEMA).map_err(store_error)?;
        Ok(Self {
            conn,
            in_transaction: false,
        })
    }

    fn account_by_id(conn: &Connection, id: AccountId) -> StoreResult<Option<Account>> {
        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = :id"),
            rusqlite::named_params! { ":id": id },
            account_from_row,
        )
        .optional()
        .map_err(store_error)
    }

    fn all_transfers(&self) -> StoreResult<Vec<TransferRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TRANSFER_COLUMNS} FROM transfers ORDER BY id"))
            .map_err(store_error)?;
        stmt.query_map([], transfer_from_row)
            .map_err(store_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_error)
    }

    fn insert_account_row(conn: &Connection, account: NewAccount) -> StoreResult<Account> {
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO accounts (username, email, age, country, balance, created_at)
             VALUES (:username, :email, :age, :country, :balance, :created_at)",
            rusqlite::named_params! {
                ":username": account.username,
                ":email": account.email,
                ":age": account.age,
                ":country": account.country,
                ":balance": account.balance.to_string(),
                ":created_at": created_at.to_rfc3339(),
            },
        )
        .map_err(|err| duplicate_or_store_error(err, &account.username, &account.email))?;
        let id = conn.last_insert_rowid();
        Ok(account.into_account(id, created_at))
    }
}

impl TransferStore for SqliteAccountStore {
    fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        self.conn
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = :username"),
                rusqlite::named_params! { ":username": username },
                account_from_row,
            )
            .optional()
            .map_err(store_error)
    }

    fn update_account_balance(&mut self, id: AccountId, delta: Decimal) -> StoreResult<Account> {
        let sp = self.conn.savepoint().map_err(store_error)?;
        let Some(mut account) = Self::account_by_id(&sp, id)? else {
            return Err(StoreError::account_not_found(AccountKey::Id(id)));
        };
        account.balance = account
            .balance
            .checked_add(delta)
            .ok_or_else(|| StoreError::Backend(format!("Balance overflow for account {id}")))?;
        sp.execute(
            "UPDATE accounts SET balance = :balance WHERE id = :id",
            rusqlite::named_params! { ":balance": account.balance.to_string(), ":id": id },
        )
        .map_err(store_error)?;
        sp.commit().map_err(store_error)?;
        Ok(account)
    }

    fn insert_transfer_record(
        &mut self,
        record: NewTransferRecord,
    ) -> StoreResult<TransferRecord> {
        self.conn
            .execute(
                "INSERT INTO transfers (amount, description, created_at, sender_id, recipient_id)
                 VALUES (:amount, :description, :created_at, :sender_id, :recipient_id)",
                rusqlite::named_params! {
                    ":amount": record.amount.to_string(),
                    ":description": record.description,
                    ":created_at": record.created_at.to_rfc3339(),
                    ":sender_id": record.sender_id,
                    ":recipient_id": record.recipient_id,
                },
            )
            .map_err(store_error)?;
        let id = self.conn.last_insert_rowid();
        Ok(record.into_record(id))
    }

    fn begin(&mut self) -> StoreResult<()> {
        if self.in_transaction || !self.conn.is_autocommit() {
            return Err(StoreError::Transaction(
                "a transaction is already open".to_string(),
            ));
        }
        self.conn
            .execute_batch(&format!("SAVEPOINT {TRANSFER_SAVEPOINT};"))
            .map_err(store_error)?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        if !self.in_transaction {
            return Err(StoreError::Transaction("no open transaction".to_string()));
        }
        self.conn
            .execute_batch(&format!("RELEASE {TRANSFER_SAVEPOINT};"))
            .map_err(store_error)?;
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        if !self.in_transaction {
            return Err(StoreError::Transaction("no open transaction".to_string()));
        }
        self.in_transaction = false;
        let result = self
            .conn
            .execute_batch(&format!(
                "ROLLBACK TO {TRANSFER_SAVEPOINT}; RELEASE {TRANSFER_SAVEPOINT};"
            ))
            .map_err(store_error);
        if result.is_err() && !self.conn.is_autocommit() {
            // the savepoint is the outermost transaction, drop it as a whole
            if let Err(err) = self.conn.execute_batch("ROLLBACK;") {
                warn!(error = %err, "Failed to abandon pending transaction");
            }
        }
        result
    }
}

impl AccountStore for SqliteAccountStore {
    fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account> {
        Self::insert_account_row(&self.conn, account)
    }

    fn insert_accounts(&mut self, accounts: &[NewAccount]) -> StoreResult<usize> {
        // dropping the savepoint on error rolls back the rows inserted so far
        let sp = self.conn.savepoint().map_err(store_error)?;
        for account in accounts {
            Self::insert_account_row(&sp, account.clone())?;
        }
        sp.commit().map_err(store_error)?;
        Ok(accounts.len())
    }

    fn find_account(&self, key: &AccountKey) -> StoreResult<Option<Account>> {
        match key {
            AccountKey::Id(id) => Self::account_by_id(&self.conn, *id),
            AccountKey::Username(username) => self.find_account_by_username(username),
        }
    }

    fn update_account(&mut self, key: &AccountKey, update: AccountUpdate) -> StoreResult<Account> {
        let Some(mut account) = self.find_account(key)? else {
            return Err(StoreError::account_not_found(key));
        };
        update.apply_to(&mut account);
        self.conn
            .execute(
                "UPDATE accounts SET email = :email, age = :age, country = :country
                 WHERE id = :id",
                rusqlite::named_params! {
                    ":email": account.email,
                    ":age": account.age,
                    ":country": account.country,
                    ":id": account.id,
                },
            )
            .map_err(|err| duplicate_or_store_error(err, &account.username, &account.email))?;
        Ok(account)
    }

    fn delete_account(&mut self, key: &AccountKey) -> StoreResult<Account> {
        let Some(account) = self.find_account(key)? else {
            return Err(StoreError::account_not_found(key));
        };
        self.conn
            .execute(
                "DELETE FROM accounts WHERE id = :id",
                rusqlite::named_params! { ":id": account.id },
            )
            .map_err(store_error)?;
        Ok(account)
    }

    fn list_accounts(&self, query: &AccountQuery) -> StoreResult<Vec<AccountWithTransfers>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {ACCOUNT_COLUMNS} FROM accounts
                 WHERE (:country IS NULL OR country = :country)
                 ORDER BY id"
            ))
            .map_err(store_error)?;
        let accounts = stmt
            .query_map(
                rusqlite::named_params! { ":country": query.country },
                account_from_row,
            )
            .map_err(store_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_error)?;
        let transfers = self.all_transfers()?;

        let mut result = Vec::new();
        for account in accounts {
            let received: Vec<&TransferRecord> = transfers
                .iter()
                .filter(|tx| tx.recipient_id == account.id)
                .collect();
            if !query.matches(&account, &received) {
                continue;
            }
            let received = if query.include_received {
                received.into_iter().cloned().collect()
            } else {
                Vec::new()
            };
            let sent = if query.include_sent {
                transfers
                    .iter()
                    .filter(|tx| tx.sender_id == account.id)
                    .cloned()
                    .collect()
            } else {
                Vec::new()
            };
            result.push(AccountWithTransfers {
                account,
                received,
                sent,
            });
        }
        Ok(result)
    }

    fn aggregate_accounts(&self, selection: AggregateSelection) -> StoreResult<AccountAggregate> {
        let mut aggregate = AccountAggregate::default();
        if selection.sum_balance {
            let mut stmt = self
                .conn
                .prepare("SELECT balance FROM accounts")
                .map_err(store_error)?;
            let balances = stmt
                .query_map([], |row| decimal_column(row, 0))
                .map_err(store_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(store_error)?;
            if !balances.is_empty() {
                aggregate.sum_balance = Some(sum_balances(balances)?);
            }
        }
        if selection.avg_age {
            aggregate.avg_age = self
                .conn
                .query_row("SELECT AVG(age) FROM accounts", [], |row| row.get(0))
                .map_err(store_error)?;
        }
        Ok(aggregate)
    }

    fn group_accounts_by(&self, field: GroupField) -> StoreResult<Vec<AccountGroup>> {
        let column = match field {
            GroupField::Country => "country",
            GroupField::Age => "age",
        };
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {column}, COUNT(*), AVG(age) FROM accounts
                 GROUP BY {column} ORDER BY {column}"
            ))
            .map_err(store_error)?;
        stmt.query_map([], |row| {
            let key = match field {
                GroupField::Country => GroupKey::Country(row.get(0)?),
                GroupField::Age => GroupKey::Age(row.get(0)?),
            };
            Ok(AccountGroup {
                key,
                count: row.get::<_, i64>(1)? as u64,
                avg_age: row.get(2)?,
            })
        })
        .map_err(store_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(store_error)
    }
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        age: row.get(3)?,
        country: row.get(4)?,
        balance: decimal_column(row, 5)?,
        created_at: timestamp_column(row, 6)?,
    })
}

fn transfer_from_row(row: &Row<'_>) -> rusqlite::Result<TransferRecord> {
    Ok(TransferRecord {
        id: row.get(0)?,
        amount: decimal_column(row, 1)?,
        description: row.get(2)?,
        created_at: timestamp_column(row, 3)?,
        sender_id: row.get(4)?,
        recipient_id: row.get(5)?,
    })
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn unavailable(err: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn store_error(err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        match failure.code {
            ErrorCode::CannotOpen
            | ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::SystemIoFailure
            | ErrorCode::NotADatabase
            | ErrorCode::ReadOnly
            | ErrorCode::DiskFull => return unavailable(err),
            ErrorCode::ConstraintViolation
                if failure.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                return StoreError::ForeignKeyViolation(err.to_string());
            }
            _ => {}
        }
    }
    StoreError::Backend(err.to_string())
}

fn duplicate_or_store_error(err: rusqlite::Error, username: &str, email: &str) -> StoreError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE {
            if message.ends_with("accounts.username") {
                return StoreError::DuplicateConstraintViolation {
                    field: "username",
                    value: username.to_string(),
                };
            }
            if message.ends_with("accounts.email") {
                return StoreError::DuplicateConstraintViolation {
                    field: "email",
                    value: email.to_string(),
                };
            }
        }
    }
    store_error(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn egypt() -> Vec<NewAccount> {
        ["ahmed", "omar", "mahmoud"]
            .into_iter()
            .zip(20..)
            .map(|(name, age)| {
                NewAccount::new(
                    name,
                    format!("{name}@cairotech.net"),
                    age,
                    "EG",
                    Decimal::from(10000),
                )
            })
            .collect()
    }

    #[test]
    fn tables_are_created() {
        let store = SqliteAccountStore::open_in_memory().unwrap();
        let count: i64 = store
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('accounts', 'transfers')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
        let enabled: i32 = store
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn insert_find_and_duplicates() {
        let mut store = SqliteAccountStore::open_in_memory().unwrap();
        assert_eq!(store.insert_accounts(&egypt()).unwrap(), 3);

        let omar = store.find_account_by_username("omar").unwrap().unwrap();
        assert_eq!(omar.id, 2);
        assert_eq!(omar.email, "omar@cairotech.net");
        assert_eq!(omar.balance, Decimal::from(10000));

        let err = store
            .insert_account(NewAccount::new("omar", "x@y.z", 1, "EG", Decimal::ZERO))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateConstraintViolation {
                field: "username",
                value: "omar".to_string()
            }
        );
        let err = store
            .insert_account(NewAccount::new("omar2", "omar@cairotech.net", 1, "EG", Decimal::ZERO))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::DuplicateConstraintViolation { field: "email", .. }
        ));
    }

    #[test]
    fn failing_bulk_insert_inserts_nothing() {
        let mut store = SqliteAccountStore::open_in_memory().unwrap();
        let mut accounts = egypt();
        accounts.push(NewAccount::new("ahmed", "dup@x.y", 1, "EG", Decimal::ZERO));
        assert!(store.insert_accounts(&accounts).is_err());
        assert!(store.list_accounts(&AccountQuery::all()).unwrap().is_empty());
    }

    #[test]
    fn balance_updates_keep_precision() {
        let mut store = SqliteAccountStore::open_in_memory().unwrap();
        store.insert_accounts(&egypt()).unwrap();
        let delta = Decimal::from_str("-0.1").unwrap();
        store.update_account_balance(1, delta).unwrap();
        let acc = store.update_account_balance(1, delta).unwrap();
        assert_eq!(acc.balance, Decimal::from_str("9999.8").unwrap());
        assert!(matches!(
            store.update_account_balance(99, delta).unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }

    #[test]
    fn savepoint_rollback_and_commit() {
        let mut store = SqliteAccountStore::open_in_memory().unwrap();
        store.insert_accounts(&egypt()).unwrap();
        let record = NewTransferRecord {
            amount: Decimal::from(500),
            description: "Payment for services".to_string(),
            created_at: Utc::now(),
            sender_id: 1,
            recipient_id: 2,
        };

        store.begin().unwrap();
        assert!(matches!(store.begin().unwrap_err(), StoreError::Transaction(_)));
        store.update_account_balance(1, Decimal::from(-500)).unwrap();
        store.insert_transfer_record(record.clone()).unwrap();
        store.rollback().unwrap();
        assert!(store.all_transfers().unwrap().is_empty());
        assert_eq!(
            store.find_account_by_username("ahmed").unwrap().unwrap().balance,
            Decimal::from(10000)
        );

        store.begin().unwrap();
        store.update_account_balance(1, Decimal::from(-500)).unwrap();
        let inserted = store.insert_transfer_record(record).unwrap();
        store.commit().unwrap();
        assert_eq!(store.all_transfers().unwrap(), vec![inserted]);
        assert!(matches!(store.commit().unwrap_err(), StoreError::Transaction(_)));
    }

    #[test]
    fn failed_rollback_closes_the_transaction() {
        let mut store = SqliteAccountStore::open_in_memory().unwrap();
        store.insert_accounts(&egypt()).unwrap();

        store.begin().unwrap();
        store.update_account_balance(1, Decimal::from(-500)).unwrap();
        store
            .conn
            .execute_batch(&format!("RELEASE {TRANSFER_SAVEPOINT};"))
            .unwrap();
        assert!(matches!(store.rollback().unwrap_err(), StoreError::Backend(_)));
        assert!(!store.in_transaction);

        store.begin().unwrap();
        store.update_account_balance(2, Decimal::from(500)).unwrap();
        store.commit().unwrap();
        assert_eq!(
            store.find_account_by_username("omar").unwrap().unwrap().balance,
            Decimal::from(10500)
        );
    }

    #[test]
    fn begin_refuses_pending_outer_transaction() {
        let mut store = SqliteAccountStore::open_in_memory().unwrap();
        store.conn.execute_batch("BEGIN;").unwrap();
        assert!(matches!(store.begin().unwrap_err(), StoreError::Transaction(_)));
        store.conn.execute_batch("ROLLBACK;").unwrap();
        store.begin().unwrap();
        store.rollback().unwrap();
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let mut store = SqliteAccountStore::open_in_memory().unwrap();
        store.insert_accounts(&egypt()).unwrap();
        let err = store
            .insert_transfer_record(NewTransferRecord {
                amount: Decimal::ONE,
                description: String::new(),
                created_at: Utc::now(),
                sender_id: 1,
                recipient_id: 42,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));

        store
            .insert_transfer_record(NewTransferRecord {
                amount: Decimal::ONE,
                description: String::new(),
                created_at: Utc::now(),
                sender_id: 1,
                recipient_id: 2,
            })
            .unwrap();
        let err = store.delete_account(&AccountKey::Id(2)).unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
        let deleted = store.delete_account(&AccountKey::username("mahmoud")).unwrap();
        assert_eq!(deleted.id, 3);
    }

    #[test]
    fn update_profile() {
        let mut store = SqliteAccountStore::open_in_memory().unwrap();
        store.insert_accounts(&egypt()).unwrap();
        let updated = store
            .update_account(
                &AccountKey::username("ahmed"),
                AccountUpdate {
                    age: Some(26),
                    country: Some("USA".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.age, 26);
        assert_eq!(
            store.find_account(&AccountKey::Id(1)).unwrap().unwrap().country,
            "USA"
        );
        let err = store
            .update_account(&AccountKey::username("ghost"), AccountUpdate::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn aggregates_and_groups() {
        let mut store = SqliteAccountStore::open_in_memory().unwrap();
        assert_eq!(
            store.aggregate_accounts(AggregateSelection::all()).unwrap(),
            AccountAggregate::default()
        );
        store
            .insert_accounts(&[
                NewAccount::new("john_doe", "john_doe@example.com", 25, "USA", Decimal::from(1000)),
                NewAccount::new("emily_smith", "emily_smith@example.com", 28, "USA", Decimal::from(1500)),
                NewAccount::new("ali_khan", "ali_khan@example.com", 30, "Pakistan", Decimal::from(2000)),
                NewAccount::new("maria_garcia", "maria_garcia@example.com", 22, "Spain", Decimal::from(1200)),
                NewAccount::new("antonio_lee", "antonio_lee@example.com", 26, "Spain", Decimal::from(1800)),
            ])
            .unwrap();

        let aggregate = store.aggregate_accounts(AggregateSelection::all()).unwrap();
        assert_eq!(aggregate.sum_balance, Some(Decimal::from(7500)));
        assert_eq!(aggregate.avg_age, Some(26.2));

        let groups = store.group_accounts_by(GroupField::Country).unwrap();
        let summary: Vec<_> = groups
            .iter()
            .map(|g| (g.key.to_string(), g.count, g.avg_age))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Pakistan".to_string(), 1, 30.0),
                ("Spain".to_string(), 2, 24.0),
                ("USA".to_string(), 2, 26.5),
            ]
        );
        let by_age = store.group_accounts_by(GroupField::Age).unwrap();
        assert_eq!(by_age.first().map(|g| &g.key), Some(&GroupKey::Age(22)));
    }

    #[test]
    fn balance_sum_overflow_is_an_error() {
        let mut store = SqliteAccountStore::open_in_memory().unwrap();
        store
            .insert_accounts(&[
                NewAccount::new("whale", "whale@example.com", 40, "USA", Decimal::MAX),
                NewAccount::new("orca", "orca@example.com", 41, "USA", Decimal::MAX),
            ])
            .unwrap();
        let err = store.aggregate_accounts(AggregateSelection::all()).unwrap_err();
        assert_eq!(err, StoreError::Backend("Balance sum overflow".to_string()));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        {
            let mut store = SqliteAccountStore::open(&path).unwrap();
            store.insert_accounts(&egypt()).unwrap();
        }
        let store = SqliteAccountStore::open(&path).unwrap();
        assert_eq!(store.list_accounts(&AccountQuery::all()).unwrap().len(), 3);
    }

    #[test]
    fn unreachable_database_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("ledger.db");
        let err = SqliteAccountStore::open(path).err().unwrap();
        assert!(err.is_unavailable());
    }
}
