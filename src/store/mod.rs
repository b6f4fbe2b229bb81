use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::{
    Account, AccountId, AccountKey, AccountUpdate, NewAccount, NewTransferRecord, TransferRecord,
};

pub mod in_memory;
pub mod sqlite;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("Duplicate {field} `{value}`")]
    DuplicateConstraintViolation { field: &'static str, value: String },
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Transaction error: {0}")]
    Transaction(String),
    #[error("Store error: {0}")]
    Backend(String),
}

impl StoreError {
    pub(crate) fn account_not_found(key: impl fmt::Display) -> Self {
        Self::NotFound {
            entity: "Account",
            key: key.to_string(),
        }
    }

    /// Connectivity failures abort a whole batch instead of a single request.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

pub(crate) fn sum_balances(balances: impl IntoIterator<Item = Decimal>) -> StoreResult<Decimal> {
    balances
        .into_iter()
        .try_fold(Decimal::ZERO, |total, balance| total.checked_add(balance))
        .ok_or_else(|| StoreError::Backend("Balance sum overflow".to_string()))
}

/// The part of the store the transfer engine needs.
///
/// Every call is a single unit of work. `begin`/`commit`/`rollback` group calls
/// into one all-or-nothing change; at most one transaction is open at a time.
pub trait TransferStore {
    fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>>;

    /// Adds `delta` (which may be negative) to the balance, atomically.
    fn update_account_balance(&mut self, id: AccountId, delta: Decimal) -> StoreResult<Account>;

    fn insert_transfer_record(&mut self, record: NewTransferRecord)
    -> StoreResult<TransferRecord>;

    fn begin(&mut self) -> StoreResult<()>;

    fn commit(&mut self) -> StoreResult<()>;

    fn rollback(&mut self) -> StoreResult<()>;
}

impl<S> TransferStore for &mut S
where
    S: TransferStore + ?Sized,
{
    fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        (**self).find_account_by_username(username)
    }

    fn update_account_balance(&mut self, id: AccountId, delta: Decimal) -> StoreResult<Account> {
        (**self).update_account_balance(id, delta)
    }

    fn insert_transfer_record(
        &mut self,
        record: NewTransferRecord,
    ) -> StoreResult<TransferRecord> {
        (**self).insert_transfer_record(record)
    }

    fn begin(&mut self) -> StoreResult<()> {
        (**self).begin()
    }

    fn commit(&mut self) -> StoreResult<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> StoreResult<()> {
        (**self).rollback()
    }
}

/// Full account store: onboarding, listing, aggregation.
pub trait AccountStore: TransferStore {
    fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account>;

    /// Inserts all accounts or none of them, returning how many were inserted.
    fn insert_accounts(&mut self, accounts: &[NewAccount]) -> StoreResult<usize>;

    fn find_account(&self, key: &AccountKey) -> StoreResult<Option<Account>>;

    fn update_account(&mut self, key: &AccountKey, update: AccountUpdate) -> StoreResult<Account>;

    fn delete_account(&mut self, key: &AccountKey) -> StoreResult<Account>;

    fn list_accounts(&self, query: &AccountQuery) -> StoreResult<Vec<AccountWithTransfers>>;

    fn aggregate_accounts(&self, selection: AggregateSelection) -> StoreResult<AccountAggregate>;

    fn group_accounts_by(&self, field: GroupField) -> StoreResult<Vec<AccountGroup>>;
}

/// Filter and include options for [`AccountStore::list_accounts`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountQuery {
    pub country: Option<String>,
    /// Keep only accounts that received at least one transfer above this amount.
    pub received_amount_gt: Option<Decimal>,
    pub include_received: bool,
    pub include_sent: bool,
}

impl AccountQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_received(mut self) -> Self {
        self.include_received = true;
        self
    }

    pub fn with_sent(mut self) -> Self {
        self.include_sent = true;
        self
    }

    pub fn in_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn received_more_than(mut self, amount: Decimal) -> Self {
        self.received_amount_gt = Some(amount);
        self
    }

    pub(crate) fn matches(&self, account: &Account, received: &[&TransferRecord]) -> bool {
        if let Some(country) = &self.country {
            if account.country != *country {
                return false;
            }
        }
        match self.received_amount_gt {
            Some(threshold) => received.iter().any(|tx| tx.amount > threshold),
            None => true,
        }
    }
}

/// An account with its related transfers. The lists are empty unless requested in the query.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountWithTransfers {
    pub account: Account,
    pub received: Vec<TransferRecord>,
    pub sent: Vec<TransferRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateSelection {
    pub sum_balance: bool,
    pub avg_age: bool,
}

impl AggregateSelection {
    pub fn all() -> Self {
        Self {
            sum_balance: true,
            avg_age: true,
        }
    }
}

/// Aggregates over all accounts; `None` when not selected or when there are no accounts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountAggregate {
    pub sum_balance: Option<Decimal>,
    pub avg_age: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Country,
    Age,
}

impl GroupField {
    pub(crate) fn key_of(self, account: &Account) -> GroupKey {
        match self {
            GroupField::Country => GroupKey::Country(account.country.clone()),
            GroupField::Age => GroupKey::Age(account.age),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum GroupKey {
    Country(String),
    Age(i32),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Country(country) => f.write_str(country),
            GroupKey::Age(age) => write!(f, "{age}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountGroup {
    pub key: GroupKey,
    pub count: u64,
    pub avg_age: f64,
}
