use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type AccountId = i64;
pub type TransferId = i64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub age: i32,
    pub country: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Fields required to onboard an account. Ids and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub age: i32,
    pub country: String,
    pub balance: Decimal,
}

impl NewAccount {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        age: i32,
        country: impl Into<String>,
        balance: Decimal,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            age,
            country: country.into(),
            balance,
        }
    }

    pub(crate) fn into_account(self, id: AccountId, created_at: DateTime<Utc>) -> Account {
        Account {
            id,
            username: self.username,
            email: self.email,
            age: self.age,
            country: self.country,
            balance: self.balance,
            created_at,
        }
    }
}

/// Partial update of the profile fields. Balances only change through transfers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountUpdate {
    pub email: Option<String>,
    pub age: Option<i32>,
    pub country: Option<String>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.age.is_none() && self.country.is_none()
    }

    pub(crate) fn apply_to(&self, account: &mut Account) {
        if let Some(email) = &self.email {
            account.email.clone_from(email);
        }
        if let Some(age) = self.age {
            account.age = age;
        }
        if let Some(country) = &self.country {
            account.country.clone_from(country);
        }
    }
}

/// Unique handle of an account: either its id or its username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountKey {
    Id(AccountId),
    Username(String),
}

impl AccountKey {
    pub fn username(username: impl Into<String>) -> Self {
        Self::Username(username.into())
    }

    pub(crate) fn matches(&self, account: &Account) -> bool {
        match self {
            AccountKey::Id(id) => account.id == *id,
            AccountKey::Username(username) => account.username == *username,
        }
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountKey::Id(id) => write!(f, "id={id}"),
            AccountKey::Username(username) => write!(f, "username={username}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRecord {
    pub id: TransferId,
    pub amount: Decimal,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub sender_id: AccountId,
    pub recipient_id: AccountId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransferRecord {
    pub amount: Decimal,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub sender_id: AccountId,
    pub recipient_id: AccountId,
}

impl NewTransferRecord {
    pub(crate) fn into_record(self, id: TransferId) -> TransferRecord {
        TransferRecord {
            id,
            amount: self.amount,
            description: self.description,
            created_at: self.created_at,
            sender_id: self.sender_id,
            recipient_id: self.recipient_id,
        }
    }
}
