use std::collections::{BTreeMap, btree_map::Entry};

use chrono::Utc;
use rust_decimal::Decimal;

use crate::account::{
    Account, AccountId, AccountKey, AccountUpdate, NewAccount, NewTransferRecord, TransferId,
    TransferRecord,
};

use super::{
    AccountAggregate, AccountGroup, AccountQuery, AccountStore, AccountWithTransfers,
    AggregateSelection, GroupField, StoreError, StoreResult, TransferStore, sum_balances,
};

#[derive(Debug, Clone, Default)]
struct State {
    accounts: BTreeMap<AccountId, Account>,
    transfers: Vec<TransferRecord>,
    last_account_id: AccountId,
    last_transfer_id: TransferId,
}

impl State {
    fn insert_account(&mut self, new: NewAccount) -> StoreResult<Account> {
        let clash = self
            .accounts
            .values()
            .find(|acc| acc.username == new.username || acc.email == new.email);
        if let Some(existing) = clash {
            return Err(if existing.username == new.username {
                StoreError::DuplicateConstraintViolation {
                    field: "username",
                    value: new.username,
                }
            } else {
                StoreError::DuplicateConstraintViolation {
                    field: "email",
                    value: new.email,
                }
            });
        }
        self.last_account_id += 1;
        let account = new.into_account(self.last_account_id, Utc::now());
        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    fn find(&self, key: &AccountKey) -> Option<&Account> {
        match key {
            AccountKey::Id(id) => self.accounts.get(id),
            AccountKey::Username(_) => self.accounts.values().find(|acc| key.matches(acc)),
        }
    }

    fn received_by(&self, id: AccountId) -> Vec<&TransferRecord> {
        self.transfers
            .iter()
            .filter(|tx| tx.recipient_id == id)
            .collect()
    }
}

/// Account store kept entirely in memory. Transactions snapshot the whole state
/// on `begin` and restore it on `rollback`.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    state: State,
    snapshot: Option<State>,
}

impl InMemoryAccountStore {
    pub fn transfers(&self) -> &[TransferRecord] {
        &self.state.transfers
    }

    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }
}

impl TransferStore for InMemoryAccountStore {
    fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .state
            .accounts
            .values()
            .find(|acc| acc.username == username)
            .cloned())
    }

    fn update_account_balance(&mut self, id: AccountId, delta: Decimal) -> StoreResult<Account> {
        let Some(account) = self.state.accounts.get_mut(&id) else {
            return Err(StoreError::account_not_found(AccountKey::Id(id)));
        };
        account.balance = account
            .balance
            .checked_add(delta)
            .ok_or_else(|| StoreError::Backend(format!("Balance overflow for account {id}")))?;
        Ok(account.clone())
    }

    fn insert_transfer_record(
        &mut self,
        record: NewTransferRecord,
    ) -> StoreResult<TransferRecord> {
        for id in [record.sender_id, record.recipient_id] {
            if !self.state.accounts.contains_key(&id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "transfer references unknown account {id}"
                )));
            }
        }
        self.state.last_transfer_id += 1;
        let record = record.into_record(self.state.last_transfer_id);
        self.state.transfers.push(record.clone());
        Ok(record)
    }

    fn begin(&mut self) -> StoreResult<()> {
        if self.snapshot.is_some() {
            return Err(StoreError::Transaction(
                "a transaction is already open".to_string(),
            ));
        }
        self.snapshot = Some(self.state.clone());
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        match self.snapshot.take() {
            Some(_) => Ok(()),
            None => Err(StoreError::Transaction("no open transaction".to_string())),
        }
    }

    fn rollback(&mut self) -> StoreResult<()> {
        match self.snapshot.take() {
            Some(snapshot) => {
                self.state = snapshot;
                Ok(())
            }
            None => Err(StoreError::Transaction("no open transaction".to_string())),
        }
    }
}

impl AccountStore for InMemoryAccountStore {
    fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account> {
        self.state.insert_account(account)
    }

    fn insert_accounts(&mut self, accounts: &[NewAccount]) -> StoreResult<usize> {
        let mut staged = self.state.clone();
        for account in accounts {
            staged.insert_account(account.clone())?;
        }
        self.state = staged;
        Ok(accounts.len())
    }

    fn find_account(&self, key: &AccountKey) -> StoreResult<Option<Account>> {
        Ok(self.state.find(key).cloned())
    }

    fn update_account(&mut self, key: &AccountKey, update: AccountUpdate) -> StoreResult<Account> {
        let Some(id) = self.state.find(key).map(|acc| acc.id) else {
            return Err(StoreError::account_not_found(key));
        };
        if let Some(email) = &update.email {
            if self
                .state
                .accounts
                .values()
                .any(|acc| acc.id != id && acc.email == *email)
            {
                return Err(StoreError::DuplicateConstraintViolation {
                    field: "email",
                    value: email.clone(),
                });
            }
        }
        let Entry::Occupied(mut entry) = self.state.accounts.entry(id) else {
            return Err(StoreError::account_not_found(key));
        };
        update.apply_to(entry.get_mut());
        Ok(entry.get().clone())
    }

    fn delete_account(&mut self, key: &AccountKey) -> StoreResult<Account> {
        let Some(id) = self.state.find(key).map(|acc| acc.id) else {
            return Err(StoreError::account_not_found(key));
        };
        if self
            .state
            .transfers
            .iter()
            .any(|tx| tx.sender_id == id || tx.recipient_id == id)
        {
            return Err(StoreError::ForeignKeyViolation(format!(
                "account {id} is referenced by transfers"
            )));
        }
        self.state
            .accounts
            .remove(&id)
            .ok_or_else(|| StoreError::account_not_found(key))
    }

    fn list_accounts(&self, query: &AccountQuery) -> StoreResult<Vec<AccountWithTransfers>> {
        let mut result = Vec::new();
        for account in self.state.accounts.values() {
            let received = self.state.received_by(account.id);
            if !query.matches(account, &received) {
                continue;
            }
            let received = if query.include_received {
                received.into_iter().cloned().collect()
            } else {
                Vec::new()
            };
            let sent = if query.include_sent {
                self.state
                    .transfers
                    .iter()
                    .filter(|tx| tx.sender_id == account.id)
                    .cloned()
                    .collect()
            } else {
                Vec::new()
            };
            result.push(AccountWithTransfers {
                account: account.clone(),
                received,
                sent,
            });
        }
        Ok(result)
    }

    fn aggregate_accounts(&self, selection: AggregateSelection) -> StoreResult<AccountAggregate> {
        let accounts = &self.state.accounts;
        if accounts.is_empty() {
            return Ok(AccountAggregate::default());
        }
        let sum_balance = selection
            .sum_balance
            .then(|| sum_balances(accounts.values().map(|acc| acc.balance)))
            .transpose()?;
        let avg_age = selection.avg_age.then(|| {
            let total: i64 = accounts.values().map(|acc| i64::from(acc.age)).sum();
            total as f64 / accounts.len() as f64
        });
        Ok(AccountAggregate {
            sum_balance,
            avg_age,
        })
    }

    fn group_accounts_by(&self, field: GroupField) -> StoreResult<Vec<AccountGroup>> {
        let mut groups = BTreeMap::new();
        for account in self.state.accounts.values() {
            let (count, total_age) = groups.entry(field.key_of(account)).or_insert((0u64, 0i64));
            *count += 1;
            *total_age += i64::from(account.age);
        }
        Ok(groups
            .into_iter()
            .map(|(key, (count, total_age))| AccountGroup {
                key,
                count,
                avg_age: total_age as f64 / count as f64,
            })
            .collect())
    }
}
