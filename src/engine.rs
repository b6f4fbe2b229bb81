use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    account::{Account, NewTransferRecord, TransferRecord},
    command::{TransferCommand, TransferRequest, TransferValidationError},
    store::{StoreError, TransferStore},
};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Validation(#[from] TransferValidationError),
    #[error("Account `{username}` not found")]
    AccountNotFound { username: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TransferError {
    /// Short label of the failure, used in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            TransferError::Validation(_) => "validation",
            TransferError::AccountNotFound { .. } => "account_not_found",
            TransferError::Store(StoreError::DuplicateConstraintViolation { .. }) => {
                "duplicate_constraint_violation"
            }
            TransferError::Store(StoreError::Unavailable(_)) => "store_unavailable",
            TransferError::Store(_) => "store",
        }
    }
}

/// The store became unreachable; requests from `index` on were not attempted.
///
/// `outcomes` holds one entry per request before `index`.
#[derive(Debug, Error)]
#[error("Transfer batch aborted at request {index}: {source}")]
pub struct TransferBatchError {
    pub index: usize,
    pub source: StoreError,
    pub outcomes: Vec<TransferOutcome>,
}

pub type TransferOutcome = Result<TransferRecord, TransferError>;

/// Applies transfers one by one against the injected store.
///
/// Each transfer runs inside a store transaction: the sender debit, the
/// recipient credit and the transfer record are either all applied or none is.
pub struct TransferEngine<S> {
    store: S,
}

impl<S> TransferEngine<S>
where
    S: TransferStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Applies `requests` strictly in order, one outcome per request.
    ///
    /// A failed request does not stop the batch, except when the store is
    /// unavailable: then the batch stops and the requests already applied stay applied.
    pub fn apply_transfers<'r>(
        &mut self,
        requests: impl IntoIterator<Item = &'r TransferRequest>,
    ) -> Result<Vec<TransferOutcome>, TransferBatchError> {
        let mut outcomes = Vec::new();
        for (index, request) in requests.into_iter().enumerate() {
            match self.apply_transfer(request) {
                Ok(record) => {
                    info!(
                        index,
                        sender = %request.sender_username,
                        recipient = %request.recipient_username,
                        amount = %record.amount,
                        record_id = record.id,
                        "Transfer applied"
                    );
                    outcomes.push(Ok(record));
                }
                Err(TransferError::Store(source)) if source.is_unavailable() => {
                    error!(
                        index,
                        sender = %request.sender_username,
                        recipient = %request.recipient_username,
                        error = %source,
                        "Store unavailable, aborting transfer batch"
                    );
                    return Err(TransferBatchError {
                        index,
                        source,
                        outcomes,
                    });
                }
                Err(err) => {
                    warn!(
                        index,
                        sender = %request.sender_username,
                        recipient = %request.recipient_username,
                        kind = err.kind(),
                        error = %err,
                        "Transfer failed"
                    );
                    outcomes.push(Err(err));
                }
            }
        }
        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        info!(
            succeeded = outcomes.len() - failed,
            failed, "Transfers completed."
        );
        Ok(outcomes)
    }

    pub fn apply_transfer(&mut self, request: &TransferRequest) -> TransferOutcome {
        let command = TransferCommand::parse_request(request)?;
        let created_at = Utc::now();

        let sender = self.resolve(&command.sender_username)?;
        let recipient = self.resolve(&command.recipient_username)?;

        self.store.begin()?;
        let result = self
            .move_funds(&command, &sender, &recipient, created_at)
            .and_then(|record| {
                self.store.commit()?;
                Ok(record)
            });
        if let Err(err) = &result {
            if let Err(rollback_err) = self.store.rollback() {
                error!(
                    sender = %command.sender_username,
                    recipient = %command.recipient_username,
                    error = %err,
                    rollback_error = %rollback_err,
                    "Failed to roll back transfer"
                );
            }
        }
        result
    }

    fn resolve(&self, username: &str) -> Result<Account, TransferError> {
        self.store
            .find_account_by_username(username)?
            .ok_or_else(|| TransferError::AccountNotFound {
                username: username.to_string(),
            })
    }

    fn move_funds(
        &mut self,
        command: &TransferCommand,
        sender: &Account,
        recipient: &Account,
        created_at: DateTime<Utc>,
    ) -> TransferOutcome {
        let debited = self
            .store
            .update_account_balance(sender.id, -command.amount)
            .map_err(|err| missing_account(err, &sender.username))?;
        debug!(account = %debited.username, balance = %debited.balance, "Sender debited");

        let credited = self
            .store
            .update_account_balance(recipient.id, command.amount)
            .map_err(|err| missing_account(err, &recipient.username))?;
        debug!(account = %credited.username, balance = %credited.balance, "Recipient credited");

        let record = self.store.insert_transfer_record(NewTransferRecord {
            amount: command.amount,
            description: command.description.clone(),
            created_at,
            sender_id: sender.id,
            recipient_id: recipient.id,
        })?;
        Ok(record)
    }
}

// the account may be deleted between lookup and update
fn missing_account(err: StoreError, username: &str) -> TransferError {
    match err {
        StoreError::NotFound { .. } => TransferError::AccountNotFound {
            username: username.to_string(),
        },
        other => TransferError::Store(other),
    }
}
