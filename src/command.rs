use rust_decimal::Decimal;
use thiserror::Error;

/// A transfer as submitted by the caller, accounts referenced by username.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub amount: Decimal,
    pub description: String,
    pub sender_username: String,
    pub recipient_username: String,
}

impl TransferRequest {
    pub fn new(
        amount: Decimal,
        description: impl Into<String>,
        sender_username: impl Into<String>,
        recipient_username: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            description: description.into(),
            sender_username: sender_username.into(),
            recipient_username: recipient_username.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TransferValidationError {
    #[error("Transfer amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Decimal },
    #[error("Sender and recipient are the same account `{username}`")]
    SelfTransfer { username: String },
}

/// A request that passed validation and can be handed to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferCommand {
    pub amount: Decimal,
    pub description: String,
    pub sender_username: String,
    pub recipient_username: String,
}

impl TransferCommand {
    pub fn parse_request(request: &TransferRequest) -> Result<Self, TransferValidationError> {
        if request.amount <= Decimal::ZERO {
            return Err(TransferValidationError::NonPositiveAmount {
                amount: request.amount,
            });
        }
        if request.sender_username == request.recipient_username {
            return Err(TransferValidationError::SelfTransfer {
                username: request.sender_username.clone(),
            });
        }
        Ok(Self {
            amount: request.amount,
            description: request.description.clone(),
            sender_username: request.sender_username.clone(),
            recipient_username: request.recipient_username.clone(),
        })
    }
}
