use std::io::Read;

use csv::Trim;
use rust_decimal::Decimal;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{account::NewAccount, command::TransferRequest};

#[derive(Debug, Deserialize)]
pub struct Transfer {
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    pub sender: String,
    pub recipient: String,
}

impl From<Transfer> for TransferRequest {
    fn from(row: Transfer) -> Self {
        TransferRequest::new(row.amount, row.description, row.sender, row.recipient)
    }
}

/// Deserializes every row of a headed CSV source, failing on the first malformed one.
fn read_all<R, T>(source: R, what: &str) -> anyhow::Result<Vec<T>>
where
    R: Read,
    T: DeserializeOwned,
{
    let reader = csv::ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source);

    reader
        .into_deserialize()
        .map(|row| {
            row.map_err(|err| {
                let context = match err.position() {
                    Some(pos) => format!("Malformed {what} at line {}", pos.line()),
                    None => format!("Malformed {what}"),
                };
                anyhow::Error::new(err).context(context)
            })
        })
        .collect()
}

/// Reads `amount,description,sender,recipient` rows.
pub fn read_transfers<R: Read>(source: R) -> anyhow::Result<Vec<TransferRequest>> {
    Ok(read_all::<_, Transfer>(source, "transfer")?
        .into_iter()
        .map(TransferRequest::from)
        .collect())
}

/// Reads `username,email,age,country,balance` rows.
pub fn read_accounts<R: Read>(source: R) -> anyhow::Result<Vec<NewAccount>> {
    read_all(source, "account")
}
