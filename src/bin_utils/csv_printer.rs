use std::io::Write;

use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    account::AccountId,
    store::{AccountAggregate, AccountGroup},
};

#[derive(Debug, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub age: i32,
    pub country: String,
    pub balance: Decimal,
}

impl From<crate::account::Account> for Account {
    fn from(acc: crate::account::Account) -> Self {
        Self {
            id: acc.id,
            username: acc.username,
            email: acc.email,
            age: acc.age,
            country: acc.country,
            balance: acc.balance,
        }
    }
}

#[derive(Debug, Serialize)]
struct Group {
    key: String,
    count: u64,
    avg_age: f64,
}

#[derive(Debug, Serialize)]
struct Summary {
    accounts: usize,
    total_balance: Option<Decimal>,
    average_age: Option<f64>,
}

fn write_rows<W, T>(output: &mut W, rows: impl Iterator<Item = T>) -> anyhow::Result<()>
where
    W: Write,
    T: Serialize,
{
    let mut writer = Writer::from_writer(output);
    for row in rows {
        if let Err(err) = writer.serialize(row) {
            anyhow::bail!("Failed to write to CSV: {err}")
        }
    }
    // Ensure all data is flushed to the output
    if let Err(err) = writer.flush() {
        anyhow::bail!("Failed to flush CSV writer: {err}")
    }
    Ok(())
}

pub fn print_accounts<W>(
    output: &mut W,
    accounts: impl Iterator<Item = Account>,
) -> anyhow::Result<()>
where
    W: Write,
{
    write_rows(output, accounts)
}

pub fn print_groups<W>(output: &mut W, groups: Vec<AccountGroup>) -> anyhow::Result<()>
where
    W: Write,
{
    write_rows(
        output,
        groups.into_iter().map(|group| Group {
            key: group.key.to_string(),
            count: group.count,
            avg_age: group.avg_age,
        }),
    )
}

pub fn print_summary<W>(
    output: &mut W,
    accounts: usize,
    aggregate: AccountAggregate,
) -> anyhow::Result<()>
where
    W: Write,
{
    write_rows(
        output,
        std::iter::once(Summary {
            accounts,
            total_balance: aggregate.sum_balance,
            average_age: aggregate.avg_age,
        }),
    )
}
