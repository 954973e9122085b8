use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::TransactionFlag;

/// One entry of the produced ledger, in the order it is printed.
///
/// Every directive carries a `lineno`, a counter in creation order. It attributes the directive
/// to the conversion step that created it and has no meaning for the ledger itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Open(Open),
    Pad(Pad),
    Balance(Balance),
    Transaction(Transaction),
}

impl Directive {
    pub fn date(&self) -> NaiveDate {
        match self {
            Directive::Open(open) => open.date,
            Directive::Pad(pad) => pad.date,
            Directive::Balance(balance) => balance.date,
            Directive::Transaction(transaction) => transaction.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Open {
    pub lineno: u32,
    pub date: NaiveDate,
    pub account: String,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pad {
    pub lineno: u32,
    pub date: NaiveDate,
    pub account: String,
    pub source_account: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    pub lineno: u32,
    pub date: NaiveDate,
    pub account: String,
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub lineno: u32,
    pub date: NaiveDate,
    pub flag: TransactionFlag,
    pub payee: Option<String>,
    pub narration: Option<String>,
    pub tags: Vec<String>,
    /// The first posting carries the amount, the second one balances it.
    pub postings: [Posting; 2],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub account: String,
    pub amount: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    pub number: Decimal,
    pub currency: String,
}
