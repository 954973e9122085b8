use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::config::Config;
use crate::error::{ConvertError, Result};

mod account_name;
mod directive;

pub use account_name::{sanitize, AccountType};
pub use directive::{Amount, Balance, Directive, Open, Pad, Posting, Transaction};

/// Position of an opened account in [LedgerBuilder], in the order accounts were added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountIndex(usize);

#[derive(Debug)]
struct LedgerAccount {
    name: String,
    currency: Option<String>,
    has_opening_balance: bool,
}

/// A transaction to be added to the ledger. `amount` is booked on `main_account`,
/// `other_account` receives the balancing posting.
#[derive(Debug, Clone)]
pub struct TransactionEntry {
    pub date: NaiveDate,
    pub payee: Option<String>,
    pub narration: Option<String>,
    pub main_account: AccountIndex,
    pub other_account: AccountIndex,
    pub amount: Decimal,
    pub currency: String,
    pub tags: Vec<String>,
}

/// Collects the directives of a beancount ledger.
pub struct LedgerBuilder<'c> {
    config: &'c Config,
    accounts: Vec<LedgerAccount>,
    account_indices: HashMap<String, AccountIndex>,
    opens: Vec<Directive>,
    pad_balances: Vec<Directive>,
    transactions: Vec<Transaction>,
    lineno_counter: u32,
}

impl<'c> LedgerBuilder<'c> {
    /// Creates a ledger that already has the opening balances account opened.
    pub fn new(config: &'c Config) -> Self {
        let mut ledger = Self {
            config,
            accounts: vec![],
            account_indices: HashMap::new(),
            opens: vec![],
            pad_balances: vec![],
            transactions: vec![],
            lineno_counter: 0,
        };
        let opening_balances = ledger.format_account_name(&config.opening_balances_account);
        ledger.open_account(opening_balances, None, None);
        ledger
    }

    pub fn account_name(&self, index: AccountIndex) -> &str {
        &self.accounts[index.0].name
    }

    pub fn opening_balances_account(&self) -> AccountIndex {
        AccountIndex(0)
    }

    /// Opens an account and, for a nonzero `initial_amount`, pads it from the opening balances
    /// account and asserts the initial balance.
    ///
    /// If the name collides with an already opened account after sanitization, the existing
    /// account is returned instead of opening a second one.
    pub fn add_account(
        &mut self,
        name: &str,
        date: Option<NaiveDate>,
        currency: Option<&str>,
        initial_amount: Option<Decimal>,
    ) -> Result<AccountIndex> {
        let name = self.format_account_name(name);
        let initial_amount = initial_amount.filter(|amount| !amount.is_zero());
        let opening_balance = match (initial_amount, currency) {
            (None, _) => None,
            (Some(amount), Some(currency)) => Some((amount, currency)),
            (Some(amount), None) => {
                return Err(ConvertError::Invariant(format!(
                    "Account '{}' has initial amount {} but no currency",
                    name, amount
                )));
            }
        };

        let index = match self.account_indices.get(&name) {
            Some(&index) => {
                log::warn!(
                    "Multiple accounts map to the ledger account '{}', merging them",
                    name
                );
                let existing = &self.accounts[index.0];
                if opening_balance.is_some() && existing.has_opening_balance {
                    return Err(ConvertError::Invariant(format!(
                        "Multiple accounts with an opening balance map to the ledger account '{}'",
                        name
                    )));
                }
                if let (Some(existing_currency), Some(currency)) = (&existing.currency, currency) {
                    if existing_currency != currency {
                        return Err(ConvertError::Invariant(format!(
                            "Accounts in {} and {} map to the ledger account '{}'",
                            existing_currency, currency, name
                        )));
                    }
                }
                index
            }
            None => self.open_account(name, date, currency),
        };

        if let Some((amount, currency)) = opening_balance {
            self.add_opening_balance(index, amount, currency);
        }

        Ok(index)
    }

    fn open_account(
        &mut self,
        name: String,
        date: Option<NaiveDate>,
        currency: Option<&str>,
    ) -> AccountIndex {
        let index = AccountIndex(self.accounts.len());
        let lineno = self.next_lineno();
        self.opens.push(Directive::Open(Open {
            lineno,
            date: date.unwrap_or(self.config.open_date),
            account: name.clone(),
            currency: currency.map(str::to_string),
        }));
        self.account_indices.insert(name.clone(), index);
        self.accounts.push(LedgerAccount {
            name,
            currency: currency.map(str::to_string),
            has_opening_balance: false,
        });
        index
    }

    fn add_opening_balance(&mut self, index: AccountIndex, amount: Decimal, currency: &str) {
        let account = self.accounts[index.0].name.clone();
        let source_account = self.accounts[self.opening_balances_account().0].name.clone();
        let lineno = self.next_lineno();
        self.pad_balances.push(Directive::Pad(Pad {
            lineno,
            date: self.config.pad_date,
            account: account.clone(),
            source_account,
        }));
        let lineno = self.next_lineno();
        self.pad_balances.push(Directive::Balance(Balance {
            lineno,
            date: self.config.balance_date,
            account,
            amount,
            currency: currency.to_string(),
        }));
        self.accounts[index.0].has_opening_balance = true;
    }

    pub fn add_transaction(&mut self, entry: TransactionEntry) -> Result<()> {
        let TransactionEntry {
            date,
            payee,
            narration,
            mut main_account,
            mut other_account,
            mut amount,
            currency,
            tags,
        } = entry;

        if main_account == other_account {
            return Err(ConvertError::Invariant(format!(
                "Transaction on {} would post to '{}' twice",
                date,
                self.account_name(main_account),
            )));
        }

        if self.config.prefer_positive_amounts && amount < Decimal::ZERO {
            std::mem::swap(&mut main_account, &mut other_account);
            amount = -amount;
        }

        let postings = [
            Posting {
                account: self.account_name(main_account).to_string(),
                amount: Some(Amount {
                    number: amount,
                    currency,
                }),
            },
            Posting {
                account: self.account_name(other_account).to_string(),
                amount: None,
            },
        ];

        let lineno = self.next_lineno();
        self.transactions.push(Transaction {
            lineno,
            date,
            flag: self.config.default_flag,
            payee,
            narration,
            tags,
            postings,
        });
        Ok(())
    }

    /// Account openings first, then opening balances, then transactions ordered by date.
    pub fn into_directives(self) -> Vec<Directive> {
        let mut transactions = self.transactions;
        // Stable, so transactions on the same day keep their insertion order
        transactions.sort_by_key(|transaction| transaction.date);
        self.opens
            .into_iter()
            .chain(self.pad_balances)
            .chain(transactions.into_iter().map(Directive::Transaction))
            .collect()
    }

    fn format_account_name(&self, name: &str) -> String {
        let sanitized = sanitize(name);
        self.config.renames.ledger_account(&sanitized).to_string()
    }

    fn next_lineno(&mut self) -> u32 {
        self.lineno_counter += 1;
        self.lineno_counter
    }
}
