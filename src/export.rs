use std::{borrow::Cow, io::Write};

use anyhow::{anyhow, Result};
use beancount_core::{Flag, IncompleteAmount, Ledger};
use chrono::NaiveDate;
use common_macros::{hash_map, hash_set};

use crate::config::TransactionFlag;
use crate::ledger::{AccountType, Directive, Posting, Transaction};

/// Prints the directives as a beancount ledger, in the order given.
pub fn render(directives: &[Directive], writer: &mut impl Write) -> Result<()> {
    let ledger = Ledger {
        directives: directives
            .iter()
            .map(directive_to_beancount)
            .collect::<Result<_>>()?,
    };
    beancount_render::render(writer, &ledger)?;
    Ok(())
}

fn directive_to_beancount(directive: &Directive) -> Result<beancount_core::Directive<'_>> {
    let directive = match directive {
        Directive::Open(open) => beancount_core::Directive::Open(
            beancount_core::Open::builder()
                .date(date_to_beancount(open.date))
                .account(account_to_beancount(&open.account)?)
                .currencies(
                    open.currency
                        .iter()
                        .map(|currency| Cow::Borrowed(currency.as_str()))
                        .collect::<Vec<_>>(),
                )
                .build(),
        ),
        Directive::Pad(pad) => beancount_core::Directive::Pad(
            beancount_core::Pad::builder()
                .date(date_to_beancount(pad.date))
                .pad_to_account(account_to_beancount(&pad.account)?)
                .pad_from_account(account_to_beancount(&pad.source_account)?)
                .build(),
        ),
        Directive::Balance(balance) => beancount_core::Directive::Balance(
            beancount_core::Balance::builder()
                .date(date_to_beancount(balance.date))
                .account(account_to_beancount(&balance.account)?)
                .amount(beancount_core::Amount {
                    num: balance.amount,
                    currency: Cow::Borrowed(balance.currency.as_str()),
                })
                .build(),
        ),
        Directive::Transaction(transaction) => transaction_to_beancount(transaction)?,
    };
    Ok(directive)
}

fn transaction_to_beancount(transaction: &Transaction) -> Result<beancount_core::Directive<'_>> {
    let flag = match transaction.flag {
        TransactionFlag::Okay => Flag::Okay,
        TransactionFlag::Warning => Flag::Warning,
    };
    Ok(beancount_core::Directive::Transaction(
        beancount_core::Transaction {
            date: transaction.date.into(),
            flag,
            payee: transaction.payee.as_deref().map(Cow::Borrowed),
            narration: transaction
                .narration
                .as_deref()
                .map(Cow::Borrowed)
                .unwrap_or(Cow::Borrowed("")),
            tags: transaction
                .tags
                .iter()
                .map(|tag| Cow::Borrowed(tag.as_str()))
                .collect(),
            links: hash_set![],
            postings: transaction
                .postings
                .iter()
                .map(posting_to_beancount)
                .collect::<Result<_>>()?,
            meta: hash_map![],
            source: None,
        },
    ))
}

fn posting_to_beancount(posting: &Posting) -> Result<beancount_core::Posting<'_>> {
    Ok(beancount_core::Posting {
        account: account_to_beancount(&posting.account)?,
        units: IncompleteAmount {
            num: posting.amount.as_ref().map(|amount| amount.number),
            currency: posting
                .amount
                .as_ref()
                .map(|amount| Cow::Borrowed(amount.currency.as_str())),
        },
        cost: None,
        price: None,
        flag: None,
        meta: hash_map![],
    })
}

fn date_to_beancount(date: NaiveDate) -> beancount_core::Date<'static> {
    date.into()
}

fn account_to_beancount(account: &str) -> Result<beancount_core::Account<'_>> {
    let (ty, parts) = AccountType::split_ledger_name(account)
        .ok_or_else(|| anyhow!("'{}' doesn't start with a beancount account type", account))?;
    let ty = match ty {
        AccountType::Assets => beancount_core::AccountType::Assets,
        AccountType::Liabilities => beancount_core::AccountType::Liabilities,
        AccountType::Equity => beancount_core::AccountType::Equity,
        AccountType::Income => beancount_core::AccountType::Income,
        AccountType::Expenses => beancount_core::AccountType::Expenses,
    };
    let parts = parts.into_iter().map(Cow::Borrowed).collect();
    Ok(beancount_core::Account { ty, parts })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::ledger::{Amount, Balance, Open, Pad};

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn render_to_string(directives: &[Directive]) -> String {
        let mut output = vec![];
        render(directives, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    fn sample() -> Vec<Directive> {
        vec![
            Directive::Open(Open {
                lineno: 1,
                date: date(1970, 1, 1),
                account: "Assets:Bank:Checking".to_string(),
                currency: Some("USD".to_string()),
            }),
            Directive::Open(Open {
                lineno: 2,
                date: date(1970, 1, 1),
                account: "Expenses:Food".to_string(),
                currency: None,
            }),
            Directive::Pad(Pad {
                lineno: 3,
                date: date(1970, 1, 2),
                account: "Assets:Bank:Checking".to_string(),
                source_account: "Equity:Opening-Balances".to_string(),
            }),
            Directive::Balance(Balance {
                lineno: 4,
                date: date(1970, 1, 3),
                account: "Assets:Bank:Checking".to_string(),
                amount: Decimal::new(10000, 2),
                currency: "USD".to_string(),
            }),
            Directive::Transaction(Transaction {
                lineno: 5,
                date: date(2024, 3, 15),
                flag: TransactionFlag::Warning,
                payee: Some("Supermarket".to_string()),
                narration: Some("Weekly shopping".to_string()),
                tags: vec!["groceries".to_string()],
                postings: [
                    Posting {
                        account: "Expenses:Food".to_string(),
                        amount: Some(Amount {
                            number: Decimal::new(2500, 2),
                            currency: "USD".to_string(),
                        }),
                    },
                    Posting {
                        account: "Assets:Bank:Checking".to_string(),
                        amount: None,
                    },
                ],
            }),
        ]
    }

    fn line_containing<'a>(output: &'a str, needles: &[&str]) -> &'a str {
        output
            .lines()
            .find(|line| needles.iter().all(|needle| line.contains(needle)))
            .unwrap_or_else(|| panic!("No line containing {:?} in:\n{}", needles, output))
    }

    #[test]
    fn renders_all_directive_kinds() {
        let output = render_to_string(&sample());

        let open = line_containing(&output, &[" open ", "Assets:Bank:Checking"]);
        assert!(open.starts_with("1970-01-01"));
        assert!(open.contains("USD"));
        let open = line_containing(&output, &[" open ", "Expenses:Food"]);
        assert!(open.starts_with("1970-01-01"));
        assert!(!open.contains("USD"));

        let pad = line_containing(&output, &[" pad "]);
        assert!(pad.starts_with("1970-01-02"));
        assert!(pad.contains("Assets:Bank:Checking"));
        assert!(pad.contains("Equity:Opening-Balances"));

        let balance = line_containing(&output, &[" balance "]);
        assert!(balance.starts_with("1970-01-03"));
        assert!(balance.contains("Assets:Bank:Checking"));
        assert!(balance.contains("100.00"));
        assert!(balance.contains("USD"));

        let transaction = line_containing(&output, &["2024-03-15"]);
        assert!(transaction.contains('!'));
        assert!(transaction.contains("\"Supermarket\""));
        assert!(transaction.contains("\"Weekly shopping\""));
        assert!(transaction.contains("#groceries"));

        line_containing(&output, &["Expenses:Food", "25.00", "USD"]);
    }

    #[test]
    fn directives_keep_their_order() {
        let output = render_to_string(&sample());
        let position = |needle: &str| output.find(needle).unwrap();
        assert!(position(" open ") < position(" pad "));
        assert!(position(" pad ") < position(" balance "));
        assert!(position(" balance ") < position("2024-03-15"));
    }

    #[test]
    fn empty_ledger_renders_nothing() {
        assert_eq!("", render_to_string(&[]).trim());
    }

    #[test]
    fn account_without_root_type_is_an_error() {
        let directives = vec![Directive::Open(Open {
            lineno: 1,
            date: date(1970, 1, 1),
            account: "Checking".to_string(),
            currency: None,
        })];
        let mut output = vec![];
        let err = render(&directives, &mut output).unwrap_err();
        assert_eq!(
            "'Checking' doesn't start with a beancount account type",
            err.to_string()
        );
        assert!(output.is_empty());
    }
}
