use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::config::Config;
use crate::error::{ConvertError, Result};
use crate::ledger::{AccountIndex, Directive, LedgerBuilder, TransactionEntry};
use crate::model::{HomebankModel, Operation, OperationTarget, UniqueId};

/// Turns a loaded Homebank model into the directives of a beancount ledger.
pub fn convert(model: &HomebankModel, config: &Config) -> Result<Vec<Directive>> {
    log::info!("Converting to beancount...");
    let mut ledger = LedgerBuilder::new(config);
    let mut account_map: HashMap<&UniqueId, AccountIndex> = HashMap::new();

    for account in model.accounts.values() {
        let index = ledger.add_account(
            &account.ty.ledger_name(&[&account.name]),
            None,
            Some(&account.currency),
            Some(account.initial_balance),
        )?;
        account_map.insert(&account.unique_id, index);
    }

    for category in model.categories.iter() {
        if config.remove_empty_categories && !category.include {
            log::debug!("Skipping unused category {}", category.path.join(":"));
            continue;
        }
        let index = ledger.add_account(&category.ty.ledger_name(&category.path), None, None, None)?;
        account_map.insert(&category.unique_id, index);
    }

    let mut transfers = TransferPairing::new(model);
    let mut uncategorized = None;
    let mut num_transactions = 0;

    for operation in &model.operations {
        let main_account = lookup(&account_map, &operation.account)?;
        let other_account = match &operation.target {
            OperationTarget::Transfer(destination) => {
                if operation.amount < Decimal::ZERO {
                    if transfers.take_positive_leg(operation, destination) {
                        // The positive leg on the other account books this transfer
                        continue;
                    }
                    log::warn!(
                        "Operation #{} is a transfer of {} {} without a matching incoming transfer, booking it on its own",
                        operation.position,
                        operation.amount,
                        operation.currency,
                    );
                }
                lookup(&account_map, destination)?
            }
            OperationTarget::Category(category) => lookup(&account_map, category)?,
            OperationTarget::Uncategorized => match uncategorized {
                Some(index) => index,
                None => {
                    let index =
                        ledger.add_account(&config.uncategorized_account, None, None, None)?;
                    uncategorized = Some(index);
                    index
                }
            },
        };

        ledger.add_transaction(TransactionEntry {
            date: operation.date,
            payee: operation.payee.clone(),
            narration: operation.narration.clone(),
            main_account,
            other_account,
            amount: operation.amount,
            currency: operation.currency.clone(),
            tags: operation.tags.clone(),
        })?;
        num_transactions += 1;
    }

    log::info!(
        "Converting to beancount...done ({} transactions)",
        num_transactions
    );
    Ok(ledger.into_directives())
}

fn lookup(account_map: &HashMap<&UniqueId, AccountIndex>, id: &UniqueId) -> Result<AccountIndex> {
    account_map.get(id).copied().ok_or_else(|| {
        ConvertError::Invariant(format!("'{}' has no ledger account", id))
    })
}

/// Both legs of a transfer appear as operations in Homebank: the outgoing one with a negative
/// amount and the incoming one with a positive amount. Only the incoming leg is booked, so every
/// outgoing leg has to consume one incoming leg.
///
/// Legs are matched by the link key Homebank writes on both of them. Legs without a link key are
/// matched by date, direction and amount. The amount is left out if the two accounts have
/// different currencies, since the legs then carry different amounts.
#[derive(Hash, PartialEq, Eq)]
struct TransferKey<'a> {
    date: NaiveDate,
    from: &'a UniqueId,
    to: &'a UniqueId,
    magnitude: Option<Decimal>,
}

struct TransferPairing<'a> {
    currencies: HashMap<&'a UniqueId, &'a str>,
    positive_legs_taken: Vec<bool>,
    by_link: HashMap<&'a str, Vec<usize>>,
    by_key: HashMap<TransferKey<'a>, Vec<usize>>,
}

impl<'a> TransferPairing<'a> {
    fn new(model: &'a HomebankModel) -> Self {
        let mut pairing = Self {
            currencies: model
                .accounts
                .values()
                .map(|account| (&account.unique_id, account.currency.as_str()))
                .collect(),
            positive_legs_taken: vec![],
            by_link: HashMap::new(),
            by_key: HashMap::new(),
        };
        for operation in &model.operations {
            if let OperationTarget::Transfer(destination) = &operation.target {
                if operation.amount >= Decimal::ZERO {
                    let leg = pairing.positive_legs_taken.len();
                    pairing.positive_legs_taken.push(false);
                    match &operation.transfer_link {
                        Some(link) => pairing.by_link.entry(link.as_str()).or_default().push(leg),
                        None => {
                            let key = pairing.key(operation, destination, &operation.account);
                            pairing.by_key.entry(key).or_default().push(leg);
                        }
                    }
                }
            }
        }
        pairing
    }

    fn key(
        &self,
        operation: &'a Operation,
        from: &'a UniqueId,
        to: &'a UniqueId,
    ) -> TransferKey<'a> {
        let same_currency = self.currencies.get(from) == self.currencies.get(to);
        TransferKey {
            date: operation.date,
            from,
            to,
            magnitude: same_currency.then(|| operation.amount.abs()),
        }
    }

    /// Returns true if a positive leg matching this negative leg exists and wasn't taken yet.
    fn take_positive_leg(&mut self, operation: &'a Operation, destination: &'a UniqueId) -> bool {
        let linked = operation
            .transfer_link
            .as_deref()
            .and_then(|link| self.by_link.get(link));
        if let Some(leg) = first_untaken(linked, &self.positive_legs_taken) {
            self.positive_legs_taken[leg] = true;
            return true;
        }
        let key = self.key(operation, &operation.account, destination);
        if let Some(leg) = first_untaken(self.by_key.get(&key), &self.positive_legs_taken) {
            self.positive_legs_taken[leg] = true;
            return true;
        }
        false
    }
}

fn first_untaken(legs: Option<&Vec<usize>>, taken: &[bool]) -> Option<usize> {
    legs?.iter().copied().find(|&leg| !taken[leg])
}
