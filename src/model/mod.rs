use chrono::NaiveDate;
use indexmap::{map::Entry, IndexMap};
use rust_decimal::Decimal;
use std::fmt;

use crate::config::{Config, RenameTables};
use crate::error::{ConvertError, Result};
use crate::import::{
    AccountRecord, Attributes, OperationRecord, RawDocument, RecordKind, Records,
    PAYMODE_INTERNAL_TRANSFER,
};
use crate::ledger::AccountType;

mod category;
mod parse;

pub use category::{Category, CategoryTree};
pub use parse::{parse_amount, parse_date};

/// Identifies an account or category across the whole model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueId(String);

impl UniqueId {
    pub fn account(key: &str) -> Self {
        Self(format!("account_{key}"))
    }

    pub fn category(key: &str) -> Self {
        Self(format!("category_{key}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Currency {
    pub key: String,
    pub iso: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub key: String,
    pub raw_name: String,
    pub name: String,
    pub ty: AccountType,
    pub currency: String,
    pub initial_balance: Decimal,
    pub unique_id: UniqueId,
    pub include: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payee {
    pub key: String,
    pub raw_name: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub raw_name: String,
    pub name: String,
}

/// Where the counter posting of an operation goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationTarget {
    /// Internal transfer to another account. Any category on the operation is ignored.
    Transfer(UniqueId),
    Category(UniqueId),
    Uncategorized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub position: usize,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub account: UniqueId,
    pub currency: String,
    pub target: OperationTarget,
    /// Links the two legs of an internal transfer.
    pub transfer_link: Option<String>,
    pub payee: Option<String>,
    pub narration: Option<String>,
    pub tags: Vec<String>,
    pub paymode: Option<u32>,
}

impl Operation {
    pub fn is_transfer(&self) -> bool {
        matches!(self.target, OperationTarget::Transfer(_))
    }
}

/// A Homebank document with all references resolved and names translated.
#[derive(Debug, Clone)]
pub struct HomebankModel {
    pub properties: Attributes,
    pub currencies: IndexMap<String, Currency>,
    pub accounts: IndexMap<String, Account>,
    pub categories: CategoryTree,
    /// Tags declared in the document, by raw name. Not all of them are necessarily used.
    pub declared_tags: Vec<String>,
    /// Tags referenced by operations, by raw name, in order of first use.
    pub tags: IndexMap<String, Tag>,
    pub payees: IndexMap<String, Payee>,
    pub operations: Vec<Operation>,
}

impl HomebankModel {
    pub fn load(document: &RawDocument, config: &Config) -> Result<Self> {
        log::info!("Loading Homebank records...");
        let records = Records::from_document(document)?;
        let renames = &config.renames;

        if let Some(title) = document.properties.get("title") {
            log::info!("Homebank file title: {}", title);
        }

        let mut currencies = IndexMap::new();
        for record in records.currencies {
            let currency = Currency {
                key: record.key.clone(),
                iso: record.iso,
            };
            insert_unique(&mut currencies, RecordKind::Currency, record.key, currency)?;
        }

        let mut payees = IndexMap::new();
        for record in records.payees {
            let payee = Payee {
                key: record.key.clone(),
                name: renames.payee(&record.name).to_string(),
                raw_name: record.name,
            };
            insert_unique(&mut payees, RecordKind::Payee, record.key, payee)?;
        }

        let mut model = Self {
            properties: document.properties.clone(),
            currencies,
            accounts: IndexMap::new(),
            categories: CategoryTree::default(),
            declared_tags: records.tags.into_iter().map(|tag| tag.name).collect(),
            tags: IndexMap::new(),
            payees,
            operations: vec![],
        };
        model.postprocess_accounts(records.accounts, renames)?;
        model.categories = CategoryTree::build(&records.categories, renames)?;
        model.postprocess_operations(records.operations, renames)?;

        log::info!(
            "Loading Homebank records...done ({} accounts, {} categories, {} operations)",
            model.accounts.len(),
            model.categories.iter().count(),
            model.operations.len(),
        );
        Ok(model)
    }

    fn postprocess_accounts(
        &mut self,
        records: Vec<AccountRecord>,
        renames: &RenameTables,
    ) -> Result<()> {
        for record in records {
            let currency = self
                .currencies
                .get(&record.currency)
                .ok_or_else(|| ConvertError::MissingRecord {
                    kind: RecordKind::Currency,
                    key: record.currency.clone(),
                    referenced_by: format!("account '{}'", record.key),
                })?
                .iso
                .clone();
            let initial_balance = match &record.initial {
                Some(initial) => {
                    parse_amount(initial).map_err(|reason| ConvertError::InvalidAttribute {
                        kind: RecordKind::Account,
                        key: record.key.clone(),
                        attribute: "initial",
                        value: initial.clone(),
                        reason,
                    })?
                }
                None => Decimal::new(0, 2),
            };
            let account = Account {
                key: record.key.clone(),
                name: renames.account(&record.name).to_string(),
                raw_name: record.name,
                ty: AccountType::Assets,
                currency,
                initial_balance,
                unique_id: UniqueId::account(&record.key),
                include: true,
            };
            insert_unique(&mut self.accounts, RecordKind::Account, record.key, account)?;
        }
        Ok(())
    }

    fn postprocess_operations(
        &mut self,
        records: Vec<OperationRecord>,
        renames: &RenameTables,
    ) -> Result<()> {
        for record in records {
            let operation = self.postprocess_operation(record, renames)?;
            self.operations.push(operation);
        }
        Ok(())
    }

    fn postprocess_operation(
        &mut self,
        record: OperationRecord,
        renames: &RenameTables,
    ) -> Result<Operation> {
        let name = record.name();
        let invalid = |attribute: &'static str, value: &str, reason: String| {
            ConvertError::InvalidAttribute {
                kind: RecordKind::Operation,
                key: format!("#{}", record.position),
                attribute,
                value: value.to_string(),
                reason,
            }
        };
        let missing = |kind: RecordKind, key: &str| ConvertError::MissingRecord {
            kind,
            key: key.to_string(),
            referenced_by: name.clone(),
        };

        let date =
            parse_date(&record.date).map_err(|reason| invalid("date", &record.date, reason))?;
        let amount = parse_amount(&record.amount)
            .map_err(|reason| invalid("amount", &record.amount, reason))?;

        let account = self
            .accounts
            .get(&record.account)
            .ok_or_else(|| missing(RecordKind::Account, &record.account))?;
        let account_id = account.unique_id.clone();
        let currency = account.currency.clone();

        let payee = record
            .payee
            .as_ref()
            .map(|key| {
                self.payees
                    .get(key)
                    .map(|payee| payee.name.clone())
                    .ok_or_else(|| missing(RecordKind::Payee, key))
            })
            .transpose()?;

        if record.is_split {
            log::warn!(
                "{} is a split operation; splits aren't expanded, it is converted as a single posting",
                name
            );
        }

        let target = match (&record.dst_account, &record.category) {
            (Some(dst_account), category) => {
                let destination = self
                    .accounts
                    .get(dst_account)
                    .ok_or_else(|| missing(RecordKind::Account, dst_account))?;
                if category.is_some() {
                    log::debug!("{} is a transfer, ignoring its category", name);
                }
                OperationTarget::Transfer(destination.unique_id.clone())
            }
            (None, Some(category)) => {
                let (index, category) = self
                    .categories
                    .get(category)
                    .ok_or_else(|| missing(RecordKind::Category, category))?;
                let unique_id = category.unique_id.clone();
                self.categories.mark_included(index);
                OperationTarget::Category(unique_id)
            }
            (None, None) => {
                if record.paymode == Some(PAYMODE_INTERNAL_TRANSFER) {
                    log::warn!(
                        "{} has the transfer paymode but no destination account; treating it as uncategorized",
                        name
                    );
                }
                OperationTarget::Uncategorized
            }
        };

        let tags = match &record.tags {
            Some(tags) => split_tags(tags)
                .into_iter()
                .map(|tag| self.register_tag(tag, renames))
                .collect(),
            None => vec![],
        };

        Ok(Operation {
            position: record.position,
            date,
            amount,
            account: account_id,
            currency,
            target,
            transfer_link: record.transfer_link,
            payee,
            narration: record.info.or(record.wording),
            tags,
            paymode: record.paymode,
        })
    }

    fn register_tag(&mut self, raw_name: &str, renames: &RenameTables) -> String {
        self.tags
            .entry(raw_name.to_string())
            .or_insert_with(|| Tag {
                raw_name: raw_name.to_string(),
                name: renames.tag(raw_name).to_string(),
            })
            .name
            .clone()
    }
}

/// Tags are separated by whitespace or commas. Empty fragments and repeated tags are dropped.
fn split_tags(tags: &str) -> Vec<&str> {
    let mut result: Vec<&str> = vec![];
    for tag in tags.split(|c: char| c.is_whitespace() || c == ',') {
        if !tag.is_empty() && !result.contains(&tag) {
            result.push(tag);
        }
    }
    result
}

fn insert_unique<V>(
    map: &mut IndexMap<String, V>,
    kind: RecordKind,
    key: String,
    value: V,
) -> Result<()> {
    match map.entry(key) {
        Entry::Occupied(entry) => Err(ConvertError::InvalidAttribute {
            kind,
            key: entry.key().clone(),
            attribute: "key",
            value: entry.key().clone(),
            reason: "duplicate key".to_string(),
        }),
        Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(())
        }
    }
}
