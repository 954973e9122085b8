use std::collections::BTreeMap;

use crate::config::{Config, ConfigOverrides, RenameOverrides};
use crate::ledger::{sanitize, Directive};
use crate::model::HomebankModel;

/// Builds a config with a rename table entry for every name that appears in the conversion.
///
/// Each entry maps a source name to the name currently used for it, so printing this for a
/// fresh file gives identity tables to edit, and printing it with a config in place keeps the
/// renames already made.
///
/// Ledger account names are taken from the opened accounts in `directives`. Without directives,
/// e.g. because the conversion failed, they are derived from the accounts and categories of the
/// model instead.
pub fn config_skeleton(
    model: &HomebankModel,
    directives: Option<&[Directive]>,
    config: &Config,
) -> ConfigOverrides {
    let renames = &config.renames;

    let accounts = model
        .accounts
        .values()
        .map(|account| (account.raw_name.clone(), account.name.clone()))
        .collect();
    let categories = model
        .categories
        .iter()
        .map(|category| (category.raw_name.clone(), category.name.clone()))
        .collect();
    let payees = model
        .payees
        .values()
        .map(|payee| (payee.raw_name.clone(), payee.name.clone()))
        .collect();
    let tags = model
        .declared_tags
        .iter()
        .map(|tag| (tag.clone(), renames.tag(tag).to_string()))
        .chain(
            model
                .tags
                .values()
                .map(|tag| (tag.raw_name.clone(), tag.name.clone())),
        )
        .collect();

    let mut ledger_accounts = match directives {
        Some(directives) => opened_ledger_accounts(directives, config),
        None => model_ledger_accounts(model, config),
    };
    // Renames whose source didn't come up in this file are kept as well
    for (from, to) in &renames.ledger_accounts {
        ledger_accounts
            .entry(from.clone())
            .or_insert_with(|| to.clone());
    }

    ConfigOverrides {
        renames: Some(RenameOverrides {
            accounts: Some(accounts),
            categories: Some(categories),
            tags: Some(tags),
            payees: Some(payees),
            ledger_accounts: Some(ledger_accounts),
        }),
        ..ConfigOverrides::default()
    }
}

fn opened_ledger_accounts(directives: &[Directive], config: &Config) -> BTreeMap<String, String> {
    // Opened accounts carry the name after the ledger account rename; map them back
    let reverse_ledger_renames: BTreeMap<&str, &str> = config
        .renames
        .ledger_accounts
        .iter()
        .map(|(from, to)| (to.as_str(), from.as_str()))
        .collect();
    directives
        .iter()
        .filter_map(|directive| match directive {
            Directive::Open(open) => Some(open.account.as_str()),
            _ => None,
        })
        .map(|account| {
            let source = reverse_ledger_renames
                .get(account)
                .copied()
                .unwrap_or(account);
            (source.to_string(), account.to_string())
        })
        .collect()
}

fn model_ledger_accounts(model: &HomebankModel, config: &Config) -> BTreeMap<String, String> {
    let accounts = model
        .accounts
        .values()
        .map(|account| account.ty.ledger_name(&[&account.name]));
    let categories = model
        .categories
        .iter()
        .filter(|category| category.include || !config.remove_empty_categories)
        .map(|category| category.ty.ledger_name(&category.path));
    [config.opening_balances_account.clone()]
        .into_iter()
        .chain(accounts)
        .chain(categories)
        .map(|name| {
            let source = sanitize(&name);
            let target = config.renames.ledger_account(&source).to_string();
            (source, target)
        })
        .collect()
}
