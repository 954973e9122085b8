use anyhow::{anyhow, ensure, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};

use crate::ledger::AccountType;

/// Exact-match renames. Names without an entry are kept as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameTables {
    pub accounts: BTreeMap<String, String>,
    pub categories: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub payees: BTreeMap<String, String>,
    /// Applied to the full, sanitized ledger account name as a last step.
    pub ledger_accounts: BTreeMap<String, String>,
}

impl RenameTables {
    pub fn account<'a>(&'a self, name: &'a str) -> &'a str {
        translate(&self.accounts, name)
    }

    pub fn category<'a>(&'a self, name: &'a str) -> &'a str {
        translate(&self.categories, name)
    }

    pub fn tag<'a>(&'a self, name: &'a str) -> &'a str {
        translate(&self.tags, name)
    }

    pub fn payee<'a>(&'a self, name: &'a str) -> &'a str {
        translate(&self.payees, name)
    }

    pub fn ledger_account<'a>(&'a self, name: &'a str) -> &'a str {
        translate(&self.ledger_accounts, name)
    }
}

fn translate<'a>(table: &'a BTreeMap<String, String>, name: &'a str) -> &'a str {
    table.get(name).map(String::as_str).unwrap_or(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionFlag {
    #[serde(rename = "*")]
    Okay,
    #[serde(rename = "!")]
    Warning,
}

/// Settings for one conversion run. Built once before the conversion starts
/// and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub renames: RenameTables,
    pub prefer_positive_amounts: bool,
    pub remove_empty_categories: bool,
    pub open_date: NaiveDate,
    pub pad_date: NaiveDate,
    pub balance_date: NaiveDate,
    pub default_flag: TransactionFlag,
    pub opening_balances_account: String,
    pub uncategorized_account: String,
}

impl Default for Config {
    fn default() -> Self {
        let open_date = chrono::NaiveDateTime::UNIX_EPOCH.date();
        Self {
            renames: RenameTables::default(),
            prefer_positive_amounts: true,
            remove_empty_categories: true,
            open_date,
            pad_date: open_date + chrono::Days::new(1),
            balance_date: open_date + chrono::Days::new(2),
            default_flag: TransactionFlag::Okay,
            opening_balances_account: "Equity:Opening-Balances".to_string(),
            uncategorized_account: "Expenses:Uncategorized".to_string(),
        }
    }
}

impl Config {
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(renames) = overrides.renames {
            let tables = &mut self.renames;
            let replace = |table: &mut BTreeMap<String, String>, new| {
                if let Some(new) = new {
                    *table = new;
                }
            };
            replace(&mut tables.accounts, renames.accounts);
            replace(&mut tables.categories, renames.categories);
            replace(&mut tables.tags, renames.tags);
            replace(&mut tables.payees, renames.payees);
            replace(&mut tables.ledger_accounts, renames.ledger_accounts);
        }
        if let Some(value) = overrides.prefer_positive_amounts {
            self.prefer_positive_amounts = value;
        }
        if let Some(value) = overrides.remove_empty_categories {
            self.remove_empty_categories = value;
        }
        if let Some(value) = overrides.open_date {
            self.open_date = value;
        }
        if let Some(value) = overrides.pad_date {
            self.pad_date = value;
        }
        if let Some(value) = overrides.balance_date {
            self.balance_date = value;
        }
        if let Some(value) = overrides.default_flag {
            self.default_flag = value;
        }
        if let Some(value) = overrides.opening_balances_account {
            self.opening_balances_account = value;
        }
        if let Some(value) = overrides.uncategorized_account {
            self.uncategorized_account = value;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.open_date < self.pad_date && self.pad_date < self.balance_date,
            "Dates must be ordered open_date < pad_date < balance_date, but got {} / {} / {}",
            self.open_date,
            self.pad_date,
            self.balance_date,
        );
        validate_ledger_account(&self.opening_balances_account)
            .context("Error in opening_balances_account")?;
        validate_ledger_account(&self.uncategorized_account)
            .context("Error in uncategorized_account")?;
        for (from, to) in &self.renames.ledger_accounts {
            validate_ledger_account(to)
                .with_context(|| anyhow!("Error in ledger account rename {} -> {}", from, to))?;
        }
        Ok(())
    }
}

fn validate_ledger_account(name: &str) -> Result<()> {
    let (ty, _parts) = AccountType::split_ledger_name(name).ok_or_else(|| {
        anyhow!(
            "Account '{}' must start with one of: Assets:, Liabilities:, Equity:, Income:, Expenses:",
            name
        )
    })?;
    log::debug!("Config account {} has type {}", name, ty);
    Ok(())
}

/// The on-disk form of the configuration. Every field is optional and only
/// replaces the default when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renames: Option<RenameOverrides>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_positive_amounts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_empty_categories: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pad_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_flag: Option<TransactionFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_balances_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncategorized_account: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payees: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_accounts: Option<BTreeMap<String, String>>,
}

impl ConfigOverrides {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading config...");
        let content = std::fs::read_to_string(path)
            .with_context(|| anyhow!("Failed to read config file {}", path.display()))?;
        let overrides = Self::parse(&content)
            .with_context(|| anyhow!("Failed to parse config file {}", path.display()))?;
        log::info!("Loading config...done");
        Ok(overrides)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use common_macros::b_tree_map;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.prefer_positive_amounts);
        assert!(config.remove_empty_categories);
        assert_eq!(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(), config.open_date);
        assert_eq!(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap(), config.pad_date);
        assert_eq!(NaiveDate::from_ymd_opt(1970, 1, 3).unwrap(), config.balance_date);
        assert_eq!(TransactionFlag::Okay, config.default_flag);
        assert_eq!("Equity:Opening-Balances", config.opening_balances_account);
        config.validate().unwrap();
    }

    #[test]
    fn rename_is_identity_without_entry() {
        let renames = RenameTables {
            accounts: b_tree_map! {"Something".to_string() => "Something-Else".to_string()},
            ..RenameTables::default()
        };
        assert_eq!("Something-Else", renames.account("Something"));
        assert_eq!("Other", renames.account("Other"));
        assert_eq!("Something", renames.category("Something"));
    }

    #[test]
    fn parse_partial_overrides() {
        let overrides = ConfigOverrides::parse(
            r#"
renames:
  categories:
    "(none)": None
  tags:
    tag: my-tag
prefer_positive_amounts: false
default_flag: "!"
pad_date: 1970-01-05
balance_date: 1970-01-06
"#,
        )
        .unwrap();
        let config = Config::default().with_overrides(overrides);
        assert_eq!(
            b_tree_map! {"(none)".to_string() => "None".to_string()},
            config.renames.categories
        );
        assert_eq!("my-tag", config.renames.tag("tag"));
        assert!(config.renames.accounts.is_empty());
        assert!(!config.prefer_positive_amounts);
        assert!(config.remove_empty_categories);
        assert_eq!(TransactionFlag::Warning, config.default_flag);
        assert_eq!(NaiveDate::from_ymd_opt(1970, 1, 5).unwrap(), config.pad_date);
        config.validate().unwrap();
    }

    #[test]
    fn rename_override_replaces_table() {
        let base = Config::default().with_overrides(ConfigOverrides {
            renames: Some(RenameOverrides {
                accounts: Some(b_tree_map! {"a".to_string() => "b".to_string()}),
                ..Default::default()
            }),
            ..Default::default()
        });
        let config = base.with_overrides(ConfigOverrides {
            renames: Some(RenameOverrides {
                accounts: Some(b_tree_map! {"c".to_string() => "d".to_string()}),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(
            b_tree_map! {"c".to_string() => "d".to_string()},
            config.renames.accounts
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(ConfigOverrides::parse("prefer_positive: true").is_err());
    }

    #[test]
    fn invalid_flag_is_rejected() {
        assert!(ConfigOverrides::parse("default_flag: \"x\"").is_err());
    }

    #[test]
    fn unordered_dates_are_invalid() {
        let config = Config::default().with_overrides(ConfigOverrides {
            pad_date: NaiveDate::from_ymd_opt(1969, 12, 31),
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn opening_balances_account_needs_root_type() {
        let config = Config::default().with_overrides(ConfigOverrides {
            opening_balances_account: Some("Opening-Balances".to_string()),
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn ledger_account_rename_needs_root_type() {
        let config = Config::default().with_overrides(ConfigOverrides {
            renames: Some(RenameOverrides {
                ledger_accounts: Some(
                    b_tree_map! {"Assets:Bank".to_string() => "Bank".to_string()},
                ),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("config.yaml");
        std::fs::write(&path, "remove_empty_categories: false\n").unwrap();
        let overrides = ConfigOverrides::load(&path).unwrap();
        assert_eq!(Some(false), overrides.remove_empty_categories);
    }

    #[test]
    fn overrides_yaml_skips_unset_fields() {
        let overrides = ConfigOverrides {
            remove_empty_categories: Some(false),
            ..Default::default()
        };
        assert_eq!("remove_empty_categories: false\n", overrides.to_yaml().unwrap());
    }
}
