use std::collections::{HashMap, HashSet};

use crate::config::RenameTables;
use crate::error::{ConvertError, Result};
use crate::import::{CategoryRecord, RecordKind};
use crate::ledger::AccountType;

use super::UniqueId;

const INCOME_FLAG: u32 = 0b10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub key: String,
    pub raw_name: String,
    pub name: String,
    pub parent: Option<usize>,
    /// Translated names from the root category down to this one.
    pub path: Vec<String>,
    pub ty: AccountType,
    pub unique_id: UniqueId,
    /// Whether an operation references this category or one of its descendants.
    pub include: bool,
}

/// Categories in document order, with parents stored as indices into the same list.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    categories: Vec<Category>,
    indices: HashMap<String, usize>,
}

impl CategoryTree {
    pub fn build(records: &[CategoryRecord], renames: &RenameTables) -> Result<Self> {
        let mut indices = HashMap::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            if indices.insert(record.key.clone(), index).is_some() {
                return Err(duplicate_key(record));
            }
        }

        // Every level is renamed on its own, before paths are assembled
        let names: Vec<&str> = records
            .iter()
            .map(|record| renames.category(&record.name))
            .collect();

        let parents = records
            .iter()
            .map(|record| match &record.parent {
                None => Ok(None),
                Some(parent) => {
                    indices
                        .get(parent)
                        .copied()
                        .map(Some)
                        .ok_or_else(|| ConvertError::DanglingParent {
                            key: record.key.clone(),
                            parent: parent.clone(),
                        })
                }
            })
            .collect::<Result<Vec<Option<usize>>>>()?;

        let categories = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let path = resolve_path(index, &parents, &names).ok_or_else(|| {
                    ConvertError::CategoryCycle {
                        key: record.key.clone(),
                    }
                })?;
                let ty = if record.flags & INCOME_FLAG != 0 {
                    AccountType::Income
                } else {
                    AccountType::Expenses
                };
                Ok(Category {
                    key: record.key.clone(),
                    raw_name: record.name.clone(),
                    name: names[index].to_string(),
                    parent: parents[index],
                    path,
                    ty,
                    unique_id: UniqueId::category(&record.key),
                    include: false,
                })
            })
            .collect::<Result<_>>()?;

        Ok(Self {
            categories,
            indices,
        })
    }

    pub fn get(&self, key: &str) -> Option<(usize, &Category)> {
        self.indices
            .get(key)
            .map(|&index| (index, &self.categories[index]))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// Marks a category and all its ancestors as included.
    pub fn mark_included(&mut self, index: usize) {
        let mut current = Some(index);
        while let Some(index) = current {
            let category = &mut self.categories[index];
            if category.include {
                // Ancestors of an included category are already included
                break;
            }
            category.include = true;
            current = category.parent;
        }
    }
}

/// Walks up the parent chain. Returns `None` if the chain runs into a cycle.
fn resolve_path(index: usize, parents: &[Option<usize>], names: &[&str]) -> Option<Vec<String>> {
    let mut visited = HashSet::new();
    let mut path = vec![];
    let mut current = Some(index);
    while let Some(index) = current {
        if !visited.insert(index) {
            return None;
        }
        path.push(names[index].to_string());
        current = parents[index];
    }
    path.reverse();
    Some(path)
}

fn duplicate_key(record: &CategoryRecord) -> ConvertError {
    ConvertError::InvalidAttribute {
        kind: RecordKind::Category,
        key: record.key.clone(),
        attribute: "key",
        value: record.key.clone(),
        reason: "duplicate key".to_string(),
    }
}
