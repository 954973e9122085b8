use crate::error::{ConvertError, Result};

use super::document::{Attributes, RawDocument, RecordKind};

/// Homebank writes this paymode for internal transfers.
pub const PAYMODE_INTERNAL_TRANSFER: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyRecord {
    pub key: String,
    pub iso: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub key: String,
    pub name: String,
    pub currency: String,
    pub initial: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub key: String,
    pub name: String,
    pub parent: Option<String>,
    pub flags: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayeeRecord {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    /// Operations have no key, they are referred to by their 1-based position.
    pub position: usize,
    pub date: String,
    pub amount: String,
    pub account: String,
    pub category: Option<String>,
    pub dst_account: Option<String>,
    /// Shared by both legs of an internal transfer. Homebank writes `0` for "no link".
    pub transfer_link: Option<String>,
    pub payee: Option<String>,
    pub tags: Option<String>,
    pub info: Option<String>,
    pub wording: Option<String>,
    pub paymode: Option<u32>,
    pub is_split: bool,
}

impl OperationRecord {
    pub fn name(&self) -> String {
        format!("operation #{}", self.position)
    }
}

/// The typed records of a document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Records {
    pub currencies: Vec<CurrencyRecord>,
    pub accounts: Vec<AccountRecord>,
    pub categories: Vec<CategoryRecord>,
    pub tags: Vec<TagRecord>,
    pub payees: Vec<PayeeRecord>,
    pub operations: Vec<OperationRecord>,
}

impl Records {
    pub fn from_document(document: &RawDocument) -> Result<Self> {
        Ok(Self {
            currencies: keyed(document, RecordKind::Currency, |record| {
                Ok(CurrencyRecord {
                    key: record.key.clone(),
                    iso: record.required("iso")?,
                })
            })?,
            accounts: keyed(document, RecordKind::Account, |record| {
                Ok(AccountRecord {
                    key: record.key.clone(),
                    name: record.required("name")?,
                    currency: record.required("curr")?,
                    initial: record.optional("initial"),
                })
            })?,
            categories: keyed(document, RecordKind::Category, |record| {
                Ok(CategoryRecord {
                    key: record.key.clone(),
                    name: record.required("name")?,
                    parent: record.optional("parent"),
                    flags: record.number("flags")?.unwrap_or(0),
                })
            })?,
            tags: keyed(document, RecordKind::Tag, |record| {
                Ok(TagRecord {
                    key: record.key.clone(),
                    name: record.required("name")?,
                })
            })?,
            payees: keyed(document, RecordKind::Payee, |record| {
                Ok(PayeeRecord {
                    key: record.key.clone(),
                    name: record.required("name")?,
                })
            })?,
            operations: document
                .records(RecordKind::Operation)
                .iter()
                .enumerate()
                .map(|(index, attributes)| {
                    let record = RecordReader {
                        kind: RecordKind::Operation,
                        key: format!("#{}", index + 1),
                        attributes,
                    };
                    Ok(OperationRecord {
                        position: index + 1,
                        date: record.required("date")?,
                        amount: record.required("amount")?,
                        account: record.required("account")?,
                        category: record.optional("category"),
                        dst_account: record.optional("dst_account"),
                        transfer_link: record.optional("kxfer").filter(|link| link != "0"),
                        payee: record.optional("payee"),
                        tags: record.optional("tags"),
                        info: record.optional("info"),
                        wording: record.optional("wording"),
                        paymode: record.number("paymode")?,
                        is_split: record.optional("scat").is_some(),
                    })
                })
                .collect::<Result<_>>()?,
        })
    }
}

fn keyed<T>(
    document: &RawDocument,
    kind: RecordKind,
    parse: impl Fn(&RecordReader) -> Result<T>,
) -> Result<Vec<T>> {
    document
        .records(kind)
        .iter()
        .enumerate()
        .map(|(index, attributes)| {
            let key = attributes
                .get("key")
                .ok_or_else(|| ConvertError::MissingAttribute {
                    kind,
                    key: format!("#{}", index + 1),
                    attribute: "key",
                })?;
            parse(&RecordReader {
                kind,
                key: key.clone(),
                attributes,
            })
        })
        .collect()
}

struct RecordReader<'a> {
    kind: RecordKind,
    key: String,
    attributes: &'a Attributes,
}

impl RecordReader<'_> {
    fn required(&self, attribute: &'static str) -> Result<String> {
        self.attributes
            .get(attribute)
            .cloned()
            .ok_or_else(|| ConvertError::MissingAttribute {
                kind: self.kind,
                key: self.key.clone(),
                attribute,
            })
    }

    /// Absent and empty attributes are both `None`
    fn optional(&self, attribute: &'static str) -> Option<String> {
        self.attributes
            .get(attribute)
            .filter(|value| !value.is_empty())
            .cloned()
    }

    fn number(&self, attribute: &'static str) -> Result<Option<u32>> {
        self.optional(attribute)
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .map_err(|err: std::num::ParseIntError| ConvertError::InvalidAttribute {
                        kind: self.kind,
                        key: self.key.clone(),
                        attribute,
                        value: value.clone(),
                        reason: err.to_string(),
                    })
            })
            .transpose()
    }
}
