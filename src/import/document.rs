use std::{collections::HashMap, fmt};

pub type Attributes = HashMap<String, String>;

/// The record collections a Homebank document consists of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Currency,
    Account,
    Category,
    Tag,
    Payee,
    Operation,
}

impl RecordKind {
    pub fn element_name(&self) -> &'static str {
        match self {
            RecordKind::Currency => "cur",
            RecordKind::Account => "account",
            RecordKind::Category => "cat",
            RecordKind::Tag => "tag",
            RecordKind::Payee => "pay",
            RecordKind::Operation => "ope",
        }
    }

    pub fn from_element_name(name: &str) -> Option<Self> {
        match name {
            "cur" => Some(RecordKind::Currency),
            "account" => Some(RecordKind::Account),
            "cat" => Some(RecordKind::Category),
            "tag" => Some(RecordKind::Tag),
            "pay" => Some(RecordKind::Payee),
            "ope" => Some(RecordKind::Operation),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Currency => "currency",
            RecordKind::Account => "account",
            RecordKind::Category => "category",
            RecordKind::Tag => "tag",
            RecordKind::Payee => "payee",
            RecordKind::Operation => "operation",
        })
    }
}

/// A Homebank document as flat attribute maps, one per record, in document order.
/// Collections that don't appear in the document are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDocument {
    records: HashMap<RecordKind, Vec<Attributes>>,
    pub properties: Attributes,
}

impl RawDocument {
    pub fn push(&mut self, kind: RecordKind, attributes: Attributes) {
        self.records.entry(kind).or_default().push(attributes);
    }

    pub fn records(&self, kind: RecordKind) -> &[Attributes] {
        self.records.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
pub mod testutils {
    use super::*;

    pub fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    /// Builds [RawDocument]s in tests without going through XML.
    #[derive(Default)]
    pub struct DocumentBuilder {
        document: RawDocument,
    }

    impl DocumentBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn currency(mut self, key: &str, iso: &str) -> Self {
            self.document
                .push(RecordKind::Currency, attrs(&[("key", key), ("iso", iso)]));
            self
        }

        pub fn account(mut self, key: &str, name: &str, currency: &str, initial: &str) -> Self {
            self.document.push(
                RecordKind::Account,
                attrs(&[
                    ("key", key),
                    ("name", name),
                    ("curr", currency),
                    ("initial", initial),
                ]),
            );
            self
        }

        pub fn category(mut self, key: &str, name: &str, parent: Option<&str>, flags: u32) -> Self {
            let flags = flags.to_string();
            let mut attributes = attrs(&[("key", key), ("name", name), ("flags", &flags)]);
            if let Some(parent) = parent {
                attributes.insert("parent".to_string(), parent.to_string());
            }
            self.document.push(RecordKind::Category, attributes);
            self
        }

        pub fn payee(mut self, key: &str, name: &str) -> Self {
            self.document
                .push(RecordKind::Payee, attrs(&[("key", key), ("name", name)]));
            self
        }

        pub fn tag(mut self, key: &str, name: &str) -> Self {
            self.document
                .push(RecordKind::Tag, attrs(&[("key", key), ("name", name)]));
            self
        }

        pub fn operation(mut self, pairs: &[(&str, &str)]) -> Self {
            self.document.push(RecordKind::Operation, attrs(pairs));
            self
        }

        pub fn property(mut self, key: &str, value: &str) -> Self {
            self.document
                .properties
                .insert(key.to_string(), value.to_string());
            self
        }

        pub fn build(self) -> RawDocument {
            self.document
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testutils::attrs;
    use super::*;

    #[test]
    fn missing_collection_is_empty() {
        let document = RawDocument::default();
        assert!(document.records(RecordKind::Operation).is_empty());
    }

    #[test]
    fn records_keep_document_order() {
        let mut document = RawDocument::default();
        document.push(RecordKind::Payee, attrs(&[("key", "2")]));
        document.push(RecordKind::Payee, attrs(&[("key", "1")]));
        let keys: Vec<&str> = document
            .records(RecordKind::Payee)
            .iter()
            .map(|record| record["key"].as_str())
            .collect();
        assert_eq!(vec!["2", "1"], keys);
    }
}
