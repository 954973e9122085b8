use anyhow::{anyhow, Context as _, Result};
use std::path::Path;

mod document;
mod schema;
mod xml;

pub use document::{Attributes, RawDocument, RecordKind};
pub use schema::{
    AccountRecord, CategoryRecord, CurrencyRecord, OperationRecord, PayeeRecord, Records,
    TagRecord, PAYMODE_INTERNAL_TRANSFER,
};
pub use xml::read_document;

#[cfg(test)]
pub use document::testutils;

pub fn load(path: &Path) -> Result<RawDocument> {
    log::info!("Reading Homebank file...");
    let content = std::fs::read_to_string(path)
        .with_context(|| anyhow!("Failed to read {}", path.display()))?;
    let content = maybe_remove_byte_order_mark(content);
    let document = read_document(&content)
        .with_context(|| anyhow!("Invalid Homebank file {}", path.display()))?;
    log::info!("Reading Homebank file...done");
    Ok(document)
}

fn maybe_remove_byte_order_mark(mut content: String) -> String {
    if content.starts_with('\u{FEFF}') {
        content.remove(0);
    }
    content
}
