use anyhow::{anyhow, bail, Context as _, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::document::{Attributes, RawDocument, RecordKind};

const ROOT_ELEMENT: &[u8] = b"homebank";
const PROPERTIES_ELEMENT: &[u8] = b"properties";

/// Reads the records of a Homebank `.xhb` document. Only the attributes of the direct children
/// of `<homebank>` are kept; element text and unknown elements are ignored.
pub fn read_document(content: &str) -> Result<RawDocument> {
    let mut reader = Reader::from_str(content);
    let mut document = RawDocument::default();
    let mut found_root = false;
    let mut depth = 0usize;
    loop {
        let event = reader
            .read_event()
            .with_context(|| anyhow!("Invalid XML at byte {}", reader.buffer_position()))?;
        match event {
            Event::Start(element) => {
                handle_element(&mut document, &mut found_root, depth, &element)?;
                depth += 1;
            }
            Event::Empty(element) => {
                handle_element(&mut document, &mut found_root, depth, &element)?;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !found_root {
        bail!("Not a Homebank file: missing <homebank> element");
    }
    Ok(document)
}

fn handle_element(
    document: &mut RawDocument,
    found_root: &mut bool,
    depth: usize,
    element: &BytesStart,
) -> Result<()> {
    match depth {
        0 => {
            if element.name().as_ref() != ROOT_ELEMENT {
                bail!(
                    "Not a Homebank file: root element is <{}>",
                    String::from_utf8_lossy(element.name().as_ref())
                );
            }
            *found_root = true;
        }
        1 => {
            let name = element.name();
            if name.as_ref() == PROPERTIES_ELEMENT {
                document.properties = attributes(element)?;
            } else if let Some(kind) = std::str::from_utf8(name.as_ref())
                .ok()
                .and_then(RecordKind::from_element_name)
            {
                log::debug!("Reading <{}> record", kind.element_name());
                document.push(kind, attributes(element)?);
            } else {
                log::debug!(
                    "Ignoring <{}> element",
                    String::from_utf8_lossy(name.as_ref())
                );
            }
        }
        _ => {}
    }
    Ok(())
}

fn attributes(element: &BytesStart) -> Result<Attributes> {
    element
        .attributes()
        .map(|attribute| -> Result<(String, String)> {
            let attribute = attribute?;
            let key = std::str::from_utf8(attribute.key.as_ref())?.to_string();
            let value = attribute.unescape_value()?.into_owned();
            Ok((key, value))
        })
        .collect()
}
