use thiserror::Error;

use crate::import::RecordKind;

/// Everything that can make a conversion fail. Conversion never produces partial output,
/// so all of these are terminal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("{referenced_by} references {kind} '{key}', which doesn't exist")]
    MissingRecord {
        kind: RecordKind,
        key: String,
        referenced_by: String,
    },

    #[error("{kind} '{key}' is missing the required attribute '{attribute}'")]
    MissingAttribute {
        kind: RecordKind,
        key: String,
        attribute: &'static str,
    },

    #[error("{kind} '{key}' has an invalid '{attribute}' attribute '{value}': {reason}")]
    InvalidAttribute {
        kind: RecordKind,
        key: String,
        attribute: &'static str,
        value: String,
        reason: String,
    },

    #[error("Category '{key}' has parent '{parent}', which doesn't exist")]
    DanglingParent { key: String, parent: String },

    #[error("Category '{key}' is part of a parent cycle")]
    CategoryCycle { key: String },

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl ConvertError {
    pub fn is_malformed_input(&self) -> bool {
        match self {
            Self::MissingRecord { .. }
            | Self::MissingAttribute { .. }
            | Self::InvalidAttribute { .. }
            | Self::DanglingParent { .. } => true,
            Self::CategoryCycle { .. } | Self::Invariant(_) => false,
        }
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
