//! Source tag parsing.
//!
//! A binding declaration is a prefixed string such as `header:X-Request-Id`
//! or `json:customer.name`. The prefix picks the input channel, the remainder
//! is the key looked up in that channel.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{BindingError, BindingResult};

pub const HEADER: &str = "header:";
pub const PARAMETER: &str = "parameter:";
pub const VAR: &str = "var:";
pub const JSON: &str = "json:";
pub const FORMDATA: &str = "formdata:";

/// Field names reserved for command-line argument binding
pub const FLAGS_FIELD: &str = "flags";
pub const WORDS_FIELD: &str = "words";

/// Input channel a field draws its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Header,
    Parameter,
    Var,
    Json,
    FormData,
    /// Parsed flags / words of a matched command line
    Command,
}

impl SourceKind {
    /// Declaration prefix, `None` for the command context which has no tag
    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            SourceKind::Header => Some(HEADER),
            SourceKind::Parameter => Some(PARAMETER),
            SourceKind::Var => Some(VAR),
            SourceKind::Json => Some(JSON),
            SourceKind::FormData => Some(FORMDATA),
            SourceKind::Command => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Header => "header",
            SourceKind::Parameter => "parameter",
            SourceKind::Var => "var",
            SourceKind::Json => "json",
            SourceKind::FormData => "formdata",
            SourceKind::Command => "command",
        }
    }

    /// Sources whose absence is a body-level error rather than a per-field null
    pub fn is_body(&self) -> bool {
        matches!(self, SourceKind::Json | SourceKind::FormData)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const TAGGED_KINDS: [SourceKind; 5] = [
    SourceKind::Header,
    SourceKind::Parameter,
    SourceKind::Var,
    SourceKind::Json,
    SourceKind::FormData,
];

/// Parsed binding of one DTO field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub field_name: String,
    pub source_kind: SourceKind,
    pub source_key: String,
}

impl FieldSpec {
    /// Parse a tagged declaration. Prefixes are case-sensitive.
    pub fn parse(field_name: impl Into<String>, declaration: &str) -> BindingResult<Self> {
        let field_name = field_name.into();

        let (source_kind, source_key) = TAGGED_KINDS
            .iter()
            .find_map(|kind| {
                let prefix = kind.prefix()?;
                declaration
                    .strip_prefix(prefix)
                    .map(|key| (*kind, key.to_string()))
            })
            .ok_or_else(|| {
                BindingError::binding_spec(
                    &field_name,
                    format!("key: {declaration} does not contain type"),
                )
            })?;

        if source_key.is_empty() {
            return Err(BindingError::binding_spec(
                &field_name,
                format!("key: {declaration} has an empty source key"),
            ));
        }

        Ok(Self {
            field_name,
            source_kind,
            source_key,
        })
    }

    /// Binding for one of the reserved command fields (`flags` or `words`)
    pub fn command(field_name: impl Into<String>) -> BindingResult<Self> {
        let field_name = field_name.into();

        if !is_command_field(&field_name) {
            return Err(BindingError::binding_spec(
                &field_name,
                format!("only '{FLAGS_FIELD}' and '{WORDS_FIELD}' may bind to command arguments"),
            ));
        }

        Ok(Self {
            source_key: field_name.clone(),
            field_name,
            source_kind: SourceKind::Command,
        })
    }

    /// Render the binding back into its declaration form
    pub fn declaration(&self) -> String {
        match self.source_kind.prefix() {
            Some(prefix) => format!("{prefix}{}", self.source_key),
            None => self.field_name.clone(),
        }
    }
}

/// Whether a field name is reserved for command-line binding
pub fn is_command_field(field_name: &str) -> bool {
    field_name == FLAGS_FIELD || field_name == WORDS_FIELD
}
