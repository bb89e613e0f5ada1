//! Record line format.
//!
//! The data file holds one record per line:
//!
//! ```text
//! #Apple:2
//! Apple;Id:1;color:GREEN;weight:150
//! Apple;Id:2;color:RED;weight:120
//! ```
//!
//! A header line (`#<type>:<last id>`) carries a type's identity counter.
//! An entity line starts with the type name, followed by `;`-separated
//! `name:token` fields. Each field is split on its first `:`; tokens are
//! produced by the value codec, which escapes every delimiter.

use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};
use std::fmt::Write;

/// Name of the identity field.
pub const ID_FIELD: &str = "Id";

/// One parsed line of the data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// `#<type>:<last id>`.
    Header {
        /// Entity type name.
        type_name: String,
        /// Highest identity issued for the type.
        last_id: u64,
    },
    /// An entity line.
    Entity(EntityRecord),
}

/// An entity line, with its fields still encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    /// Entity type name.
    pub type_name: String,
    /// The entity's identity.
    pub id: EntityId,
    /// Property fields in file order, excluding `Id`. Tokens are escaped.
    pub fields: Vec<(String, String)>,
}

impl EntityRecord {
    /// Returns the token of the named field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(field, _)| field == name)
            .map(|(_, token)| token.as_str())
    }

    /// Renders the record as a line, without the line break.
    #[must_use]
    pub fn render(&self) -> String {
        render_entity(&self.type_name, self.id, &self.fields)
    }
}

/// Parses one line. Blank lines yield `None`.
///
/// The returned error carries line number 0; use [`CoreError::at_line`] to
/// attach the real one.
pub fn parse_line(line: &str) -> CoreResult<Option<Record>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() {
        return Ok(None);
    }

    if let Some(header) = line.strip_prefix('#') {
        let (type_name, last_id) = header
            .split_once(':')
            .ok_or_else(|| CoreError::malformed_record(0, "header without ':'"))?;
        if type_name.is_empty() {
            return Err(CoreError::malformed_record(0, "header without type name"));
        }
        let last_id = last_id.parse().map_err(|_| {
            CoreError::malformed_record(0, format!("invalid counter {last_id:?}"))
        })?;
        return Ok(Some(Record::Header {
            type_name: type_name.to_string(),
            last_id,
        }));
    }

    let mut parts = line.split(';');
    let type_name = parts.next().unwrap_or_default();
    if type_name.is_empty() || type_name.contains(':') {
        return Err(CoreError::malformed_record(0, "record without type name"));
    }

    let mut id = None;
    let mut fields = Vec::new();
    for part in parts {
        let (name, token) = part
            .split_once(':')
            .ok_or_else(|| CoreError::malformed_record(0, format!("field {part:?} without ':'")))?;
        if name == ID_FIELD {
            let parsed = token
                .parse::<u64>()
                .ok()
                .filter(|&id| id != 0)
                .ok_or_else(|| CoreError::malformed_record(0, format!("invalid Id {token:?}")))?;
            id = Some(EntityId::new(parsed));
        } else {
            fields.push((name.to_string(), token.to_string()));
        }
    }

    let id = id.ok_or_else(|| CoreError::malformed_record(0, "record without Id"))?;
    Ok(Some(Record::Entity(EntityRecord {
        type_name: type_name.to_string(),
        id,
        fields,
    })))
}

/// Renders a header line, without the line break.
#[must_use]
pub fn render_header(type_name: &str, last_id: u64) -> String {
    format!("#{type_name}:{last_id}")
}

/// Renders an entity line, without the line break.
#[must_use]
pub fn render_entity<N, T>(type_name: &str, id: EntityId, fields: &[(N, T)]) -> String
where
    N: AsRef<str>,
    T: AsRef<str>,
{
    let mut line = format!("{type_name};{ID_FIELD}:{id}");
    for (name, token) in fields {
        let _ = write!(line, ";{}:{}", name.as_ref(), token.as_ref());
    }
    line
}
