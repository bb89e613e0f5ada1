//! Property values and their semantic kinds.

use crate::calendar::CalendarStamp;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};

/// The semantic kind of a property.
///
/// The kind is known statically from the entity's schema. It selects the
/// encode rule on save and the decode rule on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// `1` / `0`.
    Bool,
    /// Any fixed-width integer.
    Integer,
    /// Arbitrary-precision decimal.
    Decimal,
    /// Escaped text.
    Text,
    /// Enumeration symbol, with the enumeration's type name.
    Symbol(&'static str),
    /// Seven-field calendar timestamp.
    Calendar,
    /// Date stored as epoch day.
    Date,
    /// Date-time stored as UTC epoch seconds.
    DateTime,
    /// Homogeneous list of the given element kind.
    List(Box<Kind>),
    /// Reference to another entity type by identity.
    Entity(&'static str),
}

impl Kind {
    /// Name written before the elements of a list of this kind.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Integer => "int",
            Kind::Decimal => "decimal",
            Kind::Text => "text",
            Kind::Symbol(name) | Kind::Entity(name) => *name,
            Kind::Calendar => "calendar",
            Kind::Date => "date",
            Kind::DateTime => "datetime",
            Kind::List(_) => "list",
        }
    }

    /// Returns true for list kinds.
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Kind::List(_))
    }
}

/// A decoded property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Integer, wide enough for every supported field width.
    Integer(i128),
    /// Decimal.
    Decimal(BigDecimal),
    /// Text.
    Text(String),
    /// Enumeration symbol name.
    Symbol(String),
    /// Calendar timestamp.
    Calendar(CalendarStamp),
    /// Date.
    Date(NaiveDate),
    /// Date-time, interpreted as UTC.
    DateTime(NaiveDateTime),
    /// List with the element type name it was written with.
    List {
        /// Element type name.
        element_type: String,
        /// Elements in order.
        items: Vec<Value>,
    },
    /// Shallow entity reference.
    Ref(u64),
}

impl Value {
    /// Short name of the value's kind, for error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Integer(_) => "int",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Symbol(_) => "symbol",
            Value::Calendar(_) => "calendar",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::List { .. } => "list",
            Value::Ref(_) => "reference",
        }
    }

    /// Returns the referenced identity, if this is a reference.
    #[must_use]
    pub fn as_ref_id(&self) -> Option<u64> {
        match self {
            Value::Ref(id) => Some(*id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_type_names() {
        assert_eq!(Kind::Text.type_name(), "text");
        assert_eq!(Kind::Entity("Apple").type_name(), "Apple");
        assert_eq!(Kind::Symbol("Color").type_name(), "Color");
        assert_eq!(Kind::List(Box::new(Kind::Integer)).type_name(), "list");
    }

    #[test]
    fn list_kind_detection() {
        assert!(Kind::List(Box::new(Kind::Text)).is_list());
        assert!(!Kind::Text.is_list());
    }

    #[test]
    fn ref_id() {
        assert_eq!(Value::Ref(7).as_ref_id(), Some(7));
        assert_eq!(Value::Integer(7).as_ref_id(), None);
    }
}
