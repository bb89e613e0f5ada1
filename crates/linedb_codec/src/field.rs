//! Conversions between Rust field types and [`Value`].

use crate::calendar::CalendarStamp;
use crate::error::{CodecError, CodecResult};
use crate::value::{Kind, Value};
use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Days between 0001-01-01 and 1970-01-01.
const UNIX_EPOCH_DAY_FROM_CE: i64 = 719_163;

/// A Rust type that can be stored as an entity property.
///
/// Implemented for the scalar types the file format knows, for
/// [`Option`] (absent values are omitted) and for [`Vec`] (homogeneous
/// lists). Enumerations implement [`Symbol`] and use
/// [`impl_symbol_field!`](crate::impl_symbol_field).
pub trait FieldValue: Sized {
    /// The semantic kind of this type.
    fn kind() -> Kind;

    /// Converts to a value, or `None` if the field is omitted from the record.
    fn to_value(&self) -> Option<Value>;

    /// Converts a decoded value back into the field type.
    fn from_value(value: Value) -> CodecResult<Self>;
}

/// An enumeration stored by symbol name.
pub trait Symbol: Sized + 'static {
    /// Type name of the enumeration, written before list elements.
    const TYPE_NAME: &'static str;

    /// The symbol's name.
    fn name(&self) -> &'static str;

    /// Looks up a symbol by name.
    fn from_name(name: &str) -> Option<Self>;
}

/// Implements [`FieldValue`] for a type implementing [`Symbol`].
///
/// ```
/// use linedb_codec::{impl_symbol_field, FieldValue, Symbol, Value};
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Color { Red, Green }
///
/// impl Symbol for Color {
///     const TYPE_NAME: &'static str = "Color";
///
///     fn name(&self) -> &'static str {
///         match self {
///             Color::Red => "RED",
///             Color::Green => "GREEN",
///         }
///     }
///
///     fn from_name(name: &str) -> Option<Self> {
///         match name {
///             "RED" => Some(Color::Red),
///             "GREEN" => Some(Color::Green),
///             _ => None,
///         }
///     }
/// }
///
/// impl_symbol_field!(Color);
///
/// assert_eq!(Color::Green.to_value(), Some(Value::Symbol("GREEN".into())));
/// assert_eq!(Color::from_value(Value::Symbol("RED".into())), Ok(Color::Red));
/// ```
#[macro_export]
macro_rules! impl_symbol_field {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::FieldValue for $ty {
                fn kind() -> $crate::Kind {
                    $crate::Kind::Symbol(<$ty as $crate::Symbol>::TYPE_NAME)
                }

                fn to_value(&self) -> ::std::option::Option<$crate::Value> {
                    $crate::symbol_to_value(self)
                }

                fn from_value(value: $crate::Value) -> $crate::CodecResult<Self> {
                    $crate::symbol_from_value(value)
                }
            }
        )+
    };
}

/// Converts a symbol to its value. Used by [`impl_symbol_field!`](crate::impl_symbol_field).
pub fn symbol_to_value<S: Symbol>(symbol: &S) -> Option<Value> {
    Some(Value::Symbol(symbol.name().to_string()))
}

/// Resolves a symbol value. Used by [`impl_symbol_field!`](crate::impl_symbol_field).
pub fn symbol_from_value<S: Symbol>(value: Value) -> CodecResult<S> {
    match value {
        Value::Symbol(name) => {
            S::from_name(&name).ok_or_else(|| CodecError::unknown_symbol(S::TYPE_NAME, name))
        }
        other => Err(CodecError::type_mismatch("symbol", other.kind_name())),
    }
}

/// Days since 1970-01-01.
pub(crate) fn epoch_day(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - UNIX_EPOCH_DAY_FROM_CE
}

pub(crate) fn date_from_epoch_day(days: i64) -> Option<NaiveDate> {
    let from_ce = days.checked_add(UNIX_EPOCH_DAY_FROM_CE)?;
    NaiveDate::from_num_days_from_ce_opt(i32::try_from(from_ce).ok()?)
}

fn mismatch<T>(expected: &Kind, found: &Value) -> CodecResult<T> {
    Err(CodecError::type_mismatch(
        expected.type_name(),
        found.kind_name(),
    ))
}

impl FieldValue for bool {
    fn kind() -> Kind {
        Kind::Bool
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Bool(*self))
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => mismatch(&Self::kind(), &other),
        }
    }
}

macro_rules! impl_integer_field {
    ($($ty:ty),+) => {
        $(
            impl FieldValue for $ty {
                fn kind() -> Kind {
                    Kind::Integer
                }

                fn to_value(&self) -> Option<Value> {
                    Some(Value::Integer(i128::from(*self)))
                }

                fn from_value(value: Value) -> CodecResult<Self> {
                    match value {
                        Value::Integer(n) => <$ty>::try_from(n)
                            .map_err(|_| CodecError::out_of_range(stringify!($ty), n)),
                        other => mismatch(&Self::kind(), &other),
                    }
                }
            }
        )+
    };
}

impl_integer_field!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FieldValue for String {
    fn kind() -> Kind {
        Kind::Text
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Text(self.clone()))
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Text(text) => Ok(text),
            other => mismatch(&Self::kind(), &other),
        }
    }
}

impl FieldValue for BigDecimal {
    fn kind() -> Kind {
        Kind::Decimal
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Decimal(self.clone()))
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Decimal(d) => Ok(d),
            Value::Integer(n) => n
                .to_string()
                .parse()
                .map_err(|_| CodecError::malformed("decimal", n.to_string())),
            other => mismatch(&Self::kind(), &other),
        }
    }
}

impl FieldValue for CalendarStamp {
    fn kind() -> Kind {
        Kind::Calendar
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Calendar(*self))
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Calendar(stamp) => Ok(stamp),
            other => mismatch(&Self::kind(), &other),
        }
    }
}

impl FieldValue for NaiveDate {
    fn kind() -> Kind {
        Kind::Date
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Date(*self))
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Date(date) => Ok(date),
            other => mismatch(&Self::kind(), &other),
        }
    }
}

impl FieldValue for NaiveDateTime {
    fn kind() -> Kind {
        Kind::DateTime
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::DateTime(*self))
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::DateTime(datetime) => Ok(datetime),
            other => mismatch(&Self::kind(), &other),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn kind() -> Kind {
        T::kind()
    }

    fn to_value(&self) -> Option<Value> {
        self.as_ref().and_then(T::to_value)
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        T::from_value(value).map(Some)
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn kind() -> Kind {
        Kind::List(Box::new(T::kind()))
    }

    /// Empty lists and lists of lists are omitted. Elements that are
    /// themselves absent (such as `None` in a `Vec<Option<_>>`) are skipped,
    /// so positions are not preserved across a round trip.
    fn to_value(&self) -> Option<Value> {
        let element = T::kind();
        if self.is_empty() || element.is_list() {
            return None;
        }
        let items: Vec<Value> = self.iter().filter_map(T::to_value).collect();
        if items.is_empty() {
            return None;
        }
        Some(Value::List {
            element_type: element.type_name().to_string(),
            items,
        })
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::List { items, .. } => items.into_iter().map(T::from_value).collect(),
            other => mismatch(&Self::kind(), &other),
        }
    }
}
