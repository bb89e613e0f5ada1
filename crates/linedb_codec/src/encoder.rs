//! Value encoder: [`Value`] to record token.

use crate::escape::escape;
use crate::value::Value;
use std::fmt::Write;

/// Encodes a value as a record token.
///
/// Returns `None` when the value must be omitted from the record: an empty
/// list, or a list whose elements are lists themselves.
///
/// Text-like values (text, symbols, calendar stamps) are escaped. Numbers
/// and references are written as plain decimal text.
///
/// ```
/// use linedb_codec::{encode_value, Value};
///
/// assert_eq!(encode_value(&Value::Bool(true)).as_deref(), Some("1"));
/// assert_eq!(encode_value(&Value::Text("a;b".into())).as_deref(), Some("a#y#b"));
/// ```
#[must_use]
pub fn encode_value(value: &Value) -> Option<String> {
    match value {
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some("0".to_string()),
        Value::Integer(n) => Some(n.to_string()),
        Value::Decimal(d) => Some(d.to_plain_string()),
        Value::Text(text) | Value::Symbol(text) => Some(escape(text)),
        Value::Calendar(stamp) => Some(escape(&stamp.to_string())),
        Value::Date(date) => Some(crate::field::epoch_day(*date).to_string()),
        Value::DateTime(datetime) => Some(datetime.and_utc().timestamp().to_string()),
        Value::Ref(id) => Some(id.to_string()),
        Value::List {
            element_type,
            items,
        } => encode_list(element_type, items),
    }
}

fn encode_list(element_type: &str, items: &[Value]) -> Option<String> {
    if items.is_empty() || items.iter().any(|item| matches!(item, Value::List { .. })) {
        return None;
    }
    let mut out = String::from(element_type);
    for item in items {
        // Non-list items always encode.
        let token = encode_value(item)?;
        let _ = write!(out, ",{token}");
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarStamp;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::str::FromStr;

    #[test]
    fn encode_scalars() {
        assert_eq!(encode_value(&Value::Bool(false)).unwrap(), "0");
        assert_eq!(encode_value(&Value::Integer(-42)).unwrap(), "-42");
        assert_eq!(encode_value(&Value::Ref(9)).unwrap(), "9");
        assert_eq!(
            encode_value(&Value::Symbol("GREEN".into())).unwrap(),
            "GREEN"
        );
    }

    #[test]
    fn encode_decimal_is_plain() {
        let price = BigDecimal::from_str("12.50").unwrap();
        assert_eq!(encode_value(&Value::Decimal(price)).unwrap(), "12.50");

        let big = BigDecimal::from_str("1E+3").unwrap();
        assert_eq!(encode_value(&Value::Decimal(big)).unwrap(), "1000");
    }

    #[test]
    fn encode_text_escapes() {
        let value = Value::Text("key: value; #1\n".into());
        assert_eq!(
            encode_value(&value).unwrap(),
            "key#x# value#y# XaFS1#n#"
        );
    }

    #[test]
    fn encode_dates() {
        let date = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(encode_value(&Value::Date(date)).unwrap(), "1");

        let datetime = date.and_hms_opt(0, 0, 30).unwrap();
        assert_eq!(encode_value(&Value::DateTime(datetime)).unwrap(), "86430");

        let stamp = CalendarStamp::from_fields(2000, 1, 29, 12, 0, 0, 5).unwrap();
        assert_eq!(
            encode_value(&Value::Calendar(stamp)).unwrap(),
            "2000.1.29.12.0.0.5"
        );
    }

    #[test]
    fn encode_list_prefixes_element_type() {
        let value = Value::List {
            element_type: "text".into(),
            items: vec![Value::Text("Adam".into()), Value::Text("Ewa".into())],
        };
        assert_eq!(encode_value(&value).unwrap(), "text,Adam,Ewa");
    }

    #[test]
    fn encode_list_of_refs() {
        let value = Value::List {
            element_type: "Apple".into(),
            items: vec![Value::Ref(1), Value::Ref(2)],
        };
        assert_eq!(encode_value(&value).unwrap(), "Apple,1,2");
    }

    #[test]
    fn encode_omits_empty_and_nested_lists() {
        let empty = Value::List {
            element_type: "text".into(),
            items: Vec::new(),
        };
        assert_eq!(encode_value(&empty), None);

        let nested = Value::List {
            element_type: "list".into(),
            items: vec![Value::List {
                element_type: "text".into(),
                items: vec![Value::Text("a".into())],
            }],
        };
        assert_eq!(encode_value(&nested), None);
    }
}
