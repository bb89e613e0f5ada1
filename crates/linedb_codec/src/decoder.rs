//! Value decoder: record token plus [`Kind`] to [`Value`].

use crate::calendar::CalendarStamp;
use crate::error::{CodecError, CodecResult};
use crate::escape::unescape;
use crate::value::{Kind, Value};
use bigdecimal::BigDecimal;
use chrono::DateTime;
use std::str::FromStr;

/// Decodes a record token as a value of `kind`.
///
/// Entity kinds, and entity elements of lists, decode to [`Value::Ref`]:
/// a shallow reference carrying only the identity. Lists of lists are never
/// written, so such a token decodes to an empty list.
///
/// List decoding is all or nothing. The element type name written before
/// the elements must match the declared element kind, and a single bad
/// element fails the whole list.
pub fn decode_value(token: &str, kind: &Kind) -> CodecResult<Value> {
    match kind {
        Kind::Bool => match token {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            _ => Err(CodecError::malformed("bool", token)),
        },
        Kind::Integer => token
            .parse::<i128>()
            .map(Value::Integer)
            .map_err(|_| CodecError::malformed("int", token)),
        Kind::Decimal => BigDecimal::from_str(token)
            .map(Value::Decimal)
            .map_err(|_| CodecError::malformed("decimal", token)),
        Kind::Text => Ok(Value::Text(unescape(token))),
        Kind::Symbol(_) => {
            let name = unescape(token);
            if name.is_empty() {
                return Err(CodecError::malformed("symbol", token));
            }
            Ok(Value::Symbol(name))
        }
        Kind::Calendar => CalendarStamp::parse(&unescape(token))
            .map(Value::Calendar)
            .ok_or_else(|| CodecError::malformed("calendar", token)),
        Kind::Date => {
            let days = parse_i64("date", token)?;
            crate::field::date_from_epoch_day(days)
                .map(Value::Date)
                .ok_or_else(|| CodecError::out_of_range("date", days))
        }
        Kind::DateTime => {
            let seconds = parse_i64("datetime", token)?;
            DateTime::from_timestamp(seconds, 0)
                .map(|datetime| Value::DateTime(datetime.naive_utc()))
                .ok_or_else(|| CodecError::out_of_range("datetime", seconds))
        }
        Kind::Entity(_) => parse_ref(token),
        Kind::List(element) => decode_list(token, element),
    }
}

fn decode_list(token: &str, element: &Kind) -> CodecResult<Value> {
    let mut parts = token.split(',');
    let stored_type = parts.next().unwrap_or_default();
    if element.is_list() {
        return Ok(Value::List {
            element_type: stored_type.to_string(),
            items: Vec::new(),
        });
    }
    if stored_type != element.type_name() {
        return Err(CodecError::type_mismatch(element.type_name(), stored_type));
    }
    let items = parts
        .map(|part| match element {
            Kind::Entity(_) => parse_ref(part),
            _ => decode_value(part, element),
        })
        .collect::<CodecResult<Vec<_>>>()?;
    Ok(Value::List {
        element_type: stored_type.to_string(),
        items,
    })
}

fn parse_ref(token: &str) -> CodecResult<Value> {
    token
        .parse::<u64>()
        .map(Value::Ref)
        .map_err(|_| CodecError::malformed("reference", token))
}

fn parse_i64(kind: &'static str, token: &str) -> CodecResult<i64> {
    token
        .parse::<i64>()
        .map_err(|_| CodecError::malformed(kind, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode_value;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn text_list() -> Kind {
        Kind::List(Box::new(Kind::Text))
    }

    #[test]
    fn decode_bool() {
        assert_eq!(decode_value("1", &Kind::Bool).unwrap(), Value::Bool(true));
        assert_eq!(decode_value("0", &Kind::Bool).unwrap(), Value::Bool(false));
        assert!(matches!(
            decode_value("true", &Kind::Bool),
            Err(CodecError::Malformed { kind: "bool", .. })
        ));
    }

    #[test]
    fn decode_integer() {
        assert_eq!(
            decode_value("-17", &Kind::Integer).unwrap(),
            Value::Integer(-17)
        );
        assert!(decode_value("", &Kind::Integer).is_err());
        assert!(decode_value("1.5", &Kind::Integer).is_err());
    }

    #[test]
    fn decode_decimal() {
        let value = decode_value("19.99", &Kind::Decimal).unwrap();
        assert_eq!(
            value,
            Value::Decimal(BigDecimal::from_str("19.99").unwrap())
        );
        assert!(decode_value("abc", &Kind::Decimal).is_err());
    }

    #[test]
    fn decode_text_unescapes() {
        assert_eq!(
            decode_value("a#x#bXaFS", &Kind::Text).unwrap(),
            Value::Text("a:b#".into())
        );
        assert_eq!(decode_value("", &Kind::Text).unwrap(), Value::Text(String::new()));
    }

    #[test]
    fn decode_symbol_rejects_empty() {
        assert!(decode_value("", &Kind::Symbol("Color")).is_err());
        assert_eq!(
            decode_value("RED", &Kind::Symbol("Color")).unwrap(),
            Value::Symbol("RED".into())
        );
    }

    #[test]
    fn decode_dates() {
        let date = decode_value("18262", &Kind::Date).unwrap();
        assert_eq!(
            date,
            Value::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
        );

        let before_epoch = decode_value("-1", &Kind::Date).unwrap();
        assert_eq!(
            before_epoch,
            Value::Date(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap())
        );

        let datetime = decode_value("0", &Kind::DateTime).unwrap();
        assert_eq!(
            datetime,
            Value::DateTime(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
        );

        assert!(matches!(
            decode_value("9223372036854775807", &Kind::Date),
            Err(CodecError::OutOfRange { .. })
        ));
    }

    #[test]
    fn decode_calendar() {
        let value = decode_value("2020.0.31.13.5.9.7", &Kind::Calendar).unwrap();
        let expected = CalendarStamp::from_fields(2020, 0, 31, 13, 5, 9, 7).unwrap();
        assert_eq!(value, Value::Calendar(expected));
        assert!(decode_value("2020.0.31", &Kind::Calendar).is_err());
    }

    #[test]
    fn decode_entity_is_shallow_ref() {
        assert_eq!(
            decode_value("3", &Kind::Entity("Apple")).unwrap(),
            Value::Ref(3)
        );
        assert!(decode_value("-3", &Kind::Entity("Apple")).is_err());
    }

    #[test]
    fn decode_text_list_in_order() {
        let value = decode_value("text,Adam,Ewa", &text_list()).unwrap();
        assert_eq!(
            value,
            Value::List {
                element_type: "text".into(),
                items: vec![Value::Text("Adam".into()), Value::Text("Ewa".into())],
            }
        );
    }

    #[test]
    fn decode_list_keeps_empty_elements() {
        let value = decode_value("text,,x,", &text_list()).unwrap();
        let Value::List { items, .. } = value else {
            panic!("expected a list");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Value::Text(String::new()));
        assert_eq!(items[2], Value::Text(String::new()));
    }

    #[test]
    fn decode_entity_list() {
        let kind = Kind::List(Box::new(Kind::Entity("Apple")));
        let value = decode_value("Apple,1,2", &kind).unwrap();
        assert_eq!(
            value,
            Value::List {
                element_type: "Apple".into(),
                items: vec![Value::Ref(1), Value::Ref(2)],
            }
        );
    }

    #[test]
    fn decode_list_checks_element_type() {
        assert!(matches!(
            decode_value("int,1,2", &text_list()),
            Err(CodecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn decode_list_fails_on_bad_element() {
        let kind = Kind::List(Box::new(Kind::Integer));
        assert!(decode_value("int,1,x,3", &kind).is_err());
    }

    #[test]
    fn decode_list_of_lists_is_empty() {
        let kind = Kind::List(Box::new(text_list()));
        assert_eq!(
            decode_value("list,a", &kind).unwrap(),
            Value::List {
                element_type: "list".to_string(),
                items: vec![],
            }
        );
    }

    proptest! {
        #[test]
        fn integer_token_roundtrip(n in any::<i64>()) {
            let token = encode_value(&Value::Integer(i128::from(n))).unwrap();
            prop_assert_eq!(decode_value(&token, &Kind::Integer).unwrap(), Value::Integer(i128::from(n)));
        }

        #[test]
        fn text_list_roundtrip(items in prop::collection::vec("[^,XaFS]{0,12}", 1..6)) {
            let value = Value::List {
                element_type: "text".into(),
                items: items.iter().cloned().map(Value::Text).collect(),
            };
            let token = encode_value(&value).unwrap();
            prop_assert_eq!(decode_value(&token, &text_list()).unwrap(), value);
        }
    }
}
