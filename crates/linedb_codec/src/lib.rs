//! # LineDB Codec
//!
//! Text encoding of entity property values for LineDB.
//!
//! Every property of an entity is written as a single token inside a
//! record line. This crate owns the token format:
//!
//! - [`escape`] / [`unescape`]: the fixed escape table that keeps the
//!   record delimiters out of text tokens
//! - [`Value`] and [`Kind`]: decoded values and the semantic kinds that
//!   select their encoding
//! - [`encode_value`] / [`decode_value`]: token conversion
//! - [`FieldValue`]: conversion between Rust field types and [`Value`]
//!
//! ## Usage
//!
//! ```
//! use linedb_codec::{decode_value, encode_value, FieldValue, Kind, Value};
//!
//! let collectors = vec!["Adam".to_string(), "Ewa".to_string()];
//! let token = encode_value(&collectors.to_value().unwrap()).unwrap();
//! assert_eq!(token, "text,Adam,Ewa");
//!
//! let value = decode_value(&token, &Vec::<String>::kind()).unwrap();
//! assert_eq!(Vec::<String>::from_value(value).unwrap(), collectors);
//! ```
//!
//! ## Limitations
//!
//! List elements are separated by `,`, which the escape table does not
//! cover. A text element containing a comma splits into two elements on
//! load.
//!
//! Absent list elements have no token. A `Vec<Option<_>>` is written without
//! its `None` elements, so after a reload the remaining elements have moved
//! up and the list is shorter.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod calendar;
mod decoder;
mod encoder;
mod error;
mod escape;
mod field;
mod value;

pub use calendar::CalendarStamp;
pub use decoder::decode_value;
pub use encoder::encode_value;
pub use error::{CodecError, CodecResult};
pub use escape::{escape, unescape, DELIMITER_TOKENS, HASH_TOKEN};
pub use field::{symbol_from_value, symbol_to_value, FieldValue, Symbol};
pub use value::{Kind, Value};
