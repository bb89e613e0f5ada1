//! Text encodings for the data file.

use crate::error::{CoreError, CoreResult};

/// Character encoding used to read and write the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8.
    #[default]
    Utf8,
    /// ISO-8859-1. Every byte is one character.
    Latin1,
}

impl TextEncoding {
    /// Encodes text for writing.
    ///
    /// Fails if a character has no representation in this encoding.
    pub fn encode(self, text: &str) -> CoreResult<Vec<u8>> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| {
                        CoreError::encoding(format!("{c:?} cannot be written as Latin-1"))
                    })
                })
                .collect(),
        }
    }

    /// Decodes bytes that were read from the data file.
    pub fn decode(self, bytes: &[u8]) -> CoreResult<String> {
        match self {
            Self::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| CoreError::encoding(format!("invalid UTF-8: {e}"))),
            Self::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    /// Returns the encoding's conventional name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Latin1 => "ISO-8859-1",
        }
    }
}

impl std::str::FromStr for TextEncoding {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "iso-8859-1" | "latin-1" | "latin1" => Ok(Self::Latin1),
            other => Err(CoreError::encoding(format!("unknown encoding {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_passes_through() {
        let bytes = TextEncoding::Utf8.encode("Zażółć").unwrap();
        assert_eq!(TextEncoding::Utf8.decode(&bytes).unwrap(), "Zażółć");
    }

    #[test]
    fn utf8_rejects_invalid_bytes() {
        assert!(TextEncoding::Utf8.decode(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn latin1_maps_bytes_to_chars() {
        let bytes = TextEncoding::Latin1.encode("café").unwrap();
        assert_eq!(bytes, vec![b'c', b'a', b'f', 0xe9]);
        assert_eq!(TextEncoding::Latin1.decode(&bytes).unwrap(), "café");
    }

    #[test]
    fn latin1_rejects_wide_chars() {
        assert!(matches!(
            TextEncoding::Latin1.encode("łódź"),
            Err(CoreError::Encoding { .. })
        ));
    }

    #[test]
    fn parse_names() {
        assert_eq!("UTF-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("latin1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert!("ebcdic".parse::<TextEncoding>().is_err());
    }
}
