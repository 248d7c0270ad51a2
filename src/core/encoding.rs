//! XML Encoding Detection and Conversion
//!
//! Detects UTF-16 input from its BOM or byte pattern and converts it to
//! UTF-8. The configured encoding label is honoured when the bytes carry
//! no BOM.

use crate::error::{Error, ParseError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl XmlEncoding {
    /// Detect encoding from byte order mark or initial bytes
    pub fn detect(input: &[u8]) -> Self {
        match input {
            [0xFF, 0xFE, ..] | [b'<', 0x00, ..] => XmlEncoding::Utf16Le,
            [0xFE, 0xFF, ..] | [0x00, b'<', ..] => XmlEncoding::Utf16Be,
            _ => XmlEncoding::Utf8,
        }
    }

    /// Resolve a configured encoding label, `None` when unsupported
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => Some(XmlEncoding::Utf8),
            "UTF-16" | "UTF16" | "UTF-16LE" | "UTF16LE" => Some(XmlEncoding::Utf16Le),
            "UTF-16BE" | "UTF16BE" => Some(XmlEncoding::Utf16Be),
            _ => None,
        }
    }
}

/// Decode raw document bytes into UTF-8 text.
///
/// The UTF-8 BOM is stripped. Byte patterns that announce UTF-16 take
/// precedence over the configured label.
pub fn decode_input(input: Vec<u8>, label: &str) -> Result<String> {
    let configured =
        XmlEncoding::from_label(label).ok_or_else(|| Error::UnsupportedEncoding(label.to_string()))?;

    let encoding = match XmlEncoding::detect(&input) {
        XmlEncoding::Utf8 => configured,
        detected => detected,
    };

    match encoding {
        XmlEncoding::Utf8 => {
            let mut bytes = input;
            if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
                bytes.drain(..3);
            }
            String::from_utf8(bytes).map_err(|e| {
                let offset = e.utf8_error().valid_up_to();
                Error::Parse(ParseError::new(offset, "invalid UTF-8 sequence"))
            })
        }
        XmlEncoding::Utf16Le => decode_utf16(&input, [0xFF, 0xFE], u16::from_le_bytes),
        XmlEncoding::Utf16Be => decode_utf16(&input, [0xFE, 0xFF], u16::from_be_bytes),
    }
}

fn decode_utf16(input: &[u8], bom: [u8; 2], unit: fn([u8; 2]) -> u16) -> Result<String> {
    let bytes = input.strip_prefix(&bom[..]).unwrap_or(input);
    if bytes.len() % 2 != 0 {
        return Err(Error::Parse(ParseError::new(
            bytes.len(),
            "odd number of bytes in UTF-16 input",
        )));
    }

    let code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| unit([chunk[0], chunk[1]]))
        .collect();

    String::from_utf16(&code_units)
        .map_err(|_| Error::Parse(ParseError::new(0, "invalid UTF-16 sequence")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(XmlEncoding::detect(b"<root/>"), XmlEncoding::Utf8);
        assert_eq!(XmlEncoding::detect(&[0xEF, 0xBB, 0xBF, b'<']), XmlEncoding::Utf8);
        assert_eq!(XmlEncoding::detect(&[0xFF, 0xFE, b'<', 0x00]), XmlEncoding::Utf16Le);
        assert_eq!(XmlEncoding::detect(&[0xFE, 0xFF, 0x00, b'<']), XmlEncoding::Utf16Be);
        assert_eq!(XmlEncoding::detect(b""), XmlEncoding::Utf8);
    }

    #[test]
    fn test_labels() {
        assert_eq!(XmlEncoding::from_label("utf-8"), Some(XmlEncoding::Utf8));
        assert_eq!(XmlEncoding::from_label(" UTF-16BE "), Some(XmlEncoding::Utf16Be));
        assert_eq!(XmlEncoding::from_label("ISO-8859-1"), None);
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let text = decode_input(vec![0xEF, 0xBB, 0xBF, b'<', b'r', b'/', b'>'], "UTF-8").unwrap();
        assert_eq!(text, "<r/>");
    }

    #[test]
    fn test_convert_utf16_le() {
        let utf16_le = vec![0xFF, 0xFE, b'<', 0x00, b'r', 0x00, b'/', 0x00, b'>', 0x00];
        assert_eq!(decode_input(utf16_le, "UTF-8").unwrap(), "<r/>");
    }

    #[test]
    fn test_convert_utf16_be_by_label() {
        let utf16_be = vec![0x00, b'<', 0x00, b'r', 0x00, b'/', 0x00, b'>'];
        assert_eq!(decode_input(utf16_be, "UTF-16BE").unwrap(), "<r/>");
    }

    #[test]
    fn test_unsupported_label() {
        let err = decode_input(b"<r/>".to_vec(), "latin-1").unwrap_err();
        assert!(matches!(err, Error::UnsupportedEncoding(label) if label == "latin-1"));
    }

    #[test]
    fn test_invalid_utf8_reports_offset() {
        let err = decode_input(vec![b'<', b'r', 0xFF, b'>'], "UTF-8").unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError { offset: 2, .. })));
    }
}
