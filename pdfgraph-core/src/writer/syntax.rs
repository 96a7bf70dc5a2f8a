//! Token encodings for names, strings and numbers.

use crate::error::{PdfError, Result};

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// `/Name` with `#xx` escapes for delimiters, `#` and bytes outside `!`..`~`.
pub(crate) fn encode_name(name: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(name.len() + 1);
    out.push(b'/');
    for &b in name.as_bytes() {
        if b == b'#' || is_delimiter(b) || !(0x21..=0x7E).contains(&b) {
            out.extend_from_slice(format!("#{b:02X}").as_bytes());
        } else {
            out.push(b);
        }
    }
    out
}

/// Literal `(...)` for mostly printable text, hex `<...>` otherwise.
pub(crate) fn encode_string(bytes: &[u8]) -> Vec<u8> {
    let printable = bytes
        .iter()
        .filter(|b| (0x20..0x7F).contains(*b) || matches!(b, b'\n' | b'\r' | b'\t'))
        .count();

    if bytes.is_empty() || printable * 10 >= bytes.len() * 9 {
        encode_literal(bytes)
    } else {
        encode_hex(bytes)
    }
}

fn encode_literal(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(b'(');
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x20..=0x7E => out.push(b),
            _ => out.extend_from_slice(format!("\\{b:03o}").as_bytes()),
        }
    }
    out.push(b')');
    out
}

pub(crate) fn encode_hex(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 2 + 2);
    out.push(b'<');
    for b in bytes {
        out.extend_from_slice(format!("{b:02x}").as_bytes());
    }
    out.push(b'>');
    out
}

/// Fixed-point real with trailing zeros trimmed. Readers do not accept
/// exponents, NaN or infinities.
pub(crate) fn format_real(value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(PdfError::InvalidStructure(format!(
            "real number {value} cannot be written"
        )));
    }
    let formatted = format!("{value:.6}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    Ok(match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    })
}
