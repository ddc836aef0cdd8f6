use std::fmt::Write as _;

use crate::error::OuidexError;

pub const EUI48_LEN: usize = 6;
pub const EUI64_LEN: usize = 8;

pub const EUI48_HEX_LEN: usize = 2 * EUI48_LEN;
pub const EUI64_HEX_LEN: usize = 2 * EUI64_LEN;

// Longest accepted textual form: XX:XX:XX:XX:XX:XX:XX:XX.
const MAX_INPUT_LEN: usize = 23;

/// Parses an EUI-48 or EUI-64 string into its raw bytes.
///
/// Supported formats:
///
/// XXXXXXXXXXXX
/// XXXXXXXXXXXXXXXX
/// XX:XX:XX:XX:XX:XX
/// XX:XX:XX:XX:XX:XX:XX:XX
/// XX-XX-XX-XX-XX-XX
/// XX-XX-XX-XX-XX-XX-XX-XX
/// XXXX.XXXX.XXXX
/// XXXX.XXXX.XXXX.XXXX
pub fn parse_addr(s: &str) -> Result<Vec<u8>, OuidexError> {
    if s.len() < EUI48_HEX_LEN {
        return Err(OuidexError::AddrTooShort {
            input: s.to_string(),
        });
    }
    if s.len() > MAX_INPUT_LEN {
        return Err(OuidexError::AddrTooLong {
            input: s.to_string(),
        });
    }
    if !s.is_ascii() {
        return Err(OuidexError::AddrNotHex {
            input: s.to_string(),
            message: "input is not ASCII".to_string(),
        });
    }

    let bytes = s.as_bytes();
    if bytes[2] == b':' || bytes[2] == b'-' {
        parse_pairs(s, bytes[2])
    } else if bytes[4] == b'.' {
        parse_quads(s)
    } else {
        parse_bare(s)
    }
}

/// Uppercase hex rendition of raw address bytes; this is the trie query key.
pub fn hex_key(addr: &[u8]) -> String {
    let mut key = String::with_capacity(addr.len() * 2);
    for b in addr {
        let _ = write!(key, "{b:02X}");
    }
    key
}

fn parse_pairs(s: &str, sep: u8) -> Result<Vec<u8>, OuidexError> {
    if (s.len() + 1) % 3 != 0 {
        return Err(OuidexError::AddrUnbalanced {
            input: s.to_string(),
        });
    }
    let n = (s.len() + 1) / 3;
    if n != EUI48_LEN && n != EUI64_LEN {
        return Err(OuidexError::AddrUnexpectedLength {
            input: s.to_string(),
        });
    }

    let bytes = s.as_bytes();
    let mut addr = Vec::with_capacity(n);
    let mut i = 0;
    while i < s.len() {
        addr.push(hex_byte(s, &s[i..i + 2])?);
        if i + 2 < s.len() && bytes[i + 2] != sep {
            return Err(OuidexError::AddrUnbalanced {
                input: s.to_string(),
            });
        }
        i += 3;
    }
    Ok(addr)
}

fn parse_quads(s: &str) -> Result<Vec<u8>, OuidexError> {
    if (s.len() + 1) % 5 != 0 {
        return Err(OuidexError::AddrUnbalanced {
            input: s.to_string(),
        });
    }
    let n = 2 * (s.len() + 1) / 5;
    if n != EUI48_LEN && n != EUI64_LEN {
        return Err(OuidexError::AddrUnexpectedLength {
            input: s.to_string(),
        });
    }

    let bytes = s.as_bytes();
    let mut addr = Vec::with_capacity(n);
    let mut i = 0;
    while i < s.len() {
        addr.push(hex_byte(s, &s[i..i + 2])?);
        addr.push(hex_byte(s, &s[i + 2..i + 4])?);
        if i + 4 < s.len() && bytes[i + 4] != b'.' {
            return Err(OuidexError::AddrUnbalanced {
                input: s.to_string(),
            });
        }
        i += 5;
    }
    Ok(addr)
}

fn parse_bare(s: &str) -> Result<Vec<u8>, OuidexError> {
    if s.len() != EUI48_HEX_LEN && s.len() != EUI64_HEX_LEN {
        return Err(OuidexError::AddrUnexpectedLength {
            input: s.to_string(),
        });
    }
    let mut addr = Vec::with_capacity(s.len() / 2);
    let mut i = 0;
    while i < s.len() {
        addr.push(hex_byte(s, &s[i..i + 2])?);
        i += 2;
    }
    Ok(addr)
}

fn hex_byte(input: &str, pair: &str) -> Result<u8, OuidexError> {
    // from_str_radix alone would also admit signs like "+F".
    if pair.bytes().all(|b| b.is_ascii_hexdigit())
        && let Ok(value) = u8::from_str_radix(pair, 16)
    {
        return Ok(value);
    }
    Err(OuidexError::AddrNotHex {
        input: input.to_string(),
        message: format!("{pair:?} is not a hex byte"),
    })
}
