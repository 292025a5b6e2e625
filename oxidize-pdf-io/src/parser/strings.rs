//! Decoding of raw string token bytes

use crate::bytes::ByteAccumulator;

/// Resolves the raw bytes of a string token into the string's value.
///
/// Hex strings turn digit pairs into bytes; an odd final digit supplies the
/// high nibble of the last byte. Literal strings have their backslash
/// escapes resolved and bare CR or CRLF normalized to LF.
pub fn decode_string_content(content: &[u8], hex: bool) -> Vec<u8> {
    if hex {
        decode_hex(content)
    } else {
        decode_literal(content)
    }
}

fn hex_digit(byte: u8) -> u8 {
    ByteAccumulator::hex_value(byte).unwrap_or(0)
}

fn decode_hex(content: &[u8]) -> Vec<u8> {
    content
        .chunks(2)
        .map(|pair| match *pair {
            [high, low] => (hex_digit(high) << 4) | hex_digit(low),
            [high] => hex_digit(high) << 4,
            _ => 0,
        })
        .collect()
}

fn is_octal(byte: u8) -> bool {
    matches!(byte, b'0'..=b'7')
}

fn decode_literal(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    let mut i = 0;
    while i < content.len() {
        let ch = content[i];
        i += 1;
        match ch {
            b'\\' => {
                let Some(&escaped) = content.get(i) else {
                    break;
                };
                i += 1;
                let value = match escaped {
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'b' => 0x08,
                    b'f' => 0x0c,
                    b'\r' => {
                        // Line continuation
                        if content.get(i) == Some(&b'\n') {
                            i += 1;
                        }
                        continue;
                    }
                    b'\n' => continue,
                    b'0'..=b'7' => {
                        let mut octal = u32::from(escaped - b'0');
                        for _ in 0..2 {
                            match content.get(i) {
                                Some(&digit) if is_octal(digit) => {
                                    octal = (octal << 3) + u32::from(digit - b'0');
                                    i += 1;
                                }
                                _ => break,
                            }
                        }
                        (octal & 0xff) as u8
                    }
                    other => other,
                };
                out.push(value);
            }
            b'\r' => {
                if content.get(i) == Some(&b'\n') {
                    i += 1;
                }
                out.push(b'\n');
            }
            other => out.push(other),
        }
    }
    out
}
