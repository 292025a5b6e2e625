//! ISO-8859-1 text and number encoding
//!
//! PDF syntax is byte oriented: every byte maps to the code point of the same
//! value. Numbers are written in the compact decimal form PDF producers use,
//! with the precision chosen per call.

use super::ByteAccumulator;
use crate::error::Result;

/// Decimal precision used when writing real numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Precision {
    /// Two fractional digits up to 32767, five below 1, whole numbers above.
    #[default]
    Default,
    /// Up to six fractional digits, trailing zeros dropped.
    High,
}

/// Decodes ISO-8859-1 bytes.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encodes `text` as ISO-8859-1, replacing unmappable characters with `?`.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Decimal representation of an integer.
pub fn int_bytes(value: i64) -> Vec<u8> {
    let mut acc = ByteAccumulator::with_capacity(20);
    // Twenty bytes hold every i64
    match prepend_int(value, &mut acc) {
        Ok(()) => acc.prepended().to_vec(),
        Err(_) => value.to_string().into_bytes(),
    }
}

/// Prepends the decimal representation of `value` to `acc`.
pub fn prepend_int(value: i64, acc: &mut ByteAccumulator) -> Result<()> {
    let mut magnitude = value.unsigned_abs();
    loop {
        acc.prepend_byte(b'0' + (magnitude % 10) as u8)?;
        magnitude /= 10;
        if magnitude == 0 {
            break;
        }
    }
    if value < 0 {
        acc.prepend_byte(b'-')?;
    }
    Ok(())
}

/// Decimal representation of a real number.
pub fn double_bytes(value: f64, precision: Precision) -> Vec<u8> {
    if precision == Precision::High {
        return high_precision(value);
    }
    let mut acc = ByteAccumulator::with_capacity(24);
    match prepend_double(value, &mut acc, Precision::Default) {
        Ok(()) => acc.prepended().to_vec(),
        Err(_) => high_precision(value),
    }
}

/// Prepends the decimal representation of `value` to `acc`.
pub fn prepend_double(value: f64, acc: &mut ByteAccumulator, precision: Precision) -> Result<()> {
    if precision == Precision::High {
        acc.prepend(&high_precision(value))?;
        return Ok(());
    }
    let mut d = if value.is_nan() {
        tracing::warn!("formatting NaN as 0");
        0.0
    } else {
        value
    };
    if d.abs() < 0.000015 {
        acc.prepend_byte(b'0')?;
        return Ok(());
    }
    let negative = d < 0.0;
    if negative {
        d = -d;
    }

    if d < 1.0 {
        d += 0.000005;
        if d >= 1.0 {
            acc.prepend_byte(b'1')?;
        } else {
            let mut fraction = (d * 100_000.0) as u32;
            let mut digits = 5;
            while digits > 0 && fraction % 10 == 0 {
                fraction /= 10;
                digits -= 1;
            }
            for _ in 0..digits {
                acc.prepend_byte(b'0' + (fraction % 10) as u8)?;
                fraction /= 10;
            }
            acc.prepend(b"0.")?;
        }
    } else if d <= 32767.0 {
        d += 0.005;
        let scaled = (d * 100.0) as u32;
        let fraction = scaled % 100;
        if fraction != 0 {
            if fraction % 10 == 0 {
                acc.prepend_byte(b'0' + (fraction / 10) as u8)?;
            } else {
                acc.prepend_byte(b'0' + (fraction % 10) as u8)?;
                acc.prepend_byte(b'0' + (fraction / 10) as u8)?;
            }
            acc.prepend_byte(b'.')?;
        }
        prepend_int(i64::from(scaled / 100), acc)?;
    } else {
        prepend_int((d + 0.5) as i64, acc)?;
    }

    if negative {
        acc.prepend_byte(b'-')?;
    }
    Ok(())
}

fn high_precision(value: f64) -> Vec<u8> {
    if value.is_nan() {
        tracing::warn!("formatting NaN as 0");
        return b"0".to_vec();
    }
    if value.abs() < 0.000001 {
        return b"0".to_vec();
    }
    let formatted = format!("{value:.6}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => b"0".to_vec(),
        other => other.as_bytes().to_vec(),
    }
}
