//! Base64 VLQ encoding used by the `mappings` field of v3 source maps.

use crate::SourceMapError;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const SHIFT: u32 = 5;
const CONTINUATION: u64 = 1 << SHIFT;
const MASK: u64 = CONTINUATION - 1;

/// Appends the base64 VLQ encoding of `value` to `out`.
pub fn encode(value: i64, out: &mut String) {
    // Sign goes in the lowest bit
    let mut vlq = if value < 0 {
        (value.unsigned_abs() << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = vlq & MASK;
        vlq >>= SHIFT;
        if vlq > 0 {
            digit |= CONTINUATION;
        }
        out.push(BASE64[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}

fn decode_digit(c: char) -> Result<u64, SourceMapError> {
    let value = match c {
        'A'..='Z' => c as u64 - 'A' as u64,
        'a'..='z' => c as u64 - 'a' as u64 + 26,
        '0'..='9' => c as u64 - '0' as u64 + 52,
        '+' => 62,
        '/' => 63,
        _ => return Err(SourceMapError::InvalidBase64(c)),
    };
    Ok(value)
}

/// Decodes every VLQ value in one `,`-free segment.
pub fn decode_segment(segment: &str) -> Result<Vec<i64>, SourceMapError> {
    let mut values = Vec::with_capacity(5);
    let mut accum: u64 = 0;
    let mut shift: u32 = 0;
    let mut pending = false;

    for c in segment.chars() {
        let digit = decode_digit(c)?;
        if shift >= 64 {
            return Err(SourceMapError::VlqOverflow);
        }
        accum |= (digit & MASK) << shift;
        if digit & CONTINUATION != 0 {
            shift += SHIFT;
            pending = true;
            continue;
        }

        let magnitude = (accum >> 1) as i64;
        values.push(if accum & 1 == 1 { -magnitude } else { magnitude });
        accum = 0;
        shift = 0;
        pending = false;
    }

    if pending {
        return Err(SourceMapError::UnterminatedVlq);
    }
    Ok(values)
}
