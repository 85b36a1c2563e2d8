// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Six-byte Pascal real numbers.
//!
//! Little-endian layout:
//!
//! | Byte | Content |
//! |---|---|
//! | 0 | biased exponent (bias 129, 0 means zero) |
//! | 1..=4 | mantissa bits 0..32 |
//! | 5 | bit 7 sign, bits 0..7 mantissa bits 32..39 |
//!
//! The big-endian layout is the byte reversal. The mantissa has an implicit
//! leading one, so a value is `±2^(e-129) · (1 + m/2^39)`.

use crate::error::PackError;
use crate::format::ByteOrder;

/// Packed width of a Pascal real.
pub const PASCAL_REAL_SIZE: usize = 6;

const BIAS: i32 = 129;
const MANTISSA_BITS: i32 = 39;
const MANTISSA_MASK: u64 = (1 << 39) - 1;
/// Bits dropped when narrowing an IEEE double mantissa to 39 bits.
const NARROWING: u32 = 13;

/// Exact power of two for exponents inside the normal double range.
#[allow(clippy::cast_sign_loss)]
fn pow2(exp: i32) -> f64 {
    f64::from_bits(((exp + 1023) as u64) << 52)
}

fn to_little(raw: [u8; PASCAL_REAL_SIZE], order: ByteOrder) -> [u8; PASCAL_REAL_SIZE] {
    match order {
        ByteOrder::Little => raw,
        ByteOrder::Big => {
            let mut le = raw;
            le.reverse();
            le
        }
    }
}

/// Decodes a Pascal real stored in the given byte order.
#[allow(clippy::cast_precision_loss)]
pub fn decode_pascal_real(raw: [u8; PASCAL_REAL_SIZE], order: ByteOrder) -> f64 {
    let p = to_little(raw, order);
    let negative = p[5] & 0x80 != 0;
    if p[0] == 0 {
        return if negative { -0.0 } else { 0.0 };
    }

    let low = u64::from(u32::from_le_bytes([p[1], p[2], p[3], p[4]]));
    let mantissa = (u64::from(p[5] & 0x7f) << 32) | low;
    // mantissa < 2^39, so the conversion is exact.
    let fraction = 1.0 + mantissa as f64 * pow2(-MANTISSA_BITS);
    let magnitude = fraction * pow2(i32::from(p[0]) - BIAS);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Encodes a double as a Pascal real in the given byte order.
///
/// The mantissa is rounded to the nearest 39-bit value. Magnitudes below
/// the smallest representable number become zero; finite values above the
/// largest one and infinities saturate to the largest magnitude.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn encode_pascal_real(value: f64, order: ByteOrder) -> Result<[u8; PASCAL_REAL_SIZE], PackError> {
    if value.is_nan() {
        return Err(PackError::NotRepresentable);
    }
    let sign = if value.is_sign_negative() { 0x80 } else { 0x00 };
    let zero = [0, 0, 0, 0, 0, sign];
    let saturated = [0xff, 0xff, 0xff, 0xff, 0xff, 0x7f | sign];

    let bits = value.abs().to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let le = if biased == 0 {
        zero
    } else if value.is_infinite() {
        saturated
    } else {
        let mut power = biased - 1023;
        let mut mantissa = ((bits & ((1 << 52) - 1)) + (1 << (NARROWING - 1))) >> NARROWING;
        if mantissa > MANTISSA_MASK {
            mantissa = 0;
            power += 1;
        }
        let exponent = power + BIAS;
        if exponent < 1 {
            zero
        } else if exponent > 255 {
            saturated
        } else {
            let m = mantissa.to_le_bytes();
            [exponent as u8, m[0], m[1], m[2], m[3], (m[4] & 0x7f) | sign]
        }
    };

    Ok(to_little(le, order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn encodes_known_vectors_little_endian() {
        let cases: [(f64, [u8; 6]); 6] = [
            (1.0, [0x81, 0, 0, 0, 0, 0]),
            (2.0, [0x82, 0, 0, 0, 0, 0]),
            (-2.0, [0x82, 0, 0, 0, 0, 0x80]),
            (1234.5, [0x8b, 0, 0, 0, 0x50, 0x1a]),
            (12345678901.0, [0xa2, 0x40, 0x0d, 0x07, 0xf7, 0x37]),
            (2.938735877055719e-39, [0x01, 0, 0, 0, 0, 0]),
        ];
        for (value, bytes) in cases {
            assert_eq!(encode_pascal_real(value, ByteOrder::Little).unwrap(), bytes, "{value}");
        }
    }

    #[test]
    fn big_endian_is_reversed() {
        let le = encode_pascal_real(12345678901.0, ByteOrder::Little).unwrap();
        let mut be = encode_pascal_real(12345678901.0, ByteOrder::Big).unwrap();
        be.reverse();
        assert_eq!(le, be);
    }

    #[test]
    fn zero_exponent_decodes_to_signed_zero() {
        let plus = decode_pascal_real([0, 0x12, 0x34, 0, 0, 0x55], ByteOrder::Little);
        let minus = decode_pascal_real([0, 0x12, 0x34, 0, 0, 0xd5], ByteOrder::Little);
        assert_eq!(plus, 0.0);
        assert!(plus.is_sign_positive());
        assert_eq!(minus, 0.0);
        assert!(minus.is_sign_negative());
    }

    #[test]
    fn saturates_out_of_range() {
        let max = encode_pascal_real(1e300, ByteOrder::Little).unwrap();
        assert_eq!(max, [0xff, 0xff, 0xff, 0xff, 0xff, 0x7f]);
        let neg = encode_pascal_real(f64::NEG_INFINITY, ByteOrder::Little).unwrap();
        assert_eq!(neg, [0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(decode_pascal_real(max, ByteOrder::Little), 1.7014118346031449e+38);
    }

    #[test]
    fn underflow_becomes_zero() {
        let raw = encode_pascal_real(1e-60, ByteOrder::Little).unwrap();
        assert_eq!(decode_pascal_real(raw, ByteOrder::Little), 0.0);
    }

    #[test]
    fn nan_is_rejected() {
        assert_eq!(
            encode_pascal_real(f64::NAN, ByteOrder::Big).unwrap_err(),
            PackError::NotRepresentable
        );
    }

    #[test]
    fn rounding_carry_bumps_exponent() {
        // 2 - 2^-45 rounds up to exactly 2.
        let value = 2.0 - pow2(-45);
        let raw = encode_pascal_real(value, ByteOrder::Little).unwrap();
        assert_eq!(raw, [0x82, 0, 0, 0, 0, 0]);
    }
}
