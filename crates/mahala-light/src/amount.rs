//! Fixed-point decimal amounts.
//!
//! Balances and dividends are held as integer base units so that snapshot
//! comparisons are exact. 1 MHL = 10^8 units.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of fractional digits carried by [`Amount`].
pub const AMOUNT_DECIMALS: u32 = 8;

/// Base units per whole MHL.
pub const UNITS_PER_MHL: u128 = 100_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,
    #[error("negative amount {0:?}")]
    Negative(String),
    #[error("malformed decimal {0:?}")]
    Malformed(String),
    #[error("amount {0:?} out of range")]
    Overflow(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_units(units: u128) -> Self {
        Amount(units)
    }

    pub const fn units(&self) -> u128 {
        self.0
    }

    /// Parse a non-negative decimal, optionally in exponent notation.
    ///
    /// Digits past [`AMOUNT_DECIMALS`] are truncated toward zero.
    pub fn parse_decimal(input: &str) -> Result<Self, AmountError> {
        if input.is_empty() {
            return Err(AmountError::Empty);
        }
        if input.starts_with('-') {
            return Err(AmountError::Negative(input.to_string()));
        }
        let malformed = || AmountError::Malformed(input.to_string());
        let overflow = || AmountError::Overflow(input.to_string());

        let (mantissa, exponent) = match input.find(|c: char| c == 'e' || c == 'E') {
            Some(i) => {
                let exp: i64 = input[i + 1..].parse().map_err(|_| malformed())?;
                (&input[..i], exp)
            }
            None => (input, 0),
        };

        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(malformed());
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(malformed());
        }

        let joined = format!("{}{}", int_part, frac_part);
        let digits = joined.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(Amount::ZERO);
        }

        // value = digits * 10^(exponent - frac_len); units = value * 10^DECIMALS.
        // Saturating ends are out of range either way: overflow above, zero below.
        let shift = exponent
            .saturating_add(AMOUNT_DECIMALS as i64)
            .saturating_sub(frac_part.len() as i64);
        if shift >= 0 {
            let shift = u32::try_from(shift).map_err(|_| overflow())?;
            let base: u128 = digits.parse().map_err(|_| overflow())?;
            let factor = 10u128.checked_pow(shift).ok_or_else(overflow)?;
            base.checked_mul(factor).map(Amount).ok_or_else(overflow)
        } else {
            let drop = usize::try_from(shift.unsigned_abs()).map_err(|_| overflow())?;
            if drop >= digits.len() {
                return Ok(Amount::ZERO);
            }
            digits[..digits.len() - drop]
                .parse()
                .map(Amount)
                .map_err(|_| overflow())
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:08}",
            self.0 / UNITS_PER_MHL,
            self.0 % UNITS_PER_MHL
        )
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse_decimal(s)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

/// Accepts a decimal string or any JSON number. Full nodes report balances as
/// floating point, so `f64` goes through its shortest decimal rendering.
impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Amount, D::Error> {
        struct AmountVisitor;

        impl<'de> de::Visitor<'de> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a non-negative decimal as a string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                Amount::parse_decimal(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Amount::parse_decimal(&v.to_string()).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                Amount::parse_decimal(&v.to_string()).map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
                if !v.is_finite() {
                    return Err(E::custom("non-finite amount"));
                }
                Amount::parse_decimal(&v.to_string()).map_err(E::custom)
            }
        }

        d.deserialize_any(AmountVisitor)
    }
}
