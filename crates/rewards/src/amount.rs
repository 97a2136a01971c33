// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Exact decimal token amounts.

use std::{fmt, str::FromStr};

use alloy_primitives::{
    utils::{parse_units, ParseUnits},
    U256,
};
use ruint::{aliases::U512, UintTryFrom};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    error::AmountError,
    units::{AMOUNT_PER_GWEI, AMOUNT_PER_WEI, AMOUNT_SCALE},
};

/// A non-negative token amount with 36 fractional decimal digits of working precision.
///
/// The fractional resolution is 10^-36, about 120 bits; the integer part has the remaining
/// range of a U256. Amounts are displayed, and converted to wei, at 18 fractional digits. All
/// monetary arithmetic goes through this type (or through plain wei integers), never through
/// floating point. Products and quotients are computed with 512-bit intermediates and truncated
/// at the 36th digit, so every result rounds toward zero: `1 / 3 * 3` converts to one wei less
/// than a whole token.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(U256);

impl Amount {
    /// Number of fractional digits in the display form and in wei conversions.
    pub const DECIMALS: u8 = 18;
    /// Number of fractional digits kept during arithmetic.
    pub const WORKING_DECIMALS: u8 = 36;

    pub const ZERO: Self = Self(U256::ZERO);

    /// Construct an amount of whole tokens.
    pub fn from_integer(value: u64) -> Self {
        // Cannot overflow: u64::MAX * 10^36 < 2^256.
        Self(U256::from(value) * AMOUNT_SCALE)
    }

    /// Construct an amount from wei (10^-18 of a token). Exact.
    pub fn from_wei(wei: U256) -> Result<Self, AmountError> {
        wei.checked_mul(AMOUNT_PER_WEI).map(Self).ok_or(AmountError::Overflow("from_wei"))
    }

    /// Construct an amount from gwei (10^-9 of a token). Exact.
    pub fn from_gwei(gwei: U256) -> Result<Self, AmountError> {
        gwei.checked_mul(AMOUNT_PER_GWEI).map(Self).ok_or(AmountError::Overflow("from_gwei"))
    }

    /// Convert to wei, truncating digits beyond the 18th.
    pub fn to_wei(&self) -> U256 {
        self.0 / AMOUNT_PER_WEI
    }

    /// Convert to gwei, truncating digits beyond the 9th.
    pub fn to_gwei(&self) -> U256 {
        self.0 / AMOUNT_PER_GWEI
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.is_zero()
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, AmountError> {
        self.0.checked_add(rhs.0).map(Self).ok_or(AmountError::Overflow("addition"))
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, AmountError> {
        self.0.checked_sub(rhs.0).map(Self).ok_or(AmountError::Underflow)
    }

    pub fn checked_mul(self, rhs: Self) -> Result<Self, AmountError> {
        let product = widen(self.0).wrapping_mul(widen(rhs.0)) / widen(AMOUNT_SCALE);
        narrow(product).map(Self).ok_or(AmountError::Overflow("multiplication"))
    }

    pub fn checked_div(self, rhs: Self) -> Result<Self, AmountError> {
        if rhs.is_zero() {
            return Err(AmountError::DivisionByZero);
        }
        let quotient = widen(self.0).wrapping_mul(widen(AMOUNT_SCALE)) / widen(rhs.0);
        narrow(quotient).map(Self).ok_or(AmountError::Overflow("division"))
    }
}

fn widen(value: U256) -> U512 {
    U512::from(value)
}

fn narrow(value: U512) -> Option<U256> {
    U256::uint_try_from(value).ok()
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let integer = self.0 / AMOUNT_SCALE;
        let fraction = ((self.0 % AMOUNT_SCALE) / AMOUNT_PER_WEI).to_string();
        write!(f, "{integer}.{fraction:0>width$}", width = Self::DECIMALS as usize)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({self})")
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = parse_units(trimmed, Self::WORKING_DECIMALS)
            .map_err(|e| AmountError::Parse(trimmed.to_string(), e.to_string()))?;
        match parsed {
            ParseUnits::U256(value) => Ok(Self(value)),
            ParseUnits::I256(value) if value.is_negative() => {
                Err(AmountError::Negative(trimmed.to_string()))
            }
            ParseUnits::I256(value) => Ok(Self(value.into_raw())),
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> de::Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a non-negative decimal amount")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        if v.trim().is_empty() {
            return Ok(Amount::ZERO);
        }
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount::from_integer(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        u64::try_from(v)
            .map(Amount::from_integer)
            .map_err(|_| E::custom(AmountError::Negative(v.to_string())))
    }

    // NOTE: Rust renders floats with the shortest decimal that round-trips, which recovers the
    // literal written in a YAML or JSON document (e.g. 0.0088235294).
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        if !v.is_finite() {
            return Err(E::custom(AmountError::Parse(v.to_string(), "not finite".to_string())));
        }
        format!("{v}").parse().map_err(E::custom)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::ZERO)
    }

    fn visit_none<E: de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::ZERO)
    }
}
