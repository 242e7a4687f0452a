use std::fmt;
use std::sync::OnceLock;

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Decimal form of the scalar field modulus P.
pub const MODULUS_DECIMAL: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

/// The field modulus P.
pub fn modulus() -> &'static BigUint {
    static MODULUS: OnceLock<BigUint> = OnceLock::new();
    MODULUS.get_or_init(|| {
        BigUint::parse_bytes(MODULUS_DECIMAL.as_bytes(), 10).expect("modulus literal parses")
    })
}

/// floor(P / 2); values above this decode as negative integers.
pub fn half_modulus() -> &'static BigUint {
    static HALF: OnceLock<BigUint> = OnceLock::new();
    HALF.get_or_init(|| modulus() / 2u32)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("invalid field element literal: {0:?}")]
    InvalidLiteral(String),
    #[error("field element magnitude exceeds i64 range")]
    SignedOverflow,
}

/// Integer in [0, P). Construction always reduces, so no representation can
/// hold a value >= P.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FieldElement(BigUint);

impl FieldElement {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn one() -> Self {
        Self(BigUint::one())
    }

    pub fn reduce(value: BigUint) -> Self {
        Self(value % modulus())
    }

    /// Parse a decimal string, reducing mod P. Snapshot transport carries
    /// every numeric value in this form.
    pub fn from_decimal(text: &str) -> Result<Self, FieldError> {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FieldError::InvalidLiteral(text.to_string()));
        }
        let value = BigUint::parse_bytes(text.as_bytes(), 10)
            .ok_or_else(|| FieldError::InvalidLiteral(text.to_string()))?;
        Ok(Self::reduce(value))
    }

    pub fn to_decimal(&self) -> String {
        self.0.to_str_radix(10)
    }

    /// Checked narrowing; None when the value does not fit.
    pub fn to_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }

    pub fn to_u128(&self) -> Option<u128> {
        self.0.to_u128()
    }

    pub fn raw(&self) -> &BigUint {
        &self.0
    }

    pub fn add(&self, rhs: &Self) -> Self {
        Self::reduce(&self.0 + &rhs.0)
    }

    /// x^5 mod P, the sponge round exponent.
    pub fn pow5(&self) -> Self {
        Self(self.0.modpow(&BigUint::from(5u32), modulus()))
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u128> for FieldElement {
    fn from(value: u128) -> Self {
        Self(BigUint::from(value))
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        FieldElement::from_decimal(&text).map_err(de::Error::custom)
    }
}

/// Wrap a signed integer into the field: negative v maps to P + v.
pub fn encode_signed(value: i64) -> FieldElement {
    if value >= 0 {
        FieldElement::from(value as u64)
    } else {
        FieldElement(modulus() - BigUint::from(value.unsigned_abs()))
    }
}

/// Inverse of [`encode_signed`]. Values above P/2 are the wrapped negatives;
/// anything whose magnitude does not fit i64 is an error (coordinates are
/// small compared to P, so this only trips on corrupt data).
pub fn decode_signed(value: &FieldElement) -> Result<i64, FieldError> {
    if value.0 <= *half_modulus() {
        value
            .0
            .to_i64()
            .ok_or(FieldError::SignedOverflow)
    } else {
        let magnitude = modulus() - &value.0;
        let magnitude = magnitude.to_u64().ok_or(FieldError::SignedOverflow)?;
        if magnitude > i64::MAX as u64 + 1 {
            return Err(FieldError::SignedOverflow);
        }
        Ok((magnitude as i64).wrapping_neg())
    }
}
