use std::num::NonZeroU64;

use field_core::{compress, encode_signed, modulus, FieldElement};

/// Hash world coordinates into a location identifier under the world key.
/// Never stored; always recomputed from (x, y, key).
pub fn location_id(x: i64, y: i64, key: &FieldElement) -> FieldElement {
    compress(&encode_signed(x), &encode_signed(y), key)
}

/// Threshold below which a location is eligible for an initialized planet.
/// Rarity 1 admits everything short of P itself; otherwise floor(P / rarity).
pub fn max_location_id(rarity: NonZeroU64) -> FieldElement {
    if rarity.get() == 1 {
        FieldElement::reduce(modulus() - 1u32)
    } else {
        FieldElement::reduce(modulus() / rarity.get())
    }
}

/// Strict comparison: an id equal to the threshold is not valid.
pub fn is_valid_location(x: i64, y: i64, key: &FieldElement, max: &FieldElement) -> bool {
    location_id(x, y, key) < *max
}
