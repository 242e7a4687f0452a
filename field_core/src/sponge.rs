//! Fixed-round sponge compression over the scalar field.
//!
//! This is the canonical 2-to-1 hash: a 220-round Feistel permutation with
//! exponent 5, absorbed twice. It must match the hash the remote program
//! evaluates inside its circuit value-for-value, so the round count, the
//! constant derivation, and the exponent are all load-bearing. Any edit here
//! must fail at least one golden vector below.

use std::sync::OnceLock;

use num_bigint::BigUint;

use crate::field::FieldElement;

/// Number of Feistel rounds in one permutation.
pub const ROUNDS: usize = 220;

const CONSTANT_SEED: &str = "mirror-sponge";

/// FNV-1a 64-bit over a byte string. Deterministic seed material for the
/// round-constant schedule; never used for hashing untrusted input.
fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut state = OFFSET_BASIS;
    for &byte in bytes {
        state ^= byte as u64;
        state = state.wrapping_mul(PRIME);
    }
    state
}

/// Round constants: c[0] = c[219] = 0, the rest derived from four FNV-1a
/// limbs over "mirror-sponge:{round}:{limb}" (limb 0 lowest) reduced mod P.
fn round_constants() -> &'static Vec<FieldElement> {
    static CONSTANTS: OnceLock<Vec<FieldElement>> = OnceLock::new();
    CONSTANTS.get_or_init(|| {
        (0..ROUNDS)
            .map(|round| {
                if round == 0 || round == ROUNDS - 1 {
                    return FieldElement::zero();
                }
                let mut value = BigUint::default();
                for limb in 0..4u32 {
                    let label = format!("{CONSTANT_SEED}:{round}:{limb}");
                    let piece = BigUint::from(fnv1a64(label.as_bytes()));
                    value |= piece << (64 * limb);
                }
                FieldElement::reduce(value)
            })
            .collect()
    })
}

fn feistel(
    mut left: FieldElement,
    mut right: FieldElement,
    key: &FieldElement,
) -> (FieldElement, FieldElement) {
    for constant in round_constants() {
        let t = key.add(&left).add(constant);
        let mixed = right.add(&t.pow5());
        right = left;
        left = mixed;
    }
    (left, right)
}

/// Canonical 2-to-1 compression: absorb `a`, permute, absorb `b`, permute,
/// squeeze the left lane.
pub fn compress(a: &FieldElement, b: &FieldElement, key: &FieldElement) -> FieldElement {
    let (left, right) = feistel(a.clone(), FieldElement::zero(), key);
    let (left, _right) = feistel(left.add(b), right, key);
    left
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::encode_signed;

    fn fe(text: &str) -> FieldElement {
        FieldElement::from_decimal(text).unwrap()
    }

    #[test]
    fn constant_schedule_is_fixed() {
        let constants = round_constants();
        assert_eq!(constants.len(), ROUNDS);
        assert_eq!(constants[0], FieldElement::zero());
        assert_eq!(constants[ROUNDS - 1], FieldElement::zero());
        assert_eq!(
            constants[1],
            fe("15444237751687779879467645461036213599149473039277271352058773255201388818846")
        );
        assert_eq!(
            constants[2],
            fe("11429733462345964612362716057607479697861231463715985938480945153864897811363")
        );
        assert_eq!(
            constants[100],
            fe("16074983690659909911770252131727904343410027696509809207107570019519235226989")
        );
        assert_eq!(
            constants[218],
            fe("3816630883311776996366140649376901149901070838454507875447955864653056009299")
        );
    }

    // Golden vectors. These pin the permutation; a change to the round count,
    // the exponent, or the constant schedule fails at least one of them.
    #[test]
    fn compress_golden_vectors() {
        let zero = FieldElement::zero();
        assert_eq!(
            compress(&zero, &zero, &zero),
            fe("9489521371073307103143391327081587536788860424605104049378126666183878184935")
        );
        assert_eq!(
            compress(
                &FieldElement::from(1u64),
                &FieldElement::from(2u64),
                &FieldElement::from(3u64)
            ),
            fe("987066191566525485772741668053652275188144288486017420352321496550435283465")
        );
        assert_eq!(
            compress(
                &encode_signed(-5),
                &FieldElement::from(42u64),
                &FieldElement::from(7u64)
            ),
            fe("16490616036716706130698077268106385508363967369679215024651038907781304074872")
        );
        assert_eq!(
            compress(
                &encode_signed(-1),
                &encode_signed(-2),
                &FieldElement::from(11u64)
            ),
            fe("21157660996687215966988249256154869572532831104476899752675674923464825870128")
        );
    }

    #[test]
    fn compress_is_deterministic() {
        let a = FieldElement::from(123u64);
        let b = encode_signed(-456);
        let key = FieldElement::from(789u64);
        assert_eq!(compress(&a, &b, &key), compress(&a, &b, &key));
    }

    #[test]
    fn compress_is_order_sensitive() {
        let a = FieldElement::from(1u64);
        let b = FieldElement::from(2u64);
        let key = FieldElement::zero();
        assert_ne!(compress(&a, &b, &key), compress(&b, &a, &key));
    }
}
