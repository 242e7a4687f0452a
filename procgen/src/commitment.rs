use field_core::{compress, FieldElement};

/// Commitment binding the generation parameters a client was built against.
///
/// Mutating requests carry this value so the remote program can reject
/// arguments computed under mismatched keys, length scale, or mirroring.
/// The composition is fixed: an inner compress of the two keys, then an
/// outer compress of the length scale and packed mirror flags keyed by the
/// inner digest.
pub fn config_hash(
    planethash_key: &FieldElement,
    spacetype_key: &FieldElement,
    length_scale: u32,
    mirror_x: bool,
    mirror_y: bool,
) -> FieldElement {
    let inner = compress(planethash_key, spacetype_key, &FieldElement::zero());
    let flags = ((mirror_x as u64) << 1) | mirror_y as u64;
    compress(
        &FieldElement::from(length_scale as u64),
        &FieldElement::from(flags),
        &inner,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fe(text: &str) -> FieldElement {
        FieldElement::from_decimal(text).unwrap()
    }

    #[test]
    fn config_hash_golden_vectors() {
        let planethash = FieldElement::from(1u64);
        let spacetype = FieldElement::from(2u64);
        assert_eq!(
            config_hash(&planethash, &spacetype, 16, true, false),
            fe("15968656743361407709426306812219148614502939893070175555933020607405424308219")
        );
        assert_eq!(
            config_hash(&planethash, &spacetype, 16, false, false),
            fe("17762623254825781283034759331757136465492207720474502173994898895651129031169")
        );
    }

    #[test]
    fn every_parameter_feeds_the_commitment() {
        let base = config_hash(&FieldElement::from(1u64), &FieldElement::from(2u64), 16, false, false);
        assert_ne!(
            base,
            config_hash(&FieldElement::from(3u64), &FieldElement::from(2u64), 16, false, false)
        );
        assert_ne!(
            base,
            config_hash(&FieldElement::from(1u64), &FieldElement::from(4u64), 16, false, false)
        );
        assert_ne!(
            base,
            config_hash(&FieldElement::from(1u64), &FieldElement::from(2u64), 32, false, false)
        );
        assert_ne!(
            base,
            config_hash(&FieldElement::from(1u64), &FieldElement::from(2u64), 16, false, true)
        );
    }
}
