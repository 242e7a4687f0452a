//! Caller-owned mirror context.
//!
//! There are no module-level singletons or ambient connections: callers
//! build a [`MirrorContext`] from configuration at startup and pass it to
//! every core function that needs generation parameters.

use std::num::NonZeroU64;

use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use field_core::{modulus, FieldElement};

use crate::reader::Address;

/// Serialized configuration for one world, as shipped alongside the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    pub contract_address: String,
    pub planethash_key: FieldElement,
    pub spacetype_key: FieldElement,
    pub length_scale: u32,
    pub mirror_x: bool,
    pub mirror_y: bool,
    pub rarity: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rarity must be nonzero")]
    ZeroRarity,
    #[error("length scale must be nonzero")]
    ZeroLengthScale,
}

/// Validated generation parameters plus derived thresholds.
#[derive(Debug, Clone)]
pub struct MirrorContext {
    pub address: Address,
    pub planethash_key: FieldElement,
    pub spacetype_key: FieldElement,
    pub length_scale: u32,
    pub mirror_x: bool,
    pub mirror_y: bool,
    pub rarity: NonZeroU64,
    pub max_location_id: FieldElement,
}

impl MirrorContext {
    pub fn new(config: MirrorConfig) -> Result<Self, ConfigError> {
        let rarity = NonZeroU64::new(config.rarity).ok_or(ConfigError::ZeroRarity)?;
        if config.length_scale == 0 {
            return Err(ConfigError::ZeroLengthScale);
        }
        Ok(Self {
            address: Address::new(config.contract_address),
            planethash_key: config.planethash_key,
            spacetype_key: config.spacetype_key,
            length_scale: config.length_scale,
            mirror_x: config.mirror_x,
            mirror_y: config.mirror_y,
            rarity,
            max_location_id: procgen::max_location_id(rarity),
        })
    }

    pub fn location_id(&self, x: i64, y: i64) -> FieldElement {
        procgen::location_id(x, y, &self.planethash_key)
    }

    pub fn is_valid_location(&self, x: i64, y: i64) -> bool {
        procgen::is_valid_location(x, y, &self.planethash_key, &self.max_location_id)
    }

    pub fn noise(&self, x: i64, y: i64) -> u32 {
        procgen::noise(
            x,
            y,
            &self.spacetype_key,
            self.length_scale,
            self.mirror_x,
            self.mirror_y,
        )
    }

    pub fn config_hash(&self) -> FieldElement {
        procgen::config_hash(
            &self.planethash_key,
            &self.spacetype_key,
            self.length_scale,
            self.mirror_x,
            self.mirror_y,
        )
    }
}

/// Result of checking local parameters against remote commitments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub config_matches: bool,
    pub configured_rarity: u64,
    /// Rarity re-derived from the remote eligibility threshold; None when the
    /// remote threshold is degenerate.
    pub derived_rarity: Option<u64>,
    /// Threshold to trust going forward (the remote one).
    pub effective_max_location_id: FieldElement,
}

/// Compare the local configuration commitment and rarity against the values
/// the remote program committed to. A rarity divergence warns and prefers
/// the value derived from the remote threshold.
pub fn check_consistency(
    context: &MirrorContext,
    remote_config_hash: &FieldElement,
    remote_max_location_id: &FieldElement,
) -> ConsistencyReport {
    let local = context.config_hash();
    let config_matches = local == *remote_config_hash;
    if !config_matches {
        tracing::warn!(
            target: "mirror::context",
            local = %local,
            remote = %remote_config_hash,
            "generation parameters do not match the remote commitment"
        );
    }

    let derived_rarity = if remote_max_location_id == &FieldElement::zero() {
        None
    } else {
        (modulus() / remote_max_location_id.raw()).to_u64()
    };
    if let Some(derived) = derived_rarity {
        if derived != context.rarity.get() {
            tracing::warn!(
                target: "mirror::context",
                configured = context.rarity.get(),
                derived,
                "rarity mismatch; preferring the value derived from the remote threshold"
            );
        }
    }

    ConsistencyReport {
        config_matches,
        configured_rarity: context.rarity.get(),
        derived_rarity,
        effective_max_location_id: remote_max_location_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MirrorConfig {
        MirrorConfig {
            contract_address: "0xabc".to_string(),
            planethash_key: FieldElement::from(1u64),
            spacetype_key: FieldElement::from(2u64),
            length_scale: 16,
            mirror_x: false,
            mirror_y: false,
            rarity: 64,
        }
    }

    #[test]
    fn context_derives_threshold_from_rarity() {
        let context = MirrorContext::new(config()).unwrap();
        assert_eq!(
            context.max_location_id,
            FieldElement::from_decimal(
                "342003794872488675347600089769644923258568193756500536620284440415247007744"
            )
            .unwrap()
        );
    }

    #[test]
    fn zero_rarity_is_rejected() {
        let mut bad = config();
        bad.rarity = 0;
        assert_eq!(MirrorContext::new(bad).unwrap_err(), ConfigError::ZeroRarity);
    }

    #[test]
    fn zero_length_scale_is_rejected() {
        let mut bad = config();
        bad.length_scale = 0;
        assert_eq!(
            MirrorContext::new(bad).unwrap_err(),
            ConfigError::ZeroLengthScale
        );
    }

    #[test]
    fn matching_commitments_report_clean() {
        let context = MirrorContext::new(config()).unwrap();
        let report = check_consistency(
            &context,
            &context.config_hash(),
            &context.max_location_id,
        );
        assert!(report.config_matches);
        assert_eq!(report.derived_rarity, Some(64));
    }

    #[test]
    fn divergent_rarity_prefers_remote_threshold() {
        let context = MirrorContext::new(config()).unwrap();
        let remote_max = procgen::max_location_id(NonZeroU64::new(128).unwrap());
        let report = check_consistency(&context, &context.config_hash(), &remote_max);
        assert_eq!(report.derived_rarity, Some(128));
        assert_eq!(report.effective_max_location_id, remote_max);
    }

    #[test]
    fn mismatched_commitment_is_flagged() {
        let context = MirrorContext::new(config()).unwrap();
        let report = check_consistency(
            &context,
            &FieldElement::from(1u64),
            &context.max_location_id,
        );
        assert!(!report.config_matches);
    }
}
