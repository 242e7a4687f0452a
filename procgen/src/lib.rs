//! Deterministic procedural generation over the field hash.
//!
//! Location identifiers, the multi-scale noise used to classify coordinates,
//! and the configuration commitment are all expressed as compositions of the
//! sponge in [`field_core`], so they reproduce the remote program's values
//! exactly. No floating point anywhere; noise interpolation runs in i128
//! fixed point.

mod commitment;
mod location;
mod perlin;

pub use commitment::config_hash;
pub use location::{is_valid_location, location_id, max_location_id};
pub use perlin::{noise, MAX_NOISE};
