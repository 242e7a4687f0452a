//! Derived-argument builders for the write path.
//!
//! The transaction-submission layer never recomputes hashing logic; it takes
//! the exact ordered argument lists built here, each already carrying the
//! configuration commitment so the remote program can reject stale
//! parameters.

use field_core::{encode_signed, FieldElement};

use crate::context::MirrorContext;

/// Ordered arguments for revealing the coordinates of a location:
/// [location id, encoded x, encoded y, perlin value, config hash].
pub fn reveal_arguments(context: &MirrorContext, x: i64, y: i64) -> Vec<FieldElement> {
    vec![
        context.location_id(x, y),
        encode_signed(x),
        encode_signed(y),
        FieldElement::from(context.noise(x, y) as u64),
        context.config_hash(),
    ]
}

/// Ordered arguments for a move between two coordinates:
/// [origin id, destination id, destination perlin, max distance, config hash].
pub fn move_arguments(
    context: &MirrorContext,
    from: (i64, i64),
    to: (i64, i64),
) -> Vec<FieldElement> {
    vec![
        context.location_id(from.0, from.1),
        context.location_id(to.0, to.1),
        FieldElement::from(context.noise(to.0, to.1) as u64),
        FieldElement::from(max_distance(from, to)),
        context.config_hash(),
    ]
}

/// Smallest integer radius containing the move, ceil(sqrt(dx^2 + dy^2)).
fn max_distance(from: (i64, i64), to: (i64, i64)) -> u64 {
    let dx = (from.0 - to.0) as i128;
    let dy = (from.1 - to.1) as i128;
    let squared = (dx * dx + dy * dy) as u128;
    let root = isqrt(squared);
    if root * root == squared {
        root as u64
    } else {
        (root + 1) as u64
    }
}

/// Integer square root by Newton's method; floor(sqrt(n)).
fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut next = (x + 1) / 2;
    while next < x {
        x = next;
        next = (x + n / x) / 2;
    }
    x
}
