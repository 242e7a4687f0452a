use field_core::{compress, encode_signed, FieldElement};

/// Upper bound of the noise range; outputs land in 0..=MAX_NOISE.
pub const MAX_NOISE: u32 = 32;

/// Fixed-point scale for interpolation, 6 decimal places.
const SCALE: i64 = 1_000_000;

const OCTAVES: u32 = 3;

/// 16 unit gradient directions at 22.5-degree steps, fixed point x1e6.
const GRADIENTS: [(i64, i64); 16] = [
    (1_000_000, 0),
    (923_880, 382_683),
    (707_107, 707_107),
    (382_683, 923_880),
    (0, 1_000_000),
    (-382_683, 923_880),
    (-707_107, 707_107),
    (-923_880, 382_683),
    (-1_000_000, 0),
    (-923_880, -382_683),
    (-707_107, -707_107),
    (-382_683, -923_880),
    (0, -1_000_000),
    (382_683, -923_880),
    (707_107, -707_107),
    (923_880, -382_683),
];

/// Multi-scale gradient noise classifying a coordinate, 0..=32.
///
/// Three octaves at `length_scale`, 2x, and 4x are averaged; each octave's
/// gradient field is seeded through the sponge so the value matches the
/// remote circuit. The mirror flags fold the coordinate across the origin on
/// the respective axis before evaluation:
/// `noise(x, y, .., true, false) == noise(-x, y, .., false, false)`.
pub fn noise(
    x: i64,
    y: i64,
    key: &FieldElement,
    length_scale: u32,
    mirror_x: bool,
    mirror_y: bool,
) -> u32 {
    let x = if mirror_x { -x } else { x };
    let y = if mirror_y { -y } else { y };

    let mut total: i64 = 0;
    for octave in 0..OCTAVES {
        // Widened before the shift; length_scale near u32::MAX must not wrap.
        total += single_scale(x, y, key, (length_scale as u64) << octave, octave);
    }
    let average = total / OCTAVES as i64;

    // Map roughly [-SCALE, SCALE] onto 0..=32, clamping the overshoot a
    // diagonal gradient can produce.
    let shifted = average + SCALE;
    let value = fixed_div(shifted as i128 * 16, SCALE as i128);
    value.clamp(0, MAX_NOISE as i128) as u32
}

/// One octave of gradient noise at a single cell size, fixed point.
fn single_scale(x: i64, y: i64, key: &FieldElement, scale: u64, octave: u32) -> i64 {
    let s = scale as i64;
    let cell_x = x.div_euclid(s);
    let cell_y = y.div_euclid(s);
    let frac_x = x - cell_x * s;
    let frac_y = y - cell_y * s;
    let tx = fixed_div(frac_x as i128 * SCALE as i128, s as i128) as i64;
    let ty = fixed_div(frac_y as i128 * SCALE as i128, s as i128) as i64;

    let seed = octave_seed(key, octave, scale);
    let mut dots = [0i64; 4];
    for (slot, (dx, dy)) in [(0i64, 0i64), (1, 0), (0, 1), (1, 1)].into_iter().enumerate() {
        let (gx, gy) = gradient(cell_x + dx, cell_y + dy, &seed);
        let off_x = (tx - dx * SCALE) as i128;
        let off_y = (ty - dy * SCALE) as i128;
        dots[slot] = fixed_div(gx as i128 * off_x + gy as i128 * off_y, SCALE as i128) as i64;
    }

    let u = fade(tx);
    let v = fade(ty);
    let bottom = lerp(dots[0], dots[1], u);
    let top = lerp(dots[2], dots[3], u);
    lerp(bottom, top, v)
}

/// Per-octave gradient field seed: compress(octave, scale, key).
fn octave_seed(key: &FieldElement, octave: u32, scale: u64) -> FieldElement {
    compress(
        &FieldElement::from(octave as u64),
        &FieldElement::from(scale),
        key,
    )
}

/// Gradient at a lattice corner: the sponge output mod 16 indexes the
/// direction table.
fn gradient(corner_x: i64, corner_y: i64, seed: &FieldElement) -> (i64, i64) {
    let hash = compress(&encode_signed(corner_x), &encode_signed(corner_y), seed);
    // 16 divides 2^64, so the lowest limb mod 16 equals the value mod 16.
    let index = (hash.raw().iter_u64_digits().next().unwrap_or(0) % 16) as usize;
    GRADIENTS[index]
}

/// Smoothstep 6t^5 - 15t^4 + 10t^3 for t in [0, SCALE].
fn fade(t: i64) -> i64 {
    let t = t as i128;
    let scale = SCALE as i128;
    let t2 = t * t / scale;
    let t3 = t2 * t / scale;
    let t4 = t3 * t / scale;
    let t5 = t4 * t / scale;
    (6 * t5 - 15 * t4 + 10 * t3) as i64
}

fn lerp(a: i64, b: i64, t: i64) -> i64 {
    a + fixed_div((b - a) as i128 * t as i128, SCALE as i128) as i64
}

/// i128 division truncating toward zero (the platform-independent choice the
/// rest of the fixed-point math assumes).
fn fixed_div(numerator: i128, denominator: i128) -> i128 {
    numerator / denominator
}
