//! Coherent value noise for the liquid flow field.
//!
//! Pure function of `(x, y, t)`: a hashed integer lattice, smoothstep-faded
//! and trilinearly interpolated.  No tables, no global state.

/// Sample 3D value noise.  Output lies in `[0, 1]`; neighbouring inputs give
/// neighbouring outputs.
pub fn value_noise(x: f32, y: f32, t: f32) -> f32 {
    let (ix, fx) = split(x);
    let (iy, fy) = split(y);
    let (it, ft) = split(t);

    let u = fade(fx);
    let v = fade(fy);
    let w = fade(ft);

    let c = |dx: i32, dy: i32, dt: i32| lattice(ix + dx, iy + dy, it + dt);

    let x00 = lerp(c(0, 0, 0), c(1, 0, 0), u);
    let x10 = lerp(c(0, 1, 0), c(1, 1, 0), u);
    let x01 = lerp(c(0, 0, 1), c(1, 0, 1), u);
    let x11 = lerp(c(0, 1, 1), c(1, 1, 1), u);

    let xy0 = lerp(x00, x10, v);
    let xy1 = lerp(x01, x11, v);

    lerp(xy0, xy1, w).clamp(0.0, 1.0)
}

fn split(v: f32) -> (i32, f32) {
    let f = v.floor();
    (f as i32, v - f)
}

/// Smoothstep; zero slope at lattice points keeps the field free of creases.
fn fade(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Lattice value in `[0, 1]`.
fn lattice(x: i32, y: i32, z: i32) -> f32 {
    let mut h: u32 = 0x2545_f491;
    h = h.wrapping_add(x as u32).wrapping_mul(0x9e37_79b9);
    h = h.wrapping_add(y as u32).wrapping_mul(0x85eb_ca6b);
    h = h.wrapping_add(z as u32).wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    (h >> 8) as f32 / (1u32 << 24) as f32
}
