/// Cubic smoothstep `t² · (3 − 2t)` on `t` clamped to `[0, 1]`.
///
/// Zero velocity at both ends, so the camera eases in and out of each move.
pub fn ease(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
