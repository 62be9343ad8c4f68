// Shared numeric helpers for the synthesis modules.

pub use std::f64::consts::TAU;

/// Linear interpolation with `t` clamped to [0, 1].
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    from + (to - from) * t
}

/// Bounces `t` back and forth between 0 and `length`.
pub fn ping_pong(t: f64, length: f64) -> f64 {
    let period = length * 2.0;
    let wrapped = t - (t / period).floor() * period;
    length - (wrapped - length).abs()
}
