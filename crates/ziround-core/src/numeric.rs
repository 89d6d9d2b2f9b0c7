//! Scalar helpers shared by the rounding components.

/// Distance from `v` to the nearest integer, `min(v - floor(v), ceil(v) - v)`.
pub fn fractionality(v: f64) -> f64 {
    let down = v - v.floor();
    down.min(1.0 - down)
}

pub fn is_integral_value(v: f64, tol: f64) -> bool {
    fractionality(v) <= tol
}

/// Snaps `v` onto the nearest integer if it is within `tol` of it.
pub fn snap(v: f64, tol: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() <= tol { r } else { v }
}
