//! Scalar helpers and the four-point interpolation kernels.
//!
//! The three slice kernels differ only in how out-of-range neighbor
//! indices are resolved: `interpolate_4_safe` folds an index back into
//! range once (cheap, assumes a small excursion), `interpolate_4_wrap`
//! takes true modulo (continuously cycling read positions), and
//! `interpolate_4_raw` trusts the caller.

use crate::sample::Sample;

/// Scales `x` from the range (`x_min`, `x_max`) to (`y_min`, `y_max`).
pub fn rescale(x: f32, x_min: f32, x_max: f32, y_min: f32, y_max: f32) -> f32 {
    y_min + (((x - x_min) * (y_max - y_min)) / (x_max - x_min))
}

/// Wraps `x` into `[lo, hi)` assuming at most one period of excursion.
pub fn wrap_once(x: i32, lo: i32, hi: i32) -> i32 {
    let r = hi - lo;
    if x >= lo {
        if x < hi {
            x
        } else {
            x - r
        }
    } else {
        x + r
    }
}

/// Wraps `x` into `[lo, hi)` by true modulo, for any excursion.
pub fn wrap_mod(x: i32, lo: i32, hi: i32) -> i32 {
    lo + (x - lo).rem_euclid(hi - lo)
}

/// Wraps a phase value to `[0, 1)`.
pub fn wrap_phase(x: f32) -> f32 {
    x - libm::floorf(x)
}

/// Splits a fractional read position into floor index and fraction.
/// The fraction is non-negative even for negative positions.
pub fn split_pos(pos: f32) -> (i32, f32) {
    let base = libm::floorf(pos);
    (base as i32, pos - base)
}

/// 2-point linear interpolation between `a` and `b`.
pub fn interpolate_2(frac: f32, a: Sample, b: Sample) -> Sample {
    a + (b - a) * frac
}

/// 4-point cubic interpolation across `a..d`, reading between `b` and `c`.
pub fn interpolate_4(frac: f32, a: Sample, b: Sample, c: Sample, d: Sample) -> Sample {
    b + frac
        * ((c - b)
            - 0.166_666_7
                * (1.0 - frac)
                * ((d - a - 3.0 * (c - b)) * frac + (d + 2.0 * a - 3.0 * b)))
}

/// 4-point interpolated read at `index + frac`. No bounds adjustment;
/// the caller guarantees `index-1..index+2` are in range.
pub fn interpolate_4_raw(buf: &[Sample], index: i32, frac: f32) -> Sample {
    interpolate_4(
        frac,
        buf[(index - 1) as usize],
        buf[index as usize],
        buf[(index + 1) as usize],
        buf[(index + 2) as usize],
    )
}

/// 4-point interpolated read at `index + frac`, folding each neighbor
/// index back into range once.
pub fn interpolate_4_safe(buf: &[Sample], index: i32, frac: f32) -> Sample {
    let n = buf.len() as i32;
    interpolate_4(
        frac,
        buf[wrap_once(index - 1, 0, n) as usize],
        buf[wrap_once(index, 0, n) as usize],
        buf[wrap_once(index + 1, 0, n) as usize],
        buf[wrap_once(index + 2, 0, n) as usize],
    )
}

/// 4-point interpolated read at `index + frac`, wrapping each neighbor
/// index modulo the slice length.
pub fn interpolate_4_wrap(buf: &[Sample], index: i32, frac: f32) -> Sample {
    let n = buf.len() as i32;
    interpolate_4(
        frac,
        buf[wrap_mod(index - 1, 0, n) as usize],
        buf[wrap_mod(index, 0, n) as usize],
        buf[wrap_mod(index + 1, 0, n) as usize],
        buf[wrap_mod(index + 2, 0, n) as usize],
    )
}
