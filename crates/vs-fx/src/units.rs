//! Millisecond-to-sample conversions for the topology tuning tables.

use vs_core::MAX_SAMPLE_RATE;

/// Storage capacity for a delay of `us` microseconds at the highest
/// supported sample rate. One sample of headroom absorbs rounding.
pub(crate) const fn cap_us(us: u64) -> usize {
    (us as usize * MAX_SAMPLE_RATE) / 1_000_000 + 1
}

/// Active delay length for `ms` milliseconds at the runtime sample rate.
pub(crate) fn samples_ms(ms: f32, sample_rate: f32) -> usize {
    let n = (ms * sample_rate / 1000.0) as usize;
    if n == 0 {
        1
    } else {
        n
    }
}
