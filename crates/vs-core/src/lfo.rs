//! Wavetable LFO for modulated delay taps.
//!
//! Each oscillator owns its lookup table, built once at construction from
//! a shape generator. Rate is in cycles per sample.

use libm::{fabsf, sinf};

use core::f32::consts::TAU;

use crate::math::{interpolate_2, rescale, wrap_phase};
use crate::sample::Sample;

/// Oscillator shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
    Ramp,
}

/// Non-modifiable lookup table with linear-interpolated reads.
#[derive(Clone, Debug)]
pub struct LookupTable<const N: usize> {
    table: [Sample; N],
}

impl<const N: usize> LookupTable<N> {
    /// Build the table by calling `generator` with arguments 0 to 1
    /// inclusive, incrementing linearly.
    pub fn from_generator(generator: fn(Sample) -> Sample) -> Self {
        let mut table = [0.0; N];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = generator(i as Sample / (N - 1) as Sample);
        }
        Self { table }
    }

    /// Read at a normalized index in `[0, 1]`.
    pub fn read(&self, phase: Sample) -> Sample {
        let scaled = phase * (N - 1) as Sample;
        let index = scaled as usize;
        if index >= N - 1 {
            return self.table[N - 1];
        }
        interpolate_2(scaled - index as Sample, self.table[index], self.table[index + 1])
    }

    /// Read at any index, wrapped into `[0, 1)`.
    pub fn read_wrap(&self, phase: Sample) -> Sample {
        self.read(wrap_phase(phase))
    }
}

/// Low-frequency oscillator reading a wavetable of `N` entries.
#[derive(Clone, Debug)]
pub struct WavetableLfo<const N: usize> {
    rate: f32,
    phase: f32,
    offset: f32,
    table: LookupTable<N>,
}

/// The table size used throughout the toolkit.
pub type Lfo = WavetableLfo<128>;

impl<const N: usize> WavetableLfo<N> {
    /// Create an oscillator with a standard shape.
    pub fn new(waveform: Waveform, bipolar: bool) -> Self {
        Self::from_generator(shape_generator(waveform, bipolar))
    }

    /// Create an oscillator from an arbitrary shape generator.
    pub fn from_generator(generator: fn(Sample) -> Sample) -> Self {
        Self {
            rate: 0.0,
            phase: 0.0,
            offset: 0.0,
            table: LookupTable::from_generator(generator),
        }
    }

    /// Advance one sample and return the oscillator value.
    pub fn process(&mut self) -> Sample {
        self.phase = wrap_phase(self.phase + self.rate);
        self.table.read(self.phase)
    }

    /// Set rate in cycles per sample.
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
    }

    /// Jump to an absolute phase (plus the configured offset).
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = wrap_phase(phase + self.offset);
    }

    /// Re-anchor the phase offset without a discontinuity in raw phase.
    pub fn set_phase_offset(&mut self, offset: f32) {
        let raw_phase = wrap_phase(self.phase - self.offset);
        self.phase = wrap_phase(raw_phase + offset);
        self.offset = offset;
    }

    /// Current phase in `[0, 1)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }
}

fn shape_generator(waveform: Waveform, bipolar: bool) -> fn(Sample) -> Sample {
    if bipolar {
        match waveform {
            Waveform::Sine => |p| sinf(p * TAU),
            Waveform::Triangle => |p| {
                if p < 0.75 {
                    rescale(1.0 - 2.0 * fabsf(p - 0.25), 0.0, 1.0, -1.0, 1.0)
                } else {
                    rescale(2.0 * (p - 0.75), 0.0, 1.0, -1.0, 1.0)
                }
            },
            Waveform::Square => |p| if p < 0.5 { 1.0 } else { -1.0 },
            Waveform::Sawtooth => |p| rescale(p, 0.0, 1.0, 1.0, -1.0),
            Waveform::Ramp => |p| rescale(p, 0.0, 1.0, -1.0, 1.0),
        }
    } else {
        match waveform {
            Waveform::Sine => |p| rescale(sinf(p * TAU), -1.0, 1.0, 0.0, 1.0),
            Waveform::Triangle => |p| {
                if p < 0.75 {
                    1.0 - 2.0 * fabsf(p - 0.25)
                } else {
                    2.0 * (p - 0.75)
                }
            },
            Waveform::Square => |p| if p < 0.5 { 1.0 } else { 0.0 },
            Waveform::Sawtooth => |p| 1.0 - p,
            Waveform::Ramp => |p| p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_reads_endpoints() {
        let t = LookupTable::<64>::from_generator(|p| p);
        assert!((t.read(0.0) - 0.0).abs() < 1e-6);
        assert!((t.read(1.0) - 1.0).abs() < 1e-6);
        assert!((t.read(0.5) - 0.5).abs() < 1e-2);
    }

    #[test]
    fn bipolar_triangle_peaks() {
        let lfo = Lfo::new(Waveform::Triangle, true);
        assert!((lfo.table.read(0.25) - 1.0).abs() < 1e-2);
        assert!((lfo.table.read(0.75) - -1.0).abs() < 1e-2);
        assert!(lfo.table.read(0.0).abs() < 2e-2);
    }

    #[test]
    fn unipolar_stays_in_unit_range() {
        for wf in [
            Waveform::Sine,
            Waveform::Triangle,
            Waveform::Square,
            Waveform::Sawtooth,
            Waveform::Ramp,
        ] {
            let mut lfo = Lfo::new(wf, false);
            lfo.set_rate(0.013);
            for _ in 0..1000 {
                let v = lfo.process();
                assert!((0.0..=1.0).contains(&v), "{:?} produced {}", wf, v);
            }
        }
    }

    #[test]
    fn rate_advances_phase() {
        let mut lfo = Lfo::new(Waveform::Ramp, false);
        lfo.set_rate(0.25);
        lfo.process();
        assert!((lfo.phase() - 0.25).abs() < 1e-6);
        lfo.process();
        lfo.process();
        lfo.process();
        // Wrapped back around after one full cycle.
        assert!(lfo.phase() < 1e-6);
    }

    #[test]
    fn phase_offset_preserves_raw_phase() {
        let mut lfo = Lfo::new(Waveform::Sine, true);
        lfo.set_rate(0.1);
        lfo.process();
        lfo.process();
        let raw = lfo.phase();
        lfo.set_phase_offset(0.5);
        assert!((lfo.phase() - wrap_phase(raw + 0.5)).abs() < 1e-6);
    }
}
