//! Four-line feedback delay network.
//!
//! Four independently damped delay lines are mixed through a Hadamard
//! butterfly and re-injected; one global decay gain controls the
//! reverberation time. Line lengths are mutually incommensurate to avoid
//! modal buildup.

use vs_core::{FilterMode, OnePole, Sample};
use vs_dsp::Delay;

use crate::units::{cap_us, samples_ms};

pub struct Fdn4 {
    dampening: [OnePole; 4],
    decay: f32,
    sample_rate: f32,

    delay1: Delay<{ cap_us(58_644) }>,
    delay2: Delay<{ cap_us(69_433) }>,
    delay3: Delay<{ cap_us(74_524) }>,
    delay4: Delay<{ cap_us(86_125) }>,

    matrix_in: [Sample; 4],
    matrix_out: [Sample; 4],
}

impl Fdn4 {
    pub fn new(sample_rate: f32) -> Self {
        let mut fdn = Self {
            dampening: [
                OnePole::new(FilterMode::Lowpass, 6500.0 / sample_rate),
                OnePole::new(FilterMode::Lowpass, 6500.0 / sample_rate),
                OnePole::new(FilterMode::Lowpass, 6500.0 / sample_rate),
                OnePole::new(FilterMode::Lowpass, 6500.0 / sample_rate),
            ],
            decay: 0.0,
            sample_rate,
            delay1: Delay::default(),
            delay2: Delay::default(),
            delay3: Delay::default(),
            delay4: Delay::default(),
            matrix_in: [0.0; 4],
            matrix_out: [0.0; 4],
        };
        fdn.delay1.set_length(samples_ms(58.6435, sample_rate));
        fdn.delay2.set_length(samples_ms(69.4325, sample_rate));
        fdn.delay3.set_length(samples_ms(74.5234, sample_rate));
        fdn.delay4.set_length(samples_ms(86.1244, sample_rate));
        fdn
    }

    /// Dampening cutoff in Hz, applied to all four lines.
    pub fn set_dampening(&mut self, hz: f32) {
        for filter in &mut self.dampening {
            filter.set_cutoff(hz / self.sample_rate);
        }
    }

    /// Global decay, 0 to 1. The butterfly applies it twice per pass, so
    /// the stored value is halved to keep the loop gain below unity.
    pub fn set_decay(&mut self, decay: f32) {
        self.decay = decay * 0.5;
    }

    pub fn process(&mut self, in_l: Sample, in_r: Sample) -> (Sample, Sample) {
        // Delay lines.
        self.matrix_in[0] = self.delay1.read();
        self.matrix_in[1] = self.delay2.read();
        self.matrix_in[2] = self.delay3.read();
        self.matrix_in[3] = self.delay4.read();
        self.delay1.write(self.matrix_out[0]);
        self.delay2.write(self.matrix_out[1]);
        self.delay3.write(self.matrix_out[2]);
        self.delay4.write(self.matrix_out[3]);
        // Dampening.
        for (line, filter) in self.matrix_in.iter_mut().zip(self.dampening.iter_mut()) {
            *line = filter.process(*line);
        }
        // Input injection: left into lines 0/1, right into lines 2/3.
        self.matrix_in[0] += in_l;
        self.matrix_in[1] += in_l;
        self.matrix_in[2] += in_r;
        self.matrix_in[3] += in_r;
        // Hadamard butterfly.
        let m1 = self.matrix_in[0] * self.decay + self.matrix_in[1] * self.decay;
        let m2 = self.matrix_in[0] * self.decay - self.matrix_in[1] * self.decay;
        let m3 = self.matrix_in[2] * self.decay + self.matrix_in[3] * self.decay;
        let m4 = self.matrix_in[2] * self.decay - self.matrix_in[3] * self.decay;
        self.matrix_out[0] = m1 + m3;
        self.matrix_out[1] = m2 + m4;
        self.matrix_out[2] = m1 - m3;
        self.matrix_out[3] = m2 - m4;

        (
            self.matrix_in[0] * self.decay,
            self.matrix_in[1] * self.decay,
        )
    }

    /// Process a stereo block; length is the shortest of the four views.
    pub fn process_block(
        &mut self,
        in_l: &[Sample],
        in_r: &[Sample],
        out_l: &mut [Sample],
        out_r: &mut [Sample],
    ) {
        let n = in_l
            .len()
            .min(in_r.len())
            .min(out_l.len())
            .min(out_r.len());
        for i in 0..n {
            let (l, r) = self.process(in_l[i], in_r[i]);
            out_l[i] = l;
            out_r[i] = r;
        }
    }

    /// Process a fixed-size stereo block.
    pub fn process_for<const N: usize>(
        &mut self,
        in_l: &[Sample; N],
        in_r: &[Sample; N],
        out_l: &mut [Sample; N],
        out_r: &mut [Sample; N],
    ) {
        for i in 0..N {
            let (l, r) = self.process(in_l[i], in_r[i]);
            out_l[i] = l;
            out_r[i] = r;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn energy(samples: &[Sample]) -> f32 {
        samples.iter().map(|s| s * s).sum()
    }

    #[test]
    fn impulse_tail_decays_below_unity_decay() {
        let mut fdn = Fdn4::new(48_000.0);
        fdn.set_decay(0.8);
        fdn.set_dampening(6_500.0);
        let mut left = Vec::new();
        for n in 0..192_000 {
            let (l, _) = fdn.process(if n == 0 { 1.0 } else { 0.0 }, 0.0);
            left.push(l);
        }
        assert!(energy(&left) > 0.0);
        let head = energy(&left[..48_000]);
        let tail = energy(&left[144_000..]);
        assert!(tail < head * 0.5, "head {} tail {}", head, tail);
        assert!(left.iter().all(|s| s.abs() < 10.0));
    }

    #[test]
    fn zero_decay_is_silent_after_injection() {
        let mut fdn = Fdn4::new(48_000.0);
        fdn.set_decay(0.0);
        for n in 0..10_000 {
            let (l, r) = fdn.process(if n == 0 { 1.0 } else { 0.0 }, 0.0);
            assert_eq!(l, 0.0, "at {}", n);
            assert_eq!(r, 0.0, "at {}", n);
        }
    }

    #[test]
    fn right_input_reaches_the_output() {
        let mut fdn = Fdn4::new(48_000.0);
        fdn.set_decay(0.7);
        let mut total = 0.0f32;
        for n in 0..48_000 {
            let (l, r) = fdn.process(0.0, if n == 0 { 1.0 } else { 0.0 });
            total += l.abs() + r.abs();
        }
        assert!(total > 0.0, "right input never surfaced");
    }

    #[test]
    fn longer_decay_setting_rings_longer() {
        let tail_energy = |decay: f32| {
            let mut fdn = Fdn4::new(48_000.0);
            fdn.set_decay(decay);
            let mut tail = 0.0f32;
            for n in 0..96_000 {
                let (l, _) = fdn.process(if n == 0 { 1.0 } else { 0.0 }, 0.0);
                if n > 48_000 {
                    tail += l * l;
                }
            }
            tail
        };
        assert!(tail_energy(0.9) > tail_energy(0.5));
    }
}
