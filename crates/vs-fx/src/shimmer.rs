//! Diffuse modulated-delay reverb.
//!
//! Four allpasses in series diffuse the mono input, which then feeds two
//! cross-coupled branches: each branch dampens the diffused signal plus
//! the *other* branch's feedback, sweeps it through a modulated delay,
//! and diffuses it again through two allpasses. The branch outputs are
//! the stereo pair.

use vs_core::{FilterMode, OnePole, Sample};
use vs_dsp::{StaticAllpass, StaticModAllpass, StaticModDelay};

use crate::units::{cap_us, samples_ms};

pub struct ShimmerReverb {
    allpass1: StaticModAllpass<{ cap_us(4_760) }>,
    allpass2: StaticAllpass<{ cap_us(3_580) }>,
    allpass3: StaticAllpass<{ cap_us(12_721) }>,
    allpass4: StaticAllpass<{ cap_us(9_297) }>,

    delay_a: StaticModDelay<{ cap_us(106_594) }>,
    dampening_a: OnePole,
    allpass1_a: StaticAllpass<{ cap_us(51_625) }>,
    allpass2_a: StaticAllpass<{ cap_us(63_688) }>,

    delay_b: StaticModDelay<{ cap_us(149_438) }>,
    dampening_b: OnePole,
    allpass1_b: StaticAllpass<{ cap_us(59_782) }>,
    allpass2_b: StaticAllpass<{ cap_us(51_969) }>,

    gain: Sample,
    feedback_a: Sample,
    feedback_b: Sample,
}

impl ShimmerReverb {
    pub fn new(sample_rate: f32) -> Self {
        let mut reverb = Self {
            allpass1: StaticModAllpass::default(),
            allpass2: StaticAllpass::default(),
            allpass3: StaticAllpass::default(),
            allpass4: StaticAllpass::default(),
            delay_a: StaticModDelay::default(),
            dampening_a: OnePole::new(FilterMode::Lowpass, 22_000.0 / sample_rate),
            allpass1_a: StaticAllpass::default(),
            allpass2_a: StaticAllpass::default(),
            delay_b: StaticModDelay::default(),
            dampening_b: OnePole::new(FilterMode::Lowpass, 22_000.0 / sample_rate),
            allpass1_b: StaticAllpass::default(),
            allpass2_b: StaticAllpass::default(),
            gain: 0.0,
            feedback_a: 0.0,
            feedback_b: 0.0,
        };
        reverb.allpass1.set_length(samples_ms(4.76, sample_rate));
        reverb.allpass2.set_length(samples_ms(3.58, sample_rate));
        reverb.allpass3.set_length(samples_ms(12.721, sample_rate));
        reverb.allpass4.set_length(samples_ms(9.297, sample_rate));
        reverb.allpass1.set_gain(0.625);
        reverb.allpass2.set_gain(0.625);
        reverb.allpass3.set_gain(0.625);
        reverb.allpass4.set_gain(0.625);

        reverb.delay_a.set_length(samples_ms(106.59375, sample_rate));
        reverb.delay_a.set_modulation_rate(0.3 / sample_rate);
        reverb.delay_a.set_sample_depth(100.0);
        reverb.allpass1_a.set_length(samples_ms(51.625, sample_rate));
        reverb.allpass2_a.set_length(samples_ms(63.68725, sample_rate));
        reverb.allpass1_a.set_gain(0.625);
        reverb.allpass2_a.set_gain(0.625);

        reverb.delay_b.set_length(samples_ms(149.4375, sample_rate));
        reverb.delay_b.set_modulation_rate(0.35 / sample_rate);
        reverb.delay_b.set_sample_depth(100.0);
        reverb.allpass1_b.set_length(samples_ms(59.78125, sample_rate));
        reverb.allpass2_b.set_length(samples_ms(51.96875, sample_rate));
        reverb.allpass1_b.set_gain(0.625);
        reverb.allpass2_b.set_gain(0.625);
        reverb
    }

    /// Branch feedback gain; controls decay time. Stable for |gain| < 1.
    pub fn set_gain(&mut self, gain: Sample) {
        self.gain = gain;
    }

    /// Process one mono sample into a stereo pair.
    pub fn process(&mut self, input: Sample) -> (Sample, Sample) {
        let ap_out1 = self.allpass1.process(input);
        let ap_out2 = self.allpass2.process(ap_out1);
        let ap_out3 = self.allpass3.process(ap_out2);
        let ap_out4 = self.allpass4.process(ap_out3);

        let damp_a = self.dampening_a.process(ap_out4 + self.feedback_b);
        let mod_a = self.delay_a.process(damp_a);
        let a_diffused = self.allpass2_a.process(self.allpass1_a.process(mod_a));
        self.feedback_a = a_diffused * self.gain;

        let damp_b = self.dampening_b.process(ap_out4 + self.feedback_a);
        let mod_b = self.delay_b.process(damp_b);
        let b_diffused = self.allpass2_b.process(self.allpass1_b.process(mod_b));
        self.feedback_b = b_diffused * self.gain;

        (self.feedback_a, self.feedback_b)
    }

    /// Process a mono block into stereo views; length is the shortest.
    pub fn process_block(&mut self, input: &[Sample], out_l: &mut [Sample], out_r: &mut [Sample]) {
        let n = input.len().min(out_l.len()).min(out_r.len());
        for i in 0..n {
            let (l, r) = self.process(input[i]);
            out_l[i] = l;
            out_r[i] = r;
        }
    }

    /// Process a fixed-size mono block into stereo.
    pub fn process_for<const N: usize>(
        &mut self,
        input: &[Sample; N],
        out_l: &mut [Sample; N],
        out_r: &mut [Sample; N],
    ) {
        for i in 0..N {
            let (l, r) = self.process(input[i]);
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
    fn impulse_tail_is_finite_and_decays() {
        let mut reverb = ShimmerReverb::new(48_000.0);
        reverb.set_gain(0.7);
        let mut left = Vec::new();
        let mut right = Vec::new();
        for n in 0..96_000 {
            let (l, r) = reverb.process(if n == 0 { 1.0 } else { 0.0 });
            left.push(l);
            right.push(r);
        }
        assert!(energy(&left) > 0.0 && energy(&right) > 0.0);
        let head = energy(&left[..24_000]);
        let tail = energy(&left[72_000..]);
        assert!(tail < head * 0.2, "head {} tail {}", head, tail);
        assert!(left.iter().chain(right.iter()).all(|s| s.abs() < 10.0));
    }

    #[test]
    fn silence_in_is_silence_out() {
        let mut reverb = ShimmerReverb::new(48_000.0);
        reverb.set_gain(0.8);
        for _ in 0..10_000 {
            let (l, r) = reverb.process(0.0);
            assert_eq!(l, 0.0);
            assert_eq!(r, 0.0);
        }
    }

    #[test]
    fn branches_produce_distinct_channels() {
        let mut reverb = ShimmerReverb::new(48_000.0);
        reverb.set_gain(0.6);
        let mut diff = 0.0f32;
        for n in 0..48_000 {
            let (l, r) = reverb.process(if n % 480 == 0 { 1.0 } else { 0.0 });
            diff += (l - r).abs();
        }
        assert!(diff > 1.0, "branches are identical: diff {}", diff);
    }
}
