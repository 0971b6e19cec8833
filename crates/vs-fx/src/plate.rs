//! Two-tank plate reverberator.
//!
//! Mono input is pre-delayed, diffused through four allpasses in series,
//! then circulated through two symmetric tanks in a figure-8: each tank's
//! feedback is injected into the *other* tank's modulated allpass, which
//! breaks the periodicity a single loop would produce. The stereo output
//! sums fixed taps drawn from both tanks, alternately added and
//! subtracted for a dense, decorrelated image.

use vs_core::{FilterMode, OnePole, Sample};
use vs_dsp::{Delay, StaticAllpass, StaticModAllpass};

use crate::units::{cap_us, samples_ms};

/// Output tap offsets in samples, resolved once at construction.
struct TapOffsets {
    left: [usize; 7],
    right: [usize; 7],
}

pub struct PlateReverb {
    pre_delay: Delay<{ cap_us(20_000) }>,
    diffusion: OnePole,
    allpass1: StaticAllpass<{ cap_us(4_760) }>,
    allpass2: StaticAllpass<{ cap_us(3_580) }>,
    allpass3: StaticAllpass<{ cap_us(12_721) }>,
    allpass4: StaticAllpass<{ cap_us(9_297) }>,

    mod_allpass_a: StaticModAllpass<{ cap_us(12_000) }>,
    delay1_a: Delay<{ cap_us(141_510) }>,
    dampening_a: OnePole,
    allpass_a: StaticAllpass<{ cap_us(60_400) }>,
    delay2_a: Delay<{ cap_us(105_238) }>,

    mod_allpass_b: StaticModAllpass<{ cap_us(8_000) }>,
    delay1_b: Delay<{ cap_us(149_433) }>,
    dampening_b: OnePole,
    allpass_b: StaticAllpass<{ cap_us(89_320) }>,
    delay2_b: Delay<{ cap_us(124_829) }>,

    taps: TapOffsets,
    gain: Sample,
    feedback_a: Sample,
    feedback_b: Sample,
}

impl PlateReverb {
    pub fn new(sample_rate: f32) -> Self {
        let mut plate = Self {
            pre_delay: Delay::default(),
            diffusion: OnePole::new(FilterMode::Lowpass, 9600.0 / sample_rate),
            allpass1: StaticAllpass::default(),
            allpass2: StaticAllpass::default(),
            allpass3: StaticAllpass::default(),
            allpass4: StaticAllpass::default(),
            mod_allpass_a: StaticModAllpass::default(),
            delay1_a: Delay::default(),
            dampening_a: OnePole::new(FilterMode::Lowpass, 6500.0 / sample_rate),
            allpass_a: StaticAllpass::default(),
            delay2_a: Delay::default(),
            mod_allpass_b: StaticModAllpass::default(),
            delay1_b: Delay::default(),
            dampening_b: OnePole::new(FilterMode::Lowpass, 6500.0 / sample_rate),
            allpass_b: StaticAllpass::default(),
            delay2_b: Delay::default(),
            taps: TapOffsets {
                left: [
                    samples_ms(8.932, sample_rate),
                    samples_ms(99.795, sample_rate),
                    samples_ms(54.195, sample_rate),
                    samples_ms(66.984, sample_rate),
                    samples_ms(66.780, sample_rate),
                    samples_ms(6.2811, sample_rate),
                    samples_ms(35.782, sample_rate),
                ],
                right: [
                    samples_ms(11.836, sample_rate),
                    samples_ms(121.723, sample_rate),
                    samples_ms(41.201, sample_rate),
                    samples_ms(89.705, sample_rate),
                    samples_ms(70.839, sample_rate),
                    samples_ms(11.2471, sample_rate),
                    samples_ms(4.058, sample_rate),
                ],
            },
            gain: 0.0,
            feedback_a: 0.0,
            feedback_b: 0.0,
        };
        plate.pre_delay.set_length(samples_ms(20.0, sample_rate));
        plate.allpass1.set_length(samples_ms(4.76, sample_rate));
        plate.allpass2.set_length(samples_ms(3.58, sample_rate));
        plate.allpass3.set_length(samples_ms(12.721, sample_rate));
        plate.allpass4.set_length(samples_ms(9.297, sample_rate));
        plate.allpass1.set_gain(0.75);
        plate.allpass2.set_gain(0.75);
        plate.allpass3.set_gain(0.625);
        plate.allpass4.set_gain(0.625);

        plate.mod_allpass_a.set_length(samples_ms(12.0, sample_rate));
        plate.mod_allpass_a.set_gain(0.35);
        plate.mod_allpass_a.set_modulation_rate(0.7 / sample_rate);
        plate.mod_allpass_a.set_sample_depth(50.0);
        plate.delay1_a.set_length(samples_ms(141.51, sample_rate));
        plate.allpass_a.set_length(samples_ms(60.40, sample_rate));
        plate.allpass_a.set_gain(0.5);
        plate.delay2_a.set_length(samples_ms(105.238, sample_rate));

        plate.mod_allpass_b.set_length(samples_ms(8.0, sample_rate));
        plate.mod_allpass_b.set_gain(0.475);
        plate.mod_allpass_b.set_modulation_rate(0.6 / sample_rate);
        plate.mod_allpass_b.set_sample_depth(50.0);
        plate.delay1_b.set_length(samples_ms(149.433, sample_rate));
        plate.allpass_b.set_length(samples_ms(89.32, sample_rate));
        plate.allpass_b.set_gain(0.5);
        plate.delay2_b.set_length(samples_ms(124.829, sample_rate));
        plate
    }

    /// Tank feedback gain; controls decay time. Stable for |gain| < 1.
    pub fn set_gain(&mut self, gain: Sample) {
        self.gain = gain;
    }

    /// Process one mono sample into a stereo pair.
    pub fn process(&mut self, input: Sample) -> (Sample, Sample) {
        let t = &self.taps;
        let tap1 = self.delay1_a.read_offset(t.left[0]) * 0.3;
        let tap2 = self.delay1_a.read_offset(t.left[1]) * 0.3;
        let tap3 = self.allpass_a.read_offset(t.left[2]) * 0.3;
        let tap4 = self.delay2_a.read_offset(t.left[3]) * 0.3;
        let tap5 = self.delay1_b.read_offset(t.left[4]) * 0.3;
        let tap6 = self.allpass_b.read_offset(t.left[5]) * 0.3;
        let tap7 = self.delay2_b.read_offset(t.left[6]) * 0.3;

        let tap8 = self.delay1_b.read_offset(t.right[0]) * 0.3;
        let tap9 = self.delay1_b.read_offset(t.right[1]) * 0.3;
        let tap10 = self.allpass_b.read_offset(t.right[2]) * 0.3;
        let tap11 = self.delay2_b.read_offset(t.right[3]) * 0.3;
        let tap12 = self.delay1_a.read_offset(t.right[4]) * 0.3;
        let tap13 = self.allpass_a.read_offset(t.right[5]) * 0.3;
        let tap14 = self.delay2_a.read_offset(t.right[6]) * 0.3;

        let diffusion_out = self.diffusion.process(self.pre_delay.read());
        self.pre_delay.write(input);

        let ap_out1 = self.allpass1.process(diffusion_out);
        let ap_out2 = self.allpass2.process(ap_out1);
        let ap_out3 = self.allpass3.process(ap_out2);
        let ap_out4 = self.allpass4.process(ap_out3);

        self.feedback_a = self.delay2_a.read() * self.gain;
        self.feedback_b = self.delay2_b.read() * self.gain;

        // Dampening applies to the stored tank signal, before the next
        // allpass stage, so nothing is filtered twice.
        let damp_out_a = self.dampening_a.process(self.delay1_a.read());
        let damp_out_b = self.dampening_b.process(self.delay1_b.read());
        let diffused_a = self.allpass_a.process(damp_out_a);
        let diffused_b = self.allpass_b.process(damp_out_b);
        self.delay2_a.write(diffused_a);
        self.delay2_b.write(diffused_b);

        // Figure-8: tank A consumes tank B's feedback and vice versa.
        let inject_a = self.mod_allpass_a.process(ap_out4 + self.feedback_b);
        let inject_b = self.mod_allpass_b.process(ap_out4 + self.feedback_a);
        self.delay1_a.write(inject_a);
        self.delay1_b.write(inject_b);

        (
            tap1 + tap2 - tap3 + tap4 - tap5 - tap6 - tap7,
            tap8 + tap9 - tap10 + tap11 - tap12 - tap13 - tap14,
        )
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

    fn render_impulse(plate: &mut PlateReverb, len: usize) -> (Vec<Sample>, Vec<Sample>) {
        let mut left = Vec::with_capacity(len);
        let mut right = Vec::with_capacity(len);
        for n in 0..len {
            let (l, r) = plate.process(if n == 0 { 1.0 } else { 0.0 });
            left.push(l);
            right.push(r);
        }
        (left, right)
    }

    fn energy(samples: &[Sample]) -> f32 {
        samples.iter().map(|s| s * s).sum()
    }

    #[test]
    fn impulse_response_is_dense_and_decays() {
        let mut plate = PlateReverb::new(48_000.0);
        plate.set_gain(0.5);
        let (left, right) = render_impulse(&mut plate, 96_000);
        assert!(energy(&left) > 0.0 && energy(&right) > 0.0);
        // Taps from both tanks produce a dense early field.
        let nonzero = left[..9_600].iter().filter(|s| s.abs() > 1e-6).count();
        assert!(nonzero > 1_000, "sparse early field: {}", nonzero);
        let head = energy(&left[..24_000]);
        let tail = energy(&left[72_000..]);
        assert!(tail < head * 0.1, "head {} tail {}", head, tail);
    }

    #[test]
    fn output_is_bounded_at_high_gain() {
        let mut plate = PlateReverb::new(48_000.0);
        plate.set_gain(0.9);
        let (left, right) = render_impulse(&mut plate, 192_000);
        assert!(left.iter().chain(right.iter()).all(|s| s.abs() < 10.0));
    }

    #[test]
    fn pre_delay_silences_the_onset() {
        let mut plate = PlateReverb::new(48_000.0);
        plate.set_gain(0.5);
        let (left, right) = render_impulse(&mut plate, 4_800);
        // 20 ms pre-delay plus diffusion: nothing can arrive instantly.
        let early = energy(&left[..480]) + energy(&right[..480]);
        assert!(early < 1e-9, "energy before the pre-delay: {}", early);
    }

    #[test]
    fn channels_are_decorrelated() {
        let mut plate = PlateReverb::new(48_000.0);
        plate.set_gain(0.6);
        let (left, right) = render_impulse(&mut plate, 48_000);
        let diff: f32 = left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| (l - r).abs())
            .sum();
        assert!(diff > 1.0, "stereo image is mono: diff {}", diff);
    }
}
