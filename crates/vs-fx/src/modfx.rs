//! Modulated-delay effects: chorus and tape-style wow/flutter.

use vs_core::math::{interpolate_2, rescale};
use vs_core::{Lfo, Sample, Waveform};
use vs_dsp::Delay;

/// Dual-LFO stereo chorus over one shared delay line.
///
/// Two slightly detuned triangle LFOs sweep independent taps; each
/// channel blends its swept tap with the dry signal. One knob
/// (`modulation_amount`) drives both depth and blend.
pub struct Chorus {
    modulation_depth: f32,
    modulation_amount: f32,
    sample_rate: f32,
    delay: Delay<5280>,
    lfo_a: Lfo,
    lfo_b: Lfo,
}

impl Chorus {
    /// Maximum tap excursion in samples.
    const MAX_DEPTH: f32 = 4800.0;
    /// Base offset keeps the taps clear of the write head.
    const BASE_OFFSET: f32 = 48.0;

    pub fn new(sample_rate: f32) -> Self {
        let mut chorus = Self {
            modulation_depth: 1.0,
            modulation_amount: 0.0,
            sample_rate,
            delay: Delay::default(),
            lfo_a: Lfo::new(Waveform::Triangle, false),
            lfo_b: Lfo::new(Waveform::Triangle, false),
        };
        chorus.lfo_a.set_rate(1.0 / sample_rate);
        chorus.lfo_b.set_rate(0.99 / sample_rate);
        chorus
    }

    /// One-knob control: 0 is dry, upper range deepens the sweep.
    pub fn set_modulation_amount(&mut self, amount: f32) {
        self.modulation_amount = amount.clamp(0.0, 1.0);
    }

    /// Sweep rate; the two LFOs stay slightly detuned.
    pub fn set_modulation_rate(&mut self, rate: f32) {
        self.lfo_a.set_rate((rate * rate * 0.5) / self.sample_rate);
        self.lfo_b.set_rate((rate * rate * 0.49) / self.sample_rate);
    }

    /// Process one mono sample into a stereo pair.
    pub fn process(&mut self, input: Sample) -> (Sample, Sample) {
        let blend = (self.modulation_amount * 1.5).clamp(0.0, 1.0);
        self.modulation_depth = if self.modulation_amount < 0.25 {
            0.0
        } else {
            rescale(self.modulation_amount, 0.25, 1.0, 0.0, 0.5)
        };

        let mod_a = self.lfo_a.process();
        let mod_b = self.lfo_b.process();
        let swept_a = self
            .delay
            .read_offset_smooth_wrap(mod_a * (Self::MAX_DEPTH * self.modulation_depth) + Self::BASE_OFFSET);
        let swept_b = self
            .delay
            .read_offset_smooth_wrap(mod_b * (Self::MAX_DEPTH * self.modulation_depth) + Self::BASE_OFFSET);

        self.delay.write(input);

        (
            interpolate_2(blend, input, swept_a * 0.5 + input * 0.5),
            interpolate_2(blend, input, swept_b * 0.5 + input * 0.5),
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

/// Tape-style pitch instability: a slow "wow" sine and a faster
/// "flutter" sine jointly sweep one delay tap.
pub struct WowFlutter {
    wow_depth: f32,
    flutter_depth: f32,
    modulation_amount: f32,
    sample_rate: f32,
    delay: Delay<3000>,
    wow: Lfo,
    flutter: Lfo,
}

impl WowFlutter {
    pub fn new(sample_rate: f32) -> Self {
        let mut fx = Self {
            wow_depth: 1400.0,
            flutter_depth: 50.0,
            modulation_amount: 0.0,
            sample_rate,
            delay: Delay::default(),
            wow: Lfo::new(Waveform::Sine, true),
            flutter: Lfo::new(Waveform::Sine, true),
        };
        fx.wow.set_rate(0.1 / sample_rate);
        fx.flutter.set_rate(1.7 / sample_rate);
        fx
    }

    pub fn set_modulation_amount(&mut self, amount: f32) {
        self.modulation_amount = amount;
    }

    /// Wow excursion in samples.
    pub fn set_wow_depth(&mut self, depth: f32) {
        self.wow_depth = depth;
    }

    /// Flutter excursion in samples.
    pub fn set_flutter_depth(&mut self, depth: f32) {
        self.flutter_depth = depth;
    }

    /// Wow rate in Hz.
    pub fn set_wow_rate(&mut self, hz: f32) {
        self.wow.set_rate(hz / self.sample_rate);
    }

    /// Flutter rate in Hz.
    pub fn set_flutter_rate(&mut self, hz: f32) {
        self.flutter.set_rate(hz / self.sample_rate);
    }

    pub fn process(&mut self, input: Sample) -> Sample {
        let mod_offset = self.wow_depth + self.flutter_depth;
        let mod_value = (self.wow.process() * self.wow_depth
            + self.flutter.process() * self.flutter_depth)
            * self.modulation_amount;
        let modulated = self.delay.read_offset_smooth_wrap(mod_offset + mod_value);
        let output = interpolate_2(self.modulation_amount / 2.0, input, modulated);
        self.delay.write(input);
        output
    }

    /// Process a block; length is `min(input.len(), output.len())`.
    pub fn process_block(&mut self, input: &[Sample], output: &mut [Sample]) {
        let n = input.len().min(output.len());
        for i in 0..n {
            output[i] = self.process(input[i]);
        }
    }

    /// Process a fixed-size block.
    pub fn process_for<const N: usize>(&mut self, input: &[Sample; N], output: &mut [Sample; N]) {
        for i in 0..N {
            output[i] = self.process(input[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chorus_at_zero_amount_is_dry() {
        let mut chorus = Chorus::new(48_000.0);
        chorus.set_modulation_amount(0.0);
        for n in 0..1_000 {
            let x = (n as f32 * 0.01).sin();
            let (l, r) = chorus.process(x);
            assert_eq!(l, x, "left not dry at {}", n);
            assert_eq!(r, x, "right not dry at {}", n);
        }
    }

    #[test]
    fn chorus_at_full_amount_is_wet_and_bounded() {
        let mut chorus = Chorus::new(48_000.0);
        chorus.set_modulation_amount(1.0);
        chorus.set_modulation_rate(2.0);
        let mut differs = false;
        for n in 0..48_000 {
            let x = (n as f32 * 0.05).sin() * 0.5;
            let (l, r) = chorus.process(x);
            assert!(l.abs() < 2.0 && r.abs() < 2.0);
            if (l - x).abs() > 1e-3 || (r - x).abs() > 1e-3 {
                differs = true;
            }
        }
        assert!(differs, "full chorus never deviated from dry");
    }

    #[test]
    fn chorus_channels_diverge() {
        let mut chorus = Chorus::new(48_000.0);
        chorus.set_modulation_amount(1.0);
        chorus.set_modulation_rate(3.0);
        let mut diff = 0.0f32;
        for n in 0..48_000 {
            let x = (n as f32 * 0.07).sin() * 0.5;
            let (l, r) = chorus.process(x);
            diff += (l - r).abs();
        }
        assert!(diff > 0.1, "channels never diverged: {}", diff);
    }

    #[test]
    fn wow_flutter_at_zero_amount_is_dry() {
        let mut fx = WowFlutter::new(48_000.0);
        fx.set_modulation_amount(0.0);
        for n in 0..1_000 {
            let x = (n as f32 * 0.02).sin();
            assert_eq!(fx.process(x), x, "not dry at {}", n);
        }
    }

    #[test]
    fn wow_flutter_is_bounded() {
        let mut fx = WowFlutter::new(48_000.0);
        fx.set_modulation_amount(1.0);
        for n in 0..96_000 {
            let x = (n as f32 * 0.11).sin();
            let y = fx.process(x);
            assert!(y.abs() < 2.0, "runaway at {}: {}", n, y);
        }
    }
}
