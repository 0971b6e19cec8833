//! Room reverberators: single-feedback-loop topologies in three sizes.
//!
//! Left and right channels use mutually incommensurate delay lengths and
//! cross-feed each other's damped feedback to decorrelate the stereo
//! image. `dampen` blends between the raw and lowpassed feedback tap;
//! `gain` scales the feedback and therefore the decay time.

use vs_core::math::interpolate_2;
use vs_core::{FilterMode, OnePole, Sample};
use vs_dsp::{Delay, StaticAllpass, StaticDoubleNestedAllpass, StaticNestedAllpass};

use crate::units::{cap_us, samples_ms};

/// Small room: one delay per channel into a doubly-nested diffuser, with
/// a nested allpass in the feedback tap.
pub struct SmallRoom {
    delay_l: Delay<{ cap_us(24_000) }>,
    diffuser_l: StaticDoubleNestedAllpass<{ cap_us(8_300) }, { cap_us(22_000) }, { cap_us(35_000) }>,
    feedback_diffuser_l: StaticNestedAllpass<{ cap_us(30_000) }, { cap_us(66_000) }>,
    dampening_l: OnePole,
    feedback_l: Sample,

    delay_r: Delay<{ cap_us(25_000) }>,
    diffuser_r: StaticDoubleNestedAllpass<{ cap_us(8_000) }, { cap_us(23_000) }, { cap_us(34_000) }>,
    feedback_diffuser_r: StaticNestedAllpass<{ cap_us(31_000) }, { cap_us(65_000) }>,
    dampening_r: OnePole,
    feedback_r: Sample,

    gain: Sample,
    dampen: f32,
}

impl SmallRoom {
    pub fn new(sample_rate: f32) -> Self {
        let mut room = Self {
            delay_l: Delay::default(),
            diffuser_l: StaticDoubleNestedAllpass::default(),
            feedback_diffuser_l: StaticNestedAllpass::default(),
            dampening_l: OnePole::new(FilterMode::Lowpass, 4500.0 / sample_rate),
            feedback_l: 0.0,
            delay_r: Delay::default(),
            diffuser_r: StaticDoubleNestedAllpass::default(),
            feedback_diffuser_r: StaticNestedAllpass::default(),
            dampening_r: OnePole::new(FilterMode::Lowpass, 4500.0 / sample_rate),
            feedback_r: 0.0,
            gain: 0.0,
            dampen: 0.0,
        };
        room.delay_l.set_length(samples_ms(24.0, sample_rate));
        room.delay_r.set_length(samples_ms(25.0, sample_rate));
        room.diffuser_l.set_lengths(
            samples_ms(8.3, sample_rate),
            samples_ms(22.0, sample_rate),
            samples_ms(35.0, sample_rate),
        );
        room.diffuser_r.set_lengths(
            samples_ms(8.0, sample_rate),
            samples_ms(23.0, sample_rate),
            samples_ms(34.0, sample_rate),
        );
        room.diffuser_l.set_gain(0.6, 0.4, 0.8);
        room.diffuser_r.set_gain(0.6, 0.4, 0.8);
        room.feedback_diffuser_l
            .set_lengths(samples_ms(30.0, sample_rate), samples_ms(66.0, sample_rate));
        room.feedback_diffuser_r
            .set_lengths(samples_ms(31.0, sample_rate), samples_ms(65.0, sample_rate));
        room.feedback_diffuser_l.set_gain(0.4, 0.1);
        room.feedback_diffuser_r.set_gain(0.4, 0.1);
        room
    }

    /// Feedback gain; controls decay time. Stable for |gain| < 1.
    pub fn set_gain(&mut self, gain: Sample) {
        self.gain = gain;
    }

    /// Blend between raw (0) and lowpassed (1) feedback.
    pub fn set_dampening(&mut self, dampen: f32) {
        self.dampen = dampen;
    }

    /// Normalized dampening cutoff (frequency / sample rate).
    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.dampening_l.set_cutoff(cutoff);
        self.dampening_r.set_cutoff(cutoff);
    }

    pub fn process(&mut self, in_l: Sample, in_r: Sample) -> (Sample, Sample) {
        // Dampened feedback taps are cross-fed between channels.
        let damp_l = interpolate_2(
            self.dampen,
            self.feedback_r,
            self.dampening_l.process(self.feedback_r),
        );
        let damp_r = interpolate_2(
            self.dampen,
            self.feedback_l,
            self.dampening_r.process(self.feedback_l),
        );
        let feedforward_l = self.diffuser_l.process(self.delay_l.read());
        let feedforward_r = self.diffuser_r.process(self.delay_r.read());
        self.delay_l.write(in_l + damp_l * self.gain);
        self.delay_r.write(in_r + damp_r * self.gain);
        self.feedback_l = self.feedback_diffuser_l.process(feedforward_l);
        self.feedback_r = self.feedback_diffuser_r.process(feedforward_r);
        (
            self.feedback_l * 0.2 + feedforward_l * 0.6,
            self.feedback_r * 0.2 + feedforward_r * 0.6,
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

/// Medium room: longer delay chain with diffusion both at the input and
/// inside the recirculation path.
pub struct MediumRoom {
    diffuser_l: StaticDoubleNestedAllpass<{ cap_us(22_000) }, { cap_us(8_300) }, { cap_us(35_000) }>,
    delay0_l: Delay<{ cap_us(5_000) }>,
    allpass_l: StaticAllpass<{ cap_us(30_000) }>,
    delay1_l: Delay<{ cap_us(67_000) }>,
    delay2_l: Delay<{ cap_us(15_000) }>,
    feedback_diffuser_l: StaticNestedAllpass<{ cap_us(10_000) }, { cap_us(39_000) }>,
    delay3_l: Delay<{ cap_us(108_000) }>,
    dampening_l: OnePole,
    feedback_l: Sample,

    diffuser_r: StaticDoubleNestedAllpass<{ cap_us(21_000) }, { cap_us(8_400) }, { cap_us(34_000) }>,
    delay0_r: Delay<{ cap_us(6_000) }>,
    allpass_r: StaticAllpass<{ cap_us(29_000) }>,
    delay1_r: Delay<{ cap_us(68_000) }>,
    delay2_r: Delay<{ cap_us(14_000) }>,
    feedback_diffuser_r: StaticNestedAllpass<{ cap_us(11_000) }, { cap_us(38_000) }>,
    delay3_r: Delay<{ cap_us(107_000) }>,
    dampening_r: OnePole,
    feedback_r: Sample,

    gain: Sample,
    dampen: f32,
}

impl MediumRoom {
    pub fn new(sample_rate: f32) -> Self {
        let mut room = Self {
            diffuser_l: StaticDoubleNestedAllpass::default(),
            delay0_l: Delay::default(),
            allpass_l: StaticAllpass::default(),
            delay1_l: Delay::default(),
            delay2_l: Delay::default(),
            feedback_diffuser_l: StaticNestedAllpass::default(),
            delay3_l: Delay::default(),
            dampening_l: OnePole::new(FilterMode::Lowpass, 2500.0 / sample_rate),
            feedback_l: 0.0,
            diffuser_r: StaticDoubleNestedAllpass::default(),
            delay0_r: Delay::default(),
            allpass_r: StaticAllpass::default(),
            delay1_r: Delay::default(),
            delay2_r: Delay::default(),
            feedback_diffuser_r: StaticNestedAllpass::default(),
            delay3_r: Delay::default(),
            dampening_r: OnePole::new(FilterMode::Lowpass, 2500.0 / sample_rate),
            feedback_r: 0.0,
            gain: 0.0,
            dampen: 0.0,
        };
        room.diffuser_l.set_lengths(
            samples_ms(22.0, sample_rate),
            samples_ms(8.3, sample_rate),
            samples_ms(35.0, sample_rate),
        );
        room.diffuser_r.set_lengths(
            samples_ms(21.0, sample_rate),
            samples_ms(8.4, sample_rate),
            samples_ms(34.0, sample_rate),
        );
        room.delay0_l.set_length(samples_ms(5.0, sample_rate));
        room.delay0_r.set_length(samples_ms(6.0, sample_rate));
        room.allpass_l.set_length(samples_ms(30.0, sample_rate));
        room.allpass_r.set_length(samples_ms(29.0, sample_rate));
        room.allpass_l.set_gain(0.5);
        room.allpass_r.set_gain(0.5);
        room.delay1_l.set_length(samples_ms(67.0, sample_rate));
        room.delay1_r.set_length(samples_ms(68.0, sample_rate));
        room.delay2_l.set_length(samples_ms(15.0, sample_rate));
        room.delay2_r.set_length(samples_ms(14.0, sample_rate));
        room.feedback_diffuser_l
            .set_lengths(samples_ms(10.0, sample_rate), samples_ms(39.0, sample_rate));
        room.feedback_diffuser_r
            .set_lengths(samples_ms(11.0, sample_rate), samples_ms(38.0, sample_rate));
        room.feedback_diffuser_l.set_gain(0.6, 0.3);
        room.feedback_diffuser_r.set_gain(0.6, 0.3);
        room.delay3_l.set_length(samples_ms(108.0, sample_rate));
        room.delay3_r.set_length(samples_ms(107.0, sample_rate));
        room
    }

    pub fn set_gain(&mut self, gain: Sample) {
        self.gain = gain;
    }

    pub fn set_dampening(&mut self, dampen: f32) {
        self.dampen = dampen;
    }

    /// Normalized dampening cutoff (frequency / sample rate).
    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.dampening_l.set_cutoff(cutoff);
        self.dampening_r.set_cutoff(cutoff);
    }

    pub fn process(&mut self, in_l: Sample, in_r: Sample) -> (Sample, Sample) {
        let tail_l = self.delay3_l.read();
        let tail_r = self.delay3_r.read();
        let damp_l = interpolate_2(self.dampen, tail_l, self.dampening_l.process(tail_l));
        let damp_r = interpolate_2(self.dampen, tail_r, self.dampening_r.process(tail_r));

        let feedforward0_l = self.diffuser_l.process(in_l + damp_l * self.gain);
        let feedforward0_r = self.diffuser_r.process(in_r + damp_r * self.gain);

        let mut feedforward1_l = self.allpass_l.process(self.delay0_l.read());
        let mut feedforward1_r = self.allpass_r.process(self.delay0_r.read());

        self.delay0_l.write(feedforward0_l);
        self.delay0_r.write(feedforward0_r);

        let del1_out_l = self.delay1_l.read();
        let del1_out_r = self.delay1_r.read();
        self.delay1_l.write(feedforward1_l);
        self.delay1_r.write(feedforward1_r);
        feedforward1_l = del1_out_l;
        feedforward1_r = del1_out_r;

        // Feedback diffusers are cross-wired between channels.
        self.feedback_r = self
            .feedback_diffuser_l
            .process(self.delay2_l.read() * self.gain + in_l);
        self.feedback_l = self
            .feedback_diffuser_r
            .process(self.delay2_r.read() * self.gain + in_r);

        self.delay2_l.write(feedforward1_l);
        self.delay2_r.write(feedforward1_r);

        self.delay3_l.write(self.feedback_l);
        self.delay3_r.write(self.feedback_r);

        (
            feedforward0_l * 0.34 + feedforward1_l * 0.14 + self.feedback_l * 0.14,
            feedforward0_r * 0.34 + feedforward1_r * 0.14 + self.feedback_r * 0.14,
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

/// Large room: two allpasses at the input, a long recirculation chain,
/// and a criss-cross doubly-nested diffuser feeding the opposite channel.
pub struct LargeRoom {
    allpass0_l: StaticAllpass<{ cap_us(8_000) }>,
    allpass1_l: StaticAllpass<{ cap_us(12_000) }>,
    delay0_l: Delay<{ cap_us(4_000) }>,
    delay1_l: Delay<{ cap_us(17_000) }>,
    feedback_diffuser_l: StaticNestedAllpass<{ cap_us(62_000) }, { cap_us(87_000) }>,
    delay2_l: Delay<{ cap_us(31_000) }>,
    delay3_l: Delay<{ cap_us(3_000) }>,
    diffuser_l: StaticDoubleNestedAllpass<{ cap_us(30_000) }, { cap_us(76_000) }, { cap_us(120_000) }>,
    dampening_l: OnePole,
    feedback_l: Sample,

    allpass0_r: StaticAllpass<{ cap_us(9_000) }>,
    allpass1_r: StaticAllpass<{ cap_us(11_000) }>,
    delay0_r: Delay<{ cap_us(5_000) }>,
    delay1_r: Delay<{ cap_us(16_000) }>,
    feedback_diffuser_r: StaticNestedAllpass<{ cap_us(61_000) }, { cap_us(86_000) }>,
    delay2_r: Delay<{ cap_us(32_000) }>,
    delay3_r: Delay<{ cap_us(2_000) }>,
    diffuser_r: StaticDoubleNestedAllpass<{ cap_us(31_000) }, { cap_us(75_000) }, { cap_us(121_000) }>,
    dampening_r: OnePole,
    feedback_r: Sample,

    gain: Sample,
    dampen: f32,
}

impl LargeRoom {
    pub fn new(sample_rate: f32) -> Self {
        let mut room = Self {
            allpass0_l: StaticAllpass::default(),
            allpass1_l: StaticAllpass::default(),
            delay0_l: Delay::default(),
            delay1_l: Delay::default(),
            feedback_diffuser_l: StaticNestedAllpass::default(),
            delay2_l: Delay::default(),
            delay3_l: Delay::default(),
            diffuser_l: StaticDoubleNestedAllpass::default(),
            dampening_l: OnePole::new(FilterMode::Lowpass, 2600.0 / sample_rate),
            feedback_l: 0.0,
            allpass0_r: StaticAllpass::default(),
            allpass1_r: StaticAllpass::default(),
            delay0_r: Delay::default(),
            delay1_r: Delay::default(),
            feedback_diffuser_r: StaticNestedAllpass::default(),
            delay2_r: Delay::default(),
            delay3_r: Delay::default(),
            diffuser_r: StaticDoubleNestedAllpass::default(),
            dampening_r: OnePole::new(FilterMode::Lowpass, 2600.0 / sample_rate),
            feedback_r: 0.0,
            gain: 0.0,
            dampen: 0.0,
        };
        room.allpass0_l.set_length(samples_ms(8.0, sample_rate));
        room.allpass1_l.set_length(samples_ms(12.0, sample_rate));
        room.allpass0_r.set_length(samples_ms(9.0, sample_rate));
        room.allpass1_r.set_length(samples_ms(11.0, sample_rate));
        room.allpass0_l.set_gain(0.3);
        room.allpass1_l.set_gain(0.3);
        room.allpass0_r.set_gain(0.3);
        room.allpass1_r.set_gain(0.3);
        room.delay0_l.set_length(samples_ms(4.0, sample_rate));
        room.delay0_r.set_length(samples_ms(5.0, sample_rate));
        room.delay1_l.set_length(samples_ms(17.0, sample_rate));
        room.delay1_r.set_length(samples_ms(16.0, sample_rate));
        room.feedback_diffuser_l
            .set_lengths(samples_ms(62.0, sample_rate), samples_ms(87.0, sample_rate));
        room.feedback_diffuser_r
            .set_lengths(samples_ms(61.0, sample_rate), samples_ms(86.0, sample_rate));
        room.feedback_diffuser_l.set_gain(0.25, 0.5);
        room.feedback_diffuser_r.set_gain(0.25, 0.5);
        room.delay2_l.set_length(samples_ms(31.0, sample_rate));
        room.delay2_r.set_length(samples_ms(32.0, sample_rate));
        room.delay3_l.set_length(samples_ms(3.0, sample_rate));
        room.delay3_r.set_length(samples_ms(2.0, sample_rate));
        room.diffuser_l.set_lengths(
            samples_ms(30.0, sample_rate),
            samples_ms(76.0, sample_rate),
            samples_ms(120.0, sample_rate),
        );
        room.diffuser_r.set_lengths(
            samples_ms(31.0, sample_rate),
            samples_ms(75.0, sample_rate),
            samples_ms(121.0, sample_rate),
        );
        room.diffuser_l.set_gain(0.25, 0.25, 0.5);
        room.diffuser_r.set_gain(0.25, 0.25, 0.5);
        room
    }

    pub fn set_gain(&mut self, gain: Sample) {
        self.gain = gain;
    }

    pub fn set_dampening(&mut self, dampen: f32) {
        self.dampen = dampen;
    }

    /// Normalized dampening cutoff (frequency / sample rate).
    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.dampening_l.set_cutoff(cutoff);
        self.dampening_r.set_cutoff(cutoff);
    }

    pub fn process(&mut self, in_l: Sample, in_r: Sample) -> (Sample, Sample) {
        // Criss-cross: each channel's tail diffuser feeds the other side.
        self.feedback_r = self.diffuser_l.process(self.delay3_l.read());
        self.feedback_l = self.diffuser_r.process(self.delay3_r.read());

        let dampened_l =
            interpolate_2(self.dampen, self.feedback_l, self.dampening_l.process(self.feedback_l))
                * self.gain;
        let dampened_r =
            interpolate_2(self.dampen, self.feedback_r, self.dampening_r.process(self.feedback_r))
                * self.gain;

        let feedforward1_l = self.delay0_l.read();
        let feedforward1_r = self.delay0_r.read();
        let ap_out_l = self.allpass0_l.process(in_l + dampened_l);
        let ap_out_r = self.allpass0_r.process(in_r + dampened_r);
        self.delay0_l.write(self.allpass1_l.process(ap_out_l));
        self.delay0_r.write(self.allpass1_r.process(ap_out_r));

        let nested_out_l = self.feedback_diffuser_l.process(self.delay1_l.read());
        let nested_out_r = self.feedback_diffuser_r.process(self.delay1_r.read());
        self.delay1_l.write(feedforward1_l);
        self.delay1_r.write(feedforward1_r);

        let feedforward2_l = self.delay2_l.read();
        let feedforward2_r = self.delay2_r.read();
        self.delay2_l.write(nested_out_l);
        self.delay2_r.write(nested_out_r);

        self.delay3_l.write(feedforward2_l);
        self.delay3_r.write(feedforward2_r);

        (
            feedforward1_l * 0.34 + feedforward2_l * 0.14 + self.feedback_l * 0.14,
            feedforward1_r * 0.34 + feedforward2_r * 0.14 + self.feedback_r * 0.14,
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
