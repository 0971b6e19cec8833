//! Delay lines: plain, LFO-modulated, and varispeed.

use vs_core::{HeapBuffer, Lfo, Sample, SampleBuffer, Storage, Waveform};

use crate::ring::Ring;

/// Fixed-capacity delay line: a ring buffer bound to owned static storage.
pub type Delay<const N: usize> = Ring<SampleBuffer<N>>;

/// Delay line over heap storage allocated once at construction.
pub type HeapDelay = Ring<HeapBuffer>;

/// Delay line whose read tap is swept by an LFO, for chorus/flutter/
/// vibrato-style effects. The input is written unmodified; only the read
/// position moves.
#[derive(Clone, Debug)]
pub struct ModDelay<S: Storage> {
    ring: Ring<S>,
    modulation_depth: f32,
    sample_depth: f32,
    lfo: Lfo,
}

/// Modulated delay bound to owned static storage.
pub type StaticModDelay<const N: usize> = ModDelay<SampleBuffer<N>>;

impl<S: Storage> ModDelay<S> {
    pub fn new(storage: S) -> Self {
        Self {
            ring: Ring::new(storage),
            modulation_depth: 1.0,
            sample_depth: 0.0,
            lfo: Lfo::new(Waveform::Triangle, true),
        }
    }

    /// Process one sample: read at the LFO-swept offset, then write the
    /// unmodified input.
    pub fn process(&mut self, input: Sample) -> Sample {
        let mut modulation = self.lfo.process() * (self.sample_depth * self.modulation_depth);
        let fold = (self.ring.capacity() - 1) as f32;
        if modulation > fold {
            modulation -= fold;
        }
        let output = self
            .ring
            .read_offset_smooth_wrap(self.ring.length() as f32 - modulation);
        self.ring.write(input);
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

    /// Fixed-offset tap into the delay history.
    pub fn read_offset(&self, offset: usize) -> Sample {
        self.ring.read_offset(offset)
    }

    /// Modulation depth as a fraction of the sample depth, `[0, 1]`.
    pub fn set_modulation_depth(&mut self, depth: f32) {
        self.modulation_depth = depth.clamp(0.0, 1.0);
    }

    /// Peak excursion in samples, `[1, capacity-1]`.
    pub fn set_sample_depth(&mut self, depth: f32) {
        self.sample_depth = depth.clamp(1.0, (self.ring.capacity() - 1) as f32);
    }

    /// LFO rate in cycles per sample.
    pub fn set_modulation_rate(&mut self, rate: f32) {
        self.lfo.set_rate(rate);
    }

    /// Set the active delay length (clamped to capacity).
    pub fn set_length(&mut self, length: usize) {
        self.ring.set_length(length);
    }

    pub fn length(&self) -> usize {
        self.ring.length()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

impl<S: Storage + Default> Default for ModDelay<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

/// Delay line with a slewed, freezable delay time.
///
/// The read position chases the target time with a first-order slew, so
/// time changes glide instead of clicking; freezing stops the write head
/// and loops the held audio.
#[derive(Clone, Debug)]
pub struct VarispeedDelay<S: Storage> {
    ring: Ring<S>,
    delay_time: f32,
    slew_amount: f32,
    slew_position: f32,
    freeze: bool,
}

/// Varispeed delay bound to owned static storage.
pub type StaticVarispeedDelay<const N: usize> = VarispeedDelay<SampleBuffer<N>>;

impl<S: Storage> VarispeedDelay<S> {
    pub fn new(storage: S) -> Self {
        Self {
            ring: Ring::new(storage),
            delay_time: 0.0,
            slew_amount: 2400.0,
            slew_position: 0.0,
            freeze: false,
        }
    }

    pub fn process(&mut self, input: Sample) -> Sample {
        self.slew_position += (self.delay_time - self.slew_position) / self.slew_amount;
        let output = self.ring.read_offset_smooth_safe(self.slew_position);
        if !self.freeze {
            self.ring.write(input);
        }
        output
    }

    pub fn process_block(&mut self, input: &[Sample], output: &mut [Sample]) {
        let n = input.len().min(output.len());
        for i in 0..n {
            output[i] = self.process(input[i]);
        }
    }

    pub fn process_for<const N: usize>(&mut self, input: &[Sample; N], output: &mut [Sample; N]) {
        for i in 0..N {
            output[i] = self.process(input[i]);
        }
    }

    /// Target delay time in samples (clamped to capacity).
    pub fn set_time(&mut self, samples: f32) {
        self.delay_time = samples.min(self.ring.capacity() as f32);
    }

    /// Slew length in samples; larger values glide more slowly.
    pub fn set_slew_amount(&mut self, slew_samples: f32) {
        self.slew_amount = slew_samples.max(1.0);
    }

    /// Stop writing and loop the currently held audio.
    pub fn set_freeze(&mut self, freeze: bool) {
        self.freeze = freeze;
    }
}

impl<S: Storage + Default> Default for VarispeedDelay<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mod_delay_without_depth_is_nearly_fixed() {
        // Zero sample depth pins the tap at length-1 (the smooth-offset
        // clamp), so the line behaves as a fixed delay of length-1.
        let mut md = StaticModDelay::<32>::default();
        let mut reference = Delay::<31>::default();
        for n in 0..200 {
            let x = (n % 7) as Sample * 0.1;
            let a = md.process(x);
            let b = reference.process(x);
            assert!((a - b).abs() < 1e-4, "diverged at sample {}", n);
        }
    }

    #[test]
    fn mod_delay_output_is_bounded_under_modulation() {
        let mut md = StaticModDelay::<64>::default();
        md.set_sample_depth(40.0);
        md.set_modulation_rate(0.01);
        for n in 0..5000 {
            let x = if n % 2 == 0 { 0.9 } else { -0.9 };
            let y = md.process(x);
            assert!(y.abs() <= 1.5, "runaway output {} at {}", y, n);
        }
    }

    #[test]
    fn mod_delay_depth_setters_clamp() {
        let mut md = StaticModDelay::<16>::default();
        md.set_sample_depth(1000.0);
        assert!((md.sample_depth - 15.0).abs() < 1e-6);
        md.set_modulation_depth(3.0);
        assert!((md.modulation_depth - 1.0).abs() < 1e-6);
    }

    #[test]
    fn varispeed_reaches_target_delay() {
        let mut vd = StaticVarispeedDelay::<128>::default();
        vd.set_time(20.0);
        vd.set_slew_amount(10.0);
        // Feed an impulse train; after the slew settles the delayed
        // copies arrive 20 samples late.
        let mut last_nonzero = 0;
        for n in 0..500 {
            let x = if n % 100 == 0 { 1.0 } else { 0.0 };
            let y = vd.process(x);
            if n > 200 && y.abs() > 0.5 {
                last_nonzero = n;
            }
        }
        assert!(
            (last_nonzero as i32 - 420).abs() <= 1,
            "delayed impulse at {}",
            last_nonzero
        );
    }

    #[test]
    fn varispeed_freeze_stops_writes() {
        let mut vd = StaticVarispeedDelay::<64>::default();
        vd.set_time(8.0);
        vd.set_slew_amount(1.0);
        for _ in 0..64 {
            vd.process(1.0);
        }
        vd.set_freeze(true);
        // Frozen: input no longer reaches the line, output loops history.
        for _ in 0..64 {
            let y = vd.process(0.0);
            assert!(y > 0.5, "frozen line lost its content: {}", y);
        }
    }
}
