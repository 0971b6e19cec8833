//! Circular delay line over owned sample storage.

use vs_core::math::{interpolate_4_raw, interpolate_4_safe, interpolate_4_wrap, split_pos, wrap_once};
use vs_core::{Sample, Storage};

/// A ring buffer that addresses one [`Storage`] circularly.
///
/// One `write` advances the write index by one, modulo the active
/// `length`; a `read` at the write index performed before the next write
/// yields the sample written exactly `length` samples ago. That is the
/// delay line's defining property, and every processor in this crate is
/// built on it.
///
/// The active `length` may be set at runtime to any value up to the
/// storage capacity; the storage itself is never resized.
#[derive(Clone, Debug)]
pub struct Ring<S: Storage> {
    storage: S,
    write_index: usize,
    length: usize,
}

impl<S: Storage> Ring<S> {
    /// Wrap `storage`, using its full capacity as the active length.
    pub fn new(storage: S) -> Self {
        let length = storage.capacity();
        Self {
            storage,
            write_index: 0,
            length,
        }
    }

    /// Wrap `storage` with an initial active length.
    pub fn with_length(storage: S, length: usize) -> Self {
        let mut ring = Self::new(storage);
        ring.set_length(length);
        ring
    }

    /// Store `input` at the write index and advance it by one.
    pub fn write(&mut self, input: Sample) {
        self.storage.samples_mut()[self.write_index] = input;
        self.increment();
    }

    /// Store `input` at `index` (clamped to the active length) without
    /// moving the write index.
    pub fn write_at(&mut self, input: Sample, index: usize) {
        let index = index.min(self.length - 1);
        self.storage.samples_mut()[index] = input;
    }

    /// The sample at the write index — the value written exactly
    /// `length` samples ago.
    pub fn read(&self) -> Sample {
        self.storage.samples()[self.write_index]
    }

    /// Direct indexed read; `index` is clamped to the active length.
    pub fn read_at(&self, index: usize) -> Sample {
        self.storage.samples()[index.min(self.length - 1)]
    }

    /// The sample `offset` steps behind the write index. The offset is
    /// clamped to `[0, length-1]`, then the position wraps into range.
    pub fn read_offset(&self, offset: usize) -> Sample {
        let offset = offset.min(self.length - 1);
        let pos = wrap_once(
            self.write_index as i32 - offset as i32,
            0,
            self.length as i32,
        );
        self.storage.samples()[pos as usize]
    }

    /// 4-point interpolated read at `read_pos`, folding neighbor indices
    /// into range once. `read_pos` is clamped to `[0, length-1]`.
    pub fn read_at_smooth_safe(&self, read_pos: f32) -> Sample {
        let (index, frac) = self.split_read_pos(read_pos);
        interpolate_4_safe(self.active(), index, frac)
    }

    /// 4-point interpolated read at `read_pos` with true circular
    /// indexing. `read_pos` is clamped to `[0, length-1]`.
    pub fn read_at_smooth_wrap(&self, read_pos: f32) -> Sample {
        let (index, frac) = self.split_read_pos(read_pos);
        interpolate_4_wrap(self.active(), index, frac)
    }

    /// 4-point interpolated read at `read_pos` with no bounds adjustment
    /// of the neighbor indices; the caller guarantees
    /// `read_pos` stays within `[1, length-3]`.
    pub fn read_at_smooth_raw(&self, read_pos: f32) -> Sample {
        let (index, frac) = self.split_read_pos(read_pos);
        interpolate_4_raw(self.active(), index, frac)
    }

    /// 4-point interpolated read `offset` steps behind the write index,
    /// folding neighbor indices into range once.
    pub fn read_offset_smooth_safe(&self, offset: f32) -> Sample {
        let (index, frac) = self.split_offset(offset);
        interpolate_4_safe(self.active(), index, frac)
    }

    /// 4-point interpolated read `offset` steps behind the write index
    /// with true circular indexing. This is the policy for continuously
    /// swept (LFO-modulated) taps.
    pub fn read_offset_smooth_wrap(&self, offset: f32) -> Sample {
        let (index, frac) = self.split_offset(offset);
        interpolate_4_wrap(self.active(), index, frac)
    }

    /// 4-point interpolated read `offset` steps behind the write index
    /// with no bounds adjustment; the caller has already constrained the
    /// offset so all four neighbors are in range.
    pub fn read_offset_smooth_raw(&self, offset: f32) -> Sample {
        let (index, frac) = self.split_offset(offset);
        interpolate_4_raw(self.active(), index, frac)
    }

    /// Advance the write index by one without writing.
    pub fn increment(&mut self) {
        self.write_index += 1;
        if self.write_index >= self.length {
            self.write_index = 0;
        }
    }

    /// Move the write index (clamped to the active length).
    pub fn set_write_index(&mut self, index: usize) {
        self.write_index = index.min(self.length - 1);
    }

    /// Set the loop point for the write index without resizing storage.
    /// Clamped to `[1, capacity]`.
    ///
    /// Resets the write index to 0, so previously delayed content is
    /// effectively garbage for up to `length` samples after the call.
    /// Intended for runtime-configurable lengths set before audio flows.
    pub fn set_length(&mut self, new_length: usize) {
        self.length = new_length.clamp(1, self.storage.capacity());
        self.write_index = 0;
    }

    /// Current write index.
    pub fn index(&self) -> usize {
        self.write_index
    }

    /// Active length in samples.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Capacity of the underlying storage.
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Zero the underlying storage without touching the indices.
    pub fn erase(&mut self) {
        self.storage.erase();
    }

    /// Read the delayed sample, then write `input`: a pure delay of
    /// `length` samples.
    pub fn process(&mut self, input: Sample) -> Sample {
        let output = self.read();
        self.write(input);
        output
    }

    /// Delay a block; processes `min(input.len(), output.len())` samples.
    pub fn process_block(&mut self, input: &[Sample], output: &mut [Sample]) {
        let n = input.len().min(output.len());
        for i in 0..n {
            output[i] = self.process(input[i]);
        }
    }

    /// Delay a fixed-size block.
    pub fn process_for<const N: usize>(&mut self, input: &[Sample; N], output: &mut [Sample; N]) {
        for i in 0..N {
            output[i] = self.process(input[i]);
        }
    }

    /// The active region of the storage. Interpolated reads wrap within
    /// this window, never into stale samples beyond it.
    fn active(&self) -> &[Sample] {
        &self.storage.samples()[..self.length]
    }

    fn split_read_pos(&self, read_pos: f32) -> (i32, f32) {
        split_pos(read_pos.clamp(0.0, self.length as f32 - 1.0))
    }

    fn split_offset(&self, offset: f32) -> (i32, f32) {
        // Four-point reads need two samples of headroom on each side.
        let hi = (self.length as f32 - 1.0).max(2.0);
        let offset = offset.clamp(2.0, hi);
        split_pos(self.write_index as f32 - offset)
    }
}

impl<S: Storage + Default> Default for Ring<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
