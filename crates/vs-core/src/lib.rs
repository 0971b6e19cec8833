//! Core types for the verbstack DSP toolkit.
//!
//! This crate defines the sample/frame types, the buffer storage contract
//! that every delay-based processor is bound to, and the small collaborators
//! (one-pole filter, wavetable LFO) the effect topologies consume.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod filter;
mod lfo;
pub mod math;
mod sample;
mod storage;

pub use filter::{FilterMode, OnePole};
pub use lfo::{Lfo, LookupTable, WavetableLfo, Waveform};
pub use sample::{Frame, Sample, MAX_SAMPLE_RATE};
pub use storage::{HeapBuffer, SampleBuffer, Storage};
