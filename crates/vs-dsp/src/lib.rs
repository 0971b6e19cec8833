//! Delay-network processing core for verbstack.
//!
//! A ring buffer with interpolated-read policies, the delay family built
//! on it, and the feedback-allpass family used for diffusion. Every
//! processor owns its storage through a [`vs_core::Storage`] type
//! parameter: the storage is constructed (zeroed) first, the algorithm
//! state after it, and the borrow checker guarantees the algorithm can
//! never outlive the samples it addresses.
//!
//! Nothing here allocates, blocks, or errors once constructed; all index
//! arithmetic saturates or wraps by policy.

#![cfg_attr(not(feature = "std"), no_std)]

mod allpass;
mod delay;
mod ring;

pub use allpass::{
    Allpass, DoubleNestedAllpass, ModAllpass, NestedAllpass, StaticAllpass,
    StaticDoubleNestedAllpass, StaticModAllpass, StaticNestedAllpass,
};
pub use delay::{Delay, HeapDelay, ModDelay, StaticModDelay, StaticVarispeedDelay, VarispeedDelay};
pub use ring::Ring;
