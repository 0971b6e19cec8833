//! Effect topologies: fixed wirings of delays, allpasses, and dampening
//! filters into complete reverberators and modulated-delay effects.
//!
//! Every topology owns all of its delay lines; capacities are sized for
//! [`vs_core::MAX_SAMPLE_RATE`] at compile time and the active lengths
//! are set once at construction from the runtime sample rate. Nothing
//! allocates or errors after construction.

#![cfg_attr(not(feature = "std"), no_std)]

mod diffuser;
mod fdn;
mod modfx;
mod plate;
mod room;
mod shimmer;
mod units;

pub use diffuser::{Diffuser4, Diffuser6};
pub use fdn::Fdn4;
pub use modfx::{Chorus, WowFlutter};
pub use plate::PlateReverb;
pub use room::{LargeRoom, MediumRoom, SmallRoom};
pub use shimmer::ShimmerReverb;
