//! Headless controller for verbstack effects.
//!
//! Provides a unified API for choosing an effect, processing audio
//! offline, and live playback, shared by the CLI and any embedding code.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use vs_audio::{AudioOutput, CpalOutput};
use vs_fx::{
    Chorus, Fdn4, LargeRoom, MediumRoom, PlateReverb, ShimmerReverb, SmallRoom, WowFlutter,
};

// Re-export common types so callers don't need the leaf crates directly.
pub use vs_core::{Frame, Sample};
pub use vs_formats::{frames_to_wav, load_wav, write_wav, FormatError};

#[cfg(feature = "alloc_check")]
fn guard_no_alloc<T>(f: impl FnOnce() -> T) -> T {
    assert_no_alloc::assert_no_alloc(f)
}

#[cfg(not(feature = "alloc_check"))]
fn guard_no_alloc<T>(f: impl FnOnce() -> T) -> T {
    f()
}

/// The selectable effect topologies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectKind {
    SmallRoom,
    MediumRoom,
    LargeRoom,
    Plate,
    Shimmer,
    Fdn,
    Chorus,
    WowFlutter,
}

impl EffectKind {
    pub const ALL: [EffectKind; 8] = [
        EffectKind::SmallRoom,
        EffectKind::MediumRoom,
        EffectKind::LargeRoom,
        EffectKind::Plate,
        EffectKind::Shimmer,
        EffectKind::Fdn,
        EffectKind::Chorus,
        EffectKind::WowFlutter,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::SmallRoom => "small-room",
            EffectKind::MediumRoom => "medium-room",
            EffectKind::LargeRoom => "large-room",
            EffectKind::Plate => "plate",
            EffectKind::Shimmer => "shimmer",
            EffectKind::Fdn => "fdn",
            EffectKind::Chorus => "chorus",
            EffectKind::WowFlutter => "wow-flutter",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Construction-time effect parameters.
#[derive(Clone, Copy, Debug)]
pub struct EffectParams {
    /// Feedback gain / decay, 0 to 1.
    pub gain: f32,
    /// Dampening blend, 0 (bright) to 1 (dark).
    pub dampening: f32,
    /// Modulation amount for the modulated-delay effects, 0 to 1.
    pub modulation: f32,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            gain: 0.6,
            dampening: 1.0,
            modulation: 0.5,
        }
    }
}

enum EffectNode {
    SmallRoom(Box<SmallRoom>),
    MediumRoom(Box<MediumRoom>),
    LargeRoom(Box<LargeRoom>),
    Plate(Box<PlateReverb>),
    Shimmer(Box<ShimmerReverb>),
    Fdn(Box<Fdn4>),
    Chorus(Box<Chorus>),
    WowFlutter(Box<WowFlutter>),
}

fn build_node(kind: EffectKind, sample_rate: f32, params: EffectParams) -> EffectNode {
    match kind {
        EffectKind::SmallRoom => {
            let mut room = Box::new(SmallRoom::new(sample_rate));
            room.set_gain(params.gain);
            room.set_dampening(params.dampening);
            EffectNode::SmallRoom(room)
        }
        EffectKind::MediumRoom => {
            let mut room = Box::new(MediumRoom::new(sample_rate));
            room.set_gain(params.gain);
            room.set_dampening(params.dampening);
            EffectNode::MediumRoom(room)
        }
        EffectKind::LargeRoom => {
            let mut room = Box::new(LargeRoom::new(sample_rate));
            room.set_gain(params.gain);
            room.set_dampening(params.dampening);
            EffectNode::LargeRoom(room)
        }
        EffectKind::Plate => {
            let mut plate = Box::new(PlateReverb::new(sample_rate));
            plate.set_gain(params.gain);
            EffectNode::Plate(plate)
        }
        EffectKind::Shimmer => {
            let mut shimmer = Box::new(ShimmerReverb::new(sample_rate));
            shimmer.set_gain(params.gain);
            EffectNode::Shimmer(shimmer)
        }
        EffectKind::Fdn => {
            let mut fdn = Box::new(Fdn4::new(sample_rate));
            fdn.set_decay(params.gain);
            fdn.set_dampening(6500.0 * (1.0 - params.dampening * 0.5));
            EffectNode::Fdn(fdn)
        }
        EffectKind::Chorus => {
            let mut chorus = Box::new(Chorus::new(sample_rate));
            chorus.set_modulation_amount(params.modulation);
            chorus.set_modulation_rate(2.0);
            EffectNode::Chorus(chorus)
        }
        EffectKind::WowFlutter => {
            let mut fx = Box::new(WowFlutter::new(sample_rate));
            fx.set_modulation_amount(params.modulation);
            EffectNode::WowFlutter(fx)
        }
    }
}

impl EffectNode {
    fn process_frame(&mut self, frame: Frame) -> Frame {
        match self {
            EffectNode::SmallRoom(fx) => {
                let (left, right) = fx.process(frame.left, frame.right);
                Frame { left, right }
            }
            EffectNode::MediumRoom(fx) => {
                let (left, right) = fx.process(frame.left, frame.right);
                Frame { left, right }
            }
            EffectNode::LargeRoom(fx) => {
                let (left, right) = fx.process(frame.left, frame.right);
                Frame { left, right }
            }
            EffectNode::Fdn(fx) => {
                let (left, right) = fx.process(frame.left, frame.right);
                Frame { left, right }
            }
            EffectNode::Plate(fx) => {
                let (left, right) = fx.process(frame.to_mono());
                Frame { left, right }
            }
            EffectNode::Shimmer(fx) => {
                let (left, right) = fx.process(frame.to_mono());
                Frame { left, right }
            }
            EffectNode::Chorus(fx) => {
                let (left, right) = fx.process(frame.to_mono());
                Frame { left, right }
            }
            EffectNode::WowFlutter(fx) => Frame::mono(fx.process(frame.to_mono())),
        }
    }
}

/// Headless effect controller — owns one effect instance and manages
/// offline rendering and live playback.
pub struct Controller {
    kind: EffectKind,
    params: EffectParams,
    sample_rate: u32,
    node: EffectNode,
    playback: Option<PlaybackHandle>,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Controller {
    pub fn new(kind: EffectKind, sample_rate: u32) -> Self {
        Self::with_params(kind, sample_rate, EffectParams::default())
    }

    pub fn with_params(kind: EffectKind, sample_rate: u32, params: EffectParams) -> Self {
        Self {
            kind,
            params,
            sample_rate,
            node: build_node(kind, sample_rate as f32, params),
            playback: None,
        }
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn params(&self) -> EffectParams {
        self.params
    }

    /// Rebuild the effect with new parameters, discarding its state.
    pub fn set_params(&mut self, params: EffectParams) {
        self.params = params;
        self.node = build_node(self.kind, self.sample_rate as f32, params);
    }

    /// Discard the effect's state (silences any decaying tail).
    pub fn reset(&mut self) {
        self.node = build_node(self.kind, self.sample_rate as f32, self.params);
    }

    // --- Offline rendering ---

    /// Process one stereo frame through the effect.
    pub fn process_frame(&mut self, frame: Frame) -> Frame {
        self.node.process_frame(frame)
    }

    /// Process a buffer of frames. The output buffer is allocated up
    /// front; the per-frame loop itself is allocation-free.
    pub fn process_frames(&mut self, input: &[Frame]) -> Vec<Frame> {
        let mut output = Vec::with_capacity(input.len());
        guard_no_alloc(|| {
            for frame in input {
                output.push(self.node.process_frame(*frame));
            }
        });
        output
    }

    /// Render the effect's impulse response for `seconds`.
    pub fn render_impulse(&mut self, seconds: f32) -> Vec<Frame> {
        self.reset();
        let len = (self.sample_rate as f32 * seconds) as usize;
        let mut output = Vec::with_capacity(len);
        guard_no_alloc(|| {
            for n in 0..len {
                let input = if n == 0 { Frame::mono(1.0) } else { Frame::silence() };
                output.push(self.node.process_frame(input));
            }
        });
        output
    }

    /// Process frames and encode the result as a 16-bit stereo WAV.
    pub fn render_to_wav(&mut self, input: &[Frame]) -> Vec<u8> {
        let output = self.process_frames(input);
        frames_to_wav(&output, self.sample_rate)
    }

    // --- Real-time playback ---

    /// Play `input` through a fresh effect instance on the default audio
    /// device, then let the tail ring out. Returns immediately.
    pub fn play(&mut self, input: Vec<Frame>) {
        self.stop();

        let stop_signal = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let kind = self.kind;
        let params = self.params;
        let stop = stop_signal.clone();
        let done = finished.clone();

        let thread = std::thread::spawn(move || {
            audio_thread(kind, params, input, stop, done);
        });

        self.playback = Some(PlaybackHandle {
            stop_signal,
            finished,
            thread: Some(thread),
        });
    }

    pub fn stop(&mut self) {
        if let Some(mut playback) = self.playback.take() {
            playback.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = playback.thread.take() {
                let _ = handle.join();
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Relaxed))
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn audio_thread(
    kind: EffectKind,
    params: EffectParams,
    input: Vec<Frame>,
    stop_signal: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
) {
    let Ok((mut output, consumer)) = CpalOutput::new() else {
        finished.store(true, Ordering::Relaxed);
        return;
    };

    // The device dictates the rate, so the effect is rebuilt against it.
    let sample_rate = output.sample_rate();
    let mut node = build_node(kind, sample_rate as f32, params);

    if output.build_stream(consumer).is_err() {
        finished.store(true, Ordering::Relaxed);
        return;
    }
    let _ = output.start();

    for frame in &input {
        if stop_signal.load(Ordering::Relaxed) {
            break;
        }
        output.write_spin(node.process_frame(*frame));
    }

    // Let the tail ring out for two seconds of silence.
    for _ in 0..sample_rate * 2 {
        if stop_signal.load(Ordering::Relaxed) {
            break;
        }
        output.write_spin(node.process_frame(Frame::silence()));
    }

    finished.store(true, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_round_trips_by_name() {
        for kind in EffectKind::ALL {
            assert_eq!(EffectKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(EffectKind::from_name("spring"), None);
    }

    #[test]
    fn every_kind_renders_a_nonsilent_impulse() {
        for kind in EffectKind::ALL {
            let mut controller = Controller::new(kind, 48_000);
            let frames = controller.render_impulse(1.0);
            assert_eq!(frames.len(), 48_000);
            let energy: f32 = frames
                .iter()
                .map(|f| f.left * f.left + f.right * f.right)
                .sum();
            assert!(energy > 0.0, "{} rendered silence", kind.name());
            assert!(
                frames
                    .iter()
                    .all(|f| f.left.abs() < 10.0 && f.right.abs() < 10.0),
                "{} rendered out-of-range samples",
                kind.name()
            );
        }
    }

    #[test]
    fn reset_silences_the_tail() {
        let mut controller = Controller::new(EffectKind::Plate, 48_000);
        controller.process_frame(Frame::mono(1.0));
        for _ in 0..4_800 {
            controller.process_frame(Frame::silence());
        }
        controller.reset();
        let mut energy = 0.0f32;
        for _ in 0..9_600 {
            let out = controller.process_frame(Frame::silence());
            energy += out.left * out.left + out.right * out.right;
        }
        assert_eq!(energy, 0.0);
    }

    #[test]
    fn render_to_wav_produces_a_parsable_file() {
        let mut controller = Controller::new(EffectKind::SmallRoom, 44_100);
        let input: Vec<Frame> = (0..4_410)
            .map(|n| Frame::mono(if n == 0 { 0.9 } else { 0.0 }))
            .collect();
        let wav = controller.render_to_wav(&input);
        let (decoded, rate) = load_wav(&wav).unwrap();
        assert_eq!(rate, 44_100);
        assert_eq!(decoded.len(), 4_410);
    }
}
