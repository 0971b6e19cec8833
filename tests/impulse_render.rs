//! Integration tests: drive every effect end-to-end through the
//! controller and check the signal-level contracts.

use vs_master::{frames_to_wav, load_wav, Controller, EffectKind, EffectParams, Frame};

fn stereo_energy(frames: &[Frame]) -> f32 {
    frames
        .iter()
        .map(|f| f.left * f.left + f.right * f.right)
        .sum()
}

#[test]
fn delay_of_capacity_100_delays_by_exactly_100() {
    // A unit impulse into a 100-sample delay line emerges at index 100
    // and nowhere else in [0, 200).
    let mut delay = vs_dsp::Delay::<100>::default();
    for n in 0..200 {
        let input = if n == 0 { 1.0 } else { 0.0 };
        let output = delay.process(input);
        if n == 100 {
            assert_eq!(output, 1.0, "impulse missing at index 100");
        } else {
            assert_eq!(output, 0.0, "leakage at index {}", n);
        }
    }
}

#[test]
fn reverbs_ring_then_decay() {
    let reverbs = [
        EffectKind::SmallRoom,
        EffectKind::MediumRoom,
        EffectKind::LargeRoom,
        EffectKind::Plate,
        EffectKind::Shimmer,
        EffectKind::Fdn,
    ];
    for kind in reverbs {
        let params = EffectParams {
            gain: 0.7,
            dampening: 1.0,
            modulation: 0.5,
        };
        let mut controller = Controller::with_params(kind, 48_000, params);
        let frames = controller.render_impulse(4.0);

        let head = stereo_energy(&frames[..48_000]);
        let tail = stereo_energy(&frames[144_000..]);
        assert!(head > 0.0, "{}: silent first second", kind.name());
        assert!(
            tail < head,
            "{}: tail {} did not decay below head {}",
            kind.name(),
            tail,
            head
        );
        assert!(
            frames
                .iter()
                .all(|f| f.left.is_finite() && f.right.is_finite()),
            "{}: non-finite output",
            kind.name()
        );
    }
}

#[test]
fn modulation_effects_pass_audio_through() {
    for kind in [EffectKind::Chorus, EffectKind::WowFlutter] {
        let mut controller = Controller::new(kind, 48_000);
        let input: Vec<Frame> = (0..48_000)
            .map(|n| Frame::mono((n as f32 * 0.05).sin() * 0.5))
            .collect();
        let output = controller.process_frames(&input);
        assert_eq!(output.len(), input.len());
        let in_energy = stereo_energy(&input);
        let out_energy = stereo_energy(&output);
        assert!(
            out_energy > in_energy * 0.1 && out_energy < in_energy * 10.0,
            "{}: implausible energy ratio {} -> {}",
            kind.name(),
            in_energy,
            out_energy
        );
    }
}

#[test]
fn processed_audio_survives_a_wav_round_trip() {
    let mut controller = Controller::new(EffectKind::Plate, 44_100);
    let input: Vec<Frame> = (0..44_100)
        .map(|n| Frame::mono(if n % 11_025 == 0 { 0.8 } else { 0.0 }))
        .collect();
    let processed = controller.process_frames(&input);
    let wav = frames_to_wav(&processed, 44_100);
    let (decoded, rate) = load_wav(&wav).unwrap();
    assert_eq!(rate, 44_100);
    assert_eq!(decoded.len(), processed.len());
    assert!(stereo_energy(&decoded) > 0.0);
}

#[test]
fn block_and_per_sample_processing_agree() {
    let mut block_plate = vs_fx::PlateReverb::new(48_000.0);
    let mut sample_plate = vs_fx::PlateReverb::new(48_000.0);
    block_plate.set_gain(0.6);
    sample_plate.set_gain(0.6);

    let input: [f32; 512] = core::array::from_fn(|n| if n == 0 { 1.0 } else { 0.0 });
    let mut out_l = [0.0f32; 512];
    let mut out_r = [0.0f32; 512];
    block_plate.process_for(&input, &mut out_l, &mut out_r);

    for (n, &x) in input.iter().enumerate() {
        let (l, r) = sample_plate.process(x);
        assert_eq!(l, out_l[n], "left diverged at {}", n);
        assert_eq!(r, out_r[n], "right diverged at {}", n);
    }
}

#[test]
fn controller_render_is_reproducible_after_reset() {
    let mut controller = Controller::new(EffectKind::LargeRoom, 48_000);
    let first = controller.render_impulse(1.0);
    let second = controller.render_impulse(1.0);
    assert_eq!(first.len(), second.len());
    for (n, (a, b)) in first.iter().zip(second.iter()).enumerate() {
        assert_eq!(a.left, b.left, "left diverged at {}", n);
        assert_eq!(a.right, b.right, "right diverged at {}", n);
    }
}
