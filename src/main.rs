//! verbstack CLI — run audio through an effect, live or to a WAV file.
//!
//! Usage:
//!   vs-cli <effect> [input.wav] [options]
//!
//! With no input file an impulse is rendered, which makes the tool a
//! quick impulse-response probe for every topology.
//!
//! Options:
//!   --wav <out.wav>     render offline to a file instead of playing
//!   --gain <0..1>       feedback gain / decay (default 0.6)
//!   --dampening <0..1>  dampening blend (default 1.0)
//!   --modulation <0..1> modulation amount (default 0.5)
//!   --seconds <n>       impulse render length (default 4)

use std::{env, fs};

use vs_master::{load_wav, Controller, EffectKind, EffectParams, Frame};

fn main() {
    let args: Vec<String> = env::args().collect();
    let Some(effect_name) = args.get(1) else {
        usage();
        std::process::exit(1);
    };

    let Some(kind) = EffectKind::from_name(effect_name) else {
        eprintln!("Unknown effect: {}", effect_name);
        usage();
        std::process::exit(1);
    };

    let input_path = args.get(2).filter(|a| !a.starts_with("--")).cloned();
    let wav_path = flag_value(&args, "--wav");
    let seconds: f32 = flag_value(&args, "--seconds")
        .and_then(|s| s.parse().ok())
        .unwrap_or(4.0);

    let mut params = EffectParams::default();
    if let Some(gain) = flag_value(&args, "--gain").and_then(|s| s.parse().ok()) {
        params.gain = gain;
    }
    if let Some(dampening) = flag_value(&args, "--dampening").and_then(|s| s.parse().ok()) {
        params.dampening = dampening;
    }
    if let Some(modulation) = flag_value(&args, "--modulation").and_then(|s| s.parse().ok()) {
        params.modulation = modulation;
    }

    let (input, sample_rate) = match &input_path {
        Some(path) => {
            let data = fs::read(path).unwrap_or_else(|e| {
                eprintln!("Failed to read {}: {}", path, e);
                std::process::exit(1);
            });
            let (frames, rate) = load_wav(&data).unwrap_or_else(|e| {
                eprintln!("Failed to parse {}: {}", path, e);
                std::process::exit(1);
            });
            (Some(frames), rate)
        }
        None => (None, 48_000),
    };

    let mut controller = Controller::with_params(kind, sample_rate, params);

    println!("Effect:     {}", kind.name());
    println!("Rate:       {} Hz", sample_rate);
    println!(
        "Params:     gain {:.2}, dampening {:.2}, modulation {:.2}",
        params.gain, params.dampening, params.modulation
    );
    if let Some(path) = &input_path {
        println!("Input:      {}", path);
    } else {
        println!("Input:      impulse ({} s render)", seconds);
    }
    println!();

    match wav_path {
        Some(out_path) => render_to_wav(&mut controller, input, seconds, &out_path),
        None => play_audio(&mut controller, input, seconds),
    }
}

fn usage() {
    eprintln!("Usage: vs-cli <effect> [input.wav] [--wav out.wav] [--gain g] [--dampening d] [--modulation m] [--seconds n]");
    eprint!("Effects:");
    for kind in EffectKind::ALL {
        eprint!(" {}", kind.name());
    }
    eprintln!();
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn render_to_wav(controller: &mut Controller, input: Option<Vec<Frame>>, seconds: f32, path: &str) {
    println!("Rendering to {}...", path);
    let wav = match input {
        Some(frames) => controller.render_to_wav(&frames),
        None => {
            let frames = controller.render_impulse(seconds);
            vs_master::frames_to_wav(&frames, controller.sample_rate())
        }
    };
    println!("Rendered {} bytes", wav.len());

    fs::write(path, &wav).unwrap_or_else(|e| {
        eprintln!("Failed to write {}: {}", path, e);
        std::process::exit(1);
    });

    println!("Done.");
}

fn play_audio(controller: &mut Controller, input: Option<Vec<Frame>>, seconds: f32) {
    let frames = input.unwrap_or_else(|| {
        let len = (controller.sample_rate() as f32 * seconds) as usize;
        (0..len)
            .map(|n| {
                if n == 0 {
                    Frame::mono(0.9)
                } else {
                    Frame::silence()
                }
            })
            .collect()
    });

    controller.play(frames);
    println!("Playing...");

    while controller.is_playing() {
        std::thread::sleep(std::time::Duration::from_millis(50));
    }

    println!("Done.");
}
