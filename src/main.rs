use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use driftwave::audio::{
    AudioCapture, BeatEstimator, CaptureEvent, FeatureConfig, FeatureState, SampleBuffer,
};
use driftwave::debug::SignalInjector;
use driftwave::effects::{Compositor, Preset, PresetBlender, Surface};

#[derive(Parser)]
#[command(about = "Terminal demo: live audio features driving crossfading presets")]
struct Args {
    /// Input device name (default input device if omitted)
    #[arg(long)]
    device: Option<String>,

    /// Path to a JSON configuration file
    #[arg(long)]
    config: Option<String>,

    /// Stop after this many seconds (runs until interrupted if omitted)
    #[arg(long)]
    run_for: Option<f32>,

    /// Clamp per-frame dt to this many seconds
    #[arg(long)]
    max_dt: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    feature: FeatureConfig,
    minimum_duration_s: f32,
    transition_duration_s: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            feature: FeatureConfig::default(),
            minimum_duration_s: 8.0,
            transition_duration_s: 1.0,
        }
    }
}

const METER_WIDTH: usize = 24;

/// A line of terminal output standing in for a render target.
#[derive(Default, Clone)]
struct ConsoleSurface {
    cells: Vec<char>,
}

impl Surface for ConsoleSurface {
    fn activate(&mut self) {
        self.cells.fill(' ');
    }

    fn update_geometry(&mut self, width: u32, _height: u32) {
        self.cells.resize(width as usize, ' ');
    }
}

/// Overwrites output cells with source cells, skipping faint layers.
struct ConsoleCompositor;

impl Compositor<ConsoleSurface> for ConsoleCompositor {
    fn composite(&mut self, source: &ConsoleSurface, alpha: f32, output: &mut ConsoleSurface) {
        for (index, &cell) in source.cells.iter().enumerate() {
            if cell != ' ' && alpha >= 0.5 && index < output.cells.len() {
                output.cells[index] = cell;
            }
        }
    }
}

/// Horizontal bars for the unitized band levels.
struct BandMeterPreset;

impl Preset<ConsoleSurface> for BandMeterPreset {
    fn draw_frame(
        &mut self,
        _samples: &[f32],
        features: &FeatureState,
        _alpha: f32,
        target: &mut ConsoleSurface,
    ) {
        target.activate();
        let bands = [features.bass_u(), features.mid_u(), features.treble_u()];
        let lane = target.cells.len() / bands.len();
        for (band, level) in bands.iter().enumerate() {
            let filled = (level * (lane.saturating_sub(1)) as f32) as usize;
            for i in 0..filled {
                target.cells[band * lane + i] = '#';
            }
        }
    }

    fn update_geometry(&mut self, _width: u32, _height: u32) {}

    fn name(&self) -> &str {
        "band_meter"
    }
}

/// A marker bouncing across the line in time with the estimated beat.
struct BeatSweepPreset {
    estimator: BeatEstimator,
}

impl BeatSweepPreset {
    fn new() -> Self {
        Self {
            estimator: BeatEstimator::new(0.99),
        }
    }
}

impl Preset<ConsoleSurface> for BeatSweepPreset {
    fn draw_frame(
        &mut self,
        _samples: &[f32],
        features: &FeatureState,
        _alpha: f32,
        target: &mut ConsoleSurface,
    ) {
        self.estimator.estimate(features.bass_u(), features.dt());
        target.activate();
        if target.cells.is_empty() {
            return;
        }
        let position =
            (self.estimator.triangle_phase() * (target.cells.len() - 1) as f32) as usize;
        target.cells[position] = 'o';
    }

    fn update_geometry(&mut self, _width: u32, _height: u32) {}

    fn name(&self) -> &str {
        "beat_sweep"
    }
}

fn load_config(args: &Args) -> Result<DemoConfig> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => DemoConfig::default(),
    };
    if let Some(max_dt) = args.max_dt {
        config.feature.max_dt = Some(max_dt);
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut config = load_config(&args)?;

    let buffer = Arc::new(SampleBuffer::new());
    let capture = AudioCapture::new(Arc::clone(&buffer), args.device.as_deref())?;
    config.feature.sampling_rate = capture.sample_rate();
    info!("Capturing at {} Hz", capture.sample_rate());

    let mut features = FeatureState::new(config.feature.clone());
    let mut injector = SignalInjector::new();
    let mut blender: PresetBlender<ConsoleSurface> =
        PresetBlender::new(3 * METER_WIDTH as u32, 1, Box::new(ConsoleCompositor));
    let mut output = ConsoleSurface::default();
    output.update_geometry(3 * METER_WIDTH as u32, 1);

    blender.add_preset(
        Box::new(BandMeterPreset),
        ConsoleSurface::default(),
        config.minimum_duration_s,
        config.transition_duration_s,
    );

    let started = Instant::now();
    let mut last_frame = Instant::now();
    let mut next_preset_is_sweep = true;
    let mut next_rotation = config.minimum_duration_s;

    loop {
        if let Some(run_for) = args.run_for {
            if started.elapsed().as_secs_f32() >= run_for {
                break;
            }
        }

        for event in capture.poll_events() {
            let CaptureEvent::StreamError(message) = event;
            warn!("Capture fault: {}", message);
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        let Some(samples) = buffer.take_samples() else {
            // Nothing buffered yet; skip this frame.
            std::thread::sleep(Duration::from_millis(4));
            continue;
        };

        features.update(&samples, dt);

        // Rotate in the other preset once the current one has had its
        // guaranteed minimum on screen.
        if features.t() >= next_rotation {
            next_rotation = features.t() + config.minimum_duration_s;
            let preset: Box<dyn Preset<ConsoleSurface>> = if next_preset_is_sweep {
                Box::new(BeatSweepPreset::new())
            } else {
                Box::new(BandMeterPreset)
            };
            next_preset_is_sweep = !next_preset_is_sweep;
            blender.add_preset(
                preset,
                ConsoleSurface::default(),
                config.minimum_duration_s,
                config.transition_duration_s,
            );
        }

        blender.draw_frame(&samples, &features, &mut output);

        let power = injector.signal("power", features.power());
        let line: String = output.cells.iter().collect();
        print!(
            "\r[{}] pwr {:>8.5} avg {:>8.5} e {:>8.1}",
            line,
            power,
            injector.signal("average_power", features.average_power()),
            features.normalized_energy().value(),
        );
        use std::io::Write;
        let _ = std::io::stdout().flush();

        std::thread::sleep(Duration::from_millis(16));
    }

    println!();
    info!(
        "Done: {} presets live at exit, {:.1} s audio time",
        blender.num_presets(),
        features.t()
    );
    Ok(())
}
