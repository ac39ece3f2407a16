use std::sync::Arc;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio_api::AudioCommand;

mod bus;
mod dsp;
mod engine;
mod envelope;
mod sound;
mod synth;
mod voice;

pub use bus::OutputBus;
pub use sound::{Category, SoundDefinition, SoundRegistry};
pub use synth::Synth;
pub use voice::Voice;

use engine::{Engine, MAX_VOICES};

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    spent: Receiver<Box<Voice>>, // voices the engine is done with
    bus: OutputBus,
    sample_rate: f32,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    pub fn bus(&self) -> &OutputBus {
        &self.bus
    }

    // a synthesizer feeding this handle's engine
    pub fn synth(&self, registry: Arc<SoundRegistry>) -> Synth {
        Synth::new(registry, self.sample_rate, self.tx.clone(), self.spent.clone())
    }
}

pub fn start_audio(gain: f32, command_capacity: usize) -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(command_capacity.max(1));
    let (spent_tx, spent) = crossbeam_channel::bounded::<Box<Voice>>(MAX_VOICES * 2);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate() as f32;
    let channels = config.channels() as usize;
    let bus = OutputBus::new(gain);

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let output_stream = build_output_stream_f32(&device, &config.into(), rx, spent_tx, bus.clone(), channels)?;
            output_stream.play().context("failed to play output stream")?;
            tracing::info!(sample_rate, channels, "audio output started");

            Ok(AudioHandle {
                tx,
                spent,
                bus,
                sample_rate,
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    spent: Sender<Box<Voice>>,
    bus: OutputBus,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(bus, spent);
    let mut scratch: Vec<f32> = Vec::with_capacity(4096); // mono mix, reused every block

    let err_fn = |err| tracing::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }
            engine.render_interleaved(data, channels, &mut scratch);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
