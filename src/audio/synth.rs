use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::audio_api::{AudioCommand, VoiceSink};

use super::sound::{SoundDefinition, SoundRegistry};
use super::voice::{self, Voice};

// The voice synthesizer: looks a sound up, builds its graph and hands it to
// the engine. Fire-and-forget, there is no handle to an in-flight voice.
pub struct Synth {
    registry: Arc<SoundRegistry>,
    sample_rate: f32,
    tx: Sender<AudioCommand>,
    spent: Receiver<Box<Voice>>, // freed here, off the audio thread
    rng: StdRng, // noise buffers
}

impl Synth {
    pub fn new(
        registry: Arc<SoundRegistry>,
        sample_rate: f32,
        tx: Sender<AudioCommand>,
        spent: Receiver<Box<Voice>>,
    ) -> Self {
        Self {
            registry,
            sample_rate,
            tx,
            spent,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn play(&mut self, def: &SoundDefinition) {
        self.spent.try_iter().for_each(drop);
        let v = voice::build(def, self.sample_rate, &mut self.rng);
        tracing::trace!(sound = v.sound_id, secs = v.duration_secs(), "voice built");
        if self.tx.try_send(AudioCommand::Play(Box::new(v))).is_err() {
            // engine is gone or badly behind
            tracing::warn!(sound = def.id, "audio queue full, voice dropped");
        }
    }
}

impl VoiceSink for Synth {
    fn trigger(&mut self, sound_id: &str) -> bool {
        let Some(def) = self.registry.lookup(sound_id).copied() else {
            tracing::debug!(sound = sound_id, "unknown sound id ignored");
            return false;
        };
        self.play(&def);
        true
    }
}
