use crossbeam_channel::Sender;

use crate::audio_api::AudioCommand;

use super::bus::OutputBus;
use super::voice::Voice;

pub const MAX_VOICES: usize = 64; // hard cap so the voice list never reallocates in the callback

pub struct Engine {
    voices: Vec<Box<Voice>>, // oldest first
    bus: OutputBus,
    spent: Sender<Box<Voice>>, // finished voices go back to be freed off the audio thread
}

impl Engine {
    pub fn new(bus: OutputBus, spent: Sender<Box<Voice>>) -> Self {
        Self {
            voices: Vec::with_capacity(MAX_VOICES),
            bus,
            spent,
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            // a voice starts on the first block after it arrives
            AudioCommand::Play(voice) => {
                if self.voices.len() == MAX_VOICES {
                    // full: the oldest voice is cut off
                    let oldest = self.voices.remove(0);
                    self.release(oldest);
                }
                self.voices.push(voice);
            }
        }
    }

    #[cfg(test)]
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    // fills `out` (mono) with the mix of every live voice through the bus gain
    pub fn render_block(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        for v in &mut self.voices {
            v.render_into(out);
        }
        let mut i = 0;
        while i < self.voices.len() {
            if self.voices[i].finished() {
                let done = self.voices.remove(i);
                self.release(done);
            } else {
                i += 1;
            }
        }
        self.bus.apply(out);
    }

    // interleaved device buffer; every channel gets the same mono mix
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize, scratch: &mut Vec<f32>) {
        let channels = channels.max(1);
        let n_frames = data.len() / channels;
        scratch.resize(n_frames, 0.0);
        self.render_block(&mut scratch[..]);
        for (frame, &s) in data.chunks_exact_mut(channels).zip(scratch.iter()) {
            frame.fill(s);
        }
    }

    // Only if the control side is gone or far behind does a voice get freed here.
    fn release(&self, voice: Box<Voice>) {
        let _ = self.spent.try_send(voice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::Receiver;
    use crate::audio::sound::SoundRegistry;
    use crate::audio::voice;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SR: f32 = 8000.0;

    fn engine(gain: f32) -> (Engine, Receiver<Box<Voice>>) {
        let (tx, rx) = crossbeam_channel::bounded(MAX_VOICES * 2);
        (Engine::new(OutputBus::new(gain), tx), rx)
    }

    fn play(engine: &mut Engine, id: &str) {
        let reg = SoundRegistry::builtin();
        let mut rng = StdRng::seed_from_u64(9);
        let v = voice::build(reg.lookup(id).unwrap(), SR, &mut rng);
        engine.handle_cmd(AudioCommand::Play(Box::new(v)));
    }

    #[test]
    fn finished_voices_are_released() {
        let (mut engine, spent) = engine(1.0);
        play(&mut engine, "hihat1"); // 400 frames
        play(&mut engine, "kick1"); // 4000 frames
        assert_eq!(engine.active_voices(), 2);
        let mut block = vec![0.0f32; 512];
        engine.render_block(&mut block);
        assert_eq!(engine.active_voices(), 1);
        assert_eq!(spent.try_recv().map(|v| v.sound_id), Ok("hihat1"));
        for _ in 0..8 {
            engine.render_block(&mut block);
        }
        assert_eq!(engine.active_voices(), 0);
        assert_eq!(spent.try_recv().map(|v| v.sound_id), Ok("kick1"));
        engine.render_block(&mut block);
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn zero_gain_is_silent_but_voices_still_run() {
        let (spent_tx, _spent) = crossbeam_channel::bounded(4);
        let bus = OutputBus::new(0.0);
        let mut engine = Engine::new(bus.clone(), spent_tx);
        play(&mut engine, "bass1");
        let mut block = vec![0.0f32; 256];
        engine.render_block(&mut block);
        assert!(block.iter().all(|&s| s == 0.0));
        assert_eq!(engine.active_voices(), 1);

        bus.set_gain(1.0);
        engine.render_block(&mut block);
        assert!(block.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn interleaved_copies_mono_to_every_channel() {
        let (mut engine, _spent) = engine(1.0);
        play(&mut engine, "synth3");
        let mut data = vec![0.0f32; 2 * 128];
        let mut scratch = Vec::new();
        engine.render_interleaved(&mut data, 2, &mut scratch);
        assert_eq!(scratch.len(), 128);
        for frame in data.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert!(data.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn voice_count_is_capped_oldest_first() {
        let (mut engine, spent) = engine(1.0);
        play(&mut engine, "crash");
        for _ in 0..MAX_VOICES {
            play(&mut engine, "pad1");
        }
        assert_eq!(engine.active_voices(), MAX_VOICES);
        assert_eq!(spent.try_recv().map(|v| v.sound_id), Ok("crash"));
        assert!(spent.try_recv().is_err());
    }

    #[test]
    fn release_never_blocks_when_nobody_collects() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        drop(rx);
        let mut engine = Engine::new(OutputBus::new(1.0), tx);
        play(&mut engine, "hihat1");
        let mut block = vec![0.0f32; 1024];
        engine.render_block(&mut block);
        assert_eq!(engine.active_voices(), 0);
    }
}
