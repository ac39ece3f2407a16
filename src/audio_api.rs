use crate::audio::Voice;

#[derive(Debug)]
pub enum AudioCommand {
    // The engine never builds graphs itself (noise buffers allocate), so the
    // control side builds a complete voice and hands it over here.
    Play(Box<Voice>),
}

// Anything that can sound a sound id right now. The scheduler fires through
// this so it never needs to know about the audio thread.
pub trait VoiceSink {
    // false when the id is unknown; nothing is heard in that case
    fn trigger(&mut self, sound_id: &str) -> bool;
}
