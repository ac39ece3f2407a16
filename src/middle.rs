// The soundboard itself: one place that owns the transport, the synth, the
// master volume and the current generated song. The front-end feeds it
// InputEvents (or calls the methods directly) and ticks it with the clock.

use std::time::Instant;

use rand::rngs::StdRng;

use crate::audio::OutputBus;
use crate::audio_api::VoiceSink;
use crate::pipeline::outline::{acquire_outline, OutlineSource, SongOutlineProvider};
use crate::pipeline::{compose, GeneratedSong, NoteEvent, NoteScheduler, Recording, TransportError, TransportStatus};
use crate::shared::{InputEvent, StatusLine, VOLUME_STEP};

pub struct Middle<S: VoiceSink> {
    scheduler: NoteScheduler,
    sink: S,
    bus: OutputBus,
    provider: Box<dyn SongOutlineProvider>,
    rng: StdRng, // composer randomness
    song: Option<GeneratedSong>,
    message: String,
}

impl<S: VoiceSink> Middle<S> {
    pub fn new(sink: S, bus: OutputBus, provider: Box<dyn SongOutlineProvider>, rng: StdRng) -> Self {
        Self {
            scheduler: NoteScheduler::new(),
            sink,
            bus,
            provider,
            rng,
            song: None,
            message: String::new(),
        }
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn status(&self) -> TransportStatus {
        self.scheduler.status()
    }

    #[cfg(test)]
    pub fn song(&self) -> Option<&GeneratedSong> {
        self.song.as_ref()
    }

    pub fn recording(&self) -> Option<&Recording> {
        self.scheduler.recording()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    // the trigger surface: unknown ids do nothing
    pub fn trigger(&mut self, sound_id: &str, now: Instant) -> bool {
        self.scheduler.on_live_trigger(sound_id, now, &mut self.sink)
    }

    pub fn start_recording(&mut self, now: Instant) -> Result<(), TransportError> {
        self.scheduler.start_recording(now)
    }

    pub fn stop_recording(&mut self) -> Option<Recording> {
        self.scheduler.stop_recording().cloned()
    }

    pub fn play_recording(&mut self, now: Instant) -> Result<(), TransportError> {
        self.scheduler.play_recording(now).map(|_| ())
    }

    pub fn start_playback(&mut self, events: &[NoteEvent], now: Instant) -> Result<(), TransportError> {
        self.scheduler.start_playback(events, now).map(|_| ())
    }

    pub fn stop(&mut self) -> usize {
        self.scheduler.stop()
    }

    // forget the take and anything still scheduled
    pub fn clear(&mut self) {
        self.scheduler.clear_recording();
    }

    pub fn set_volume(&self, value: f32) {
        self.bus.set_gain(value);
    }

    pub fn volume(&self) -> f32 {
        self.bus.gain()
    }

    pub fn generate_song(&mut self, style: &str) -> (&GeneratedSong, OutlineSource) {
        let (structure, source) = acquire_outline(self.provider.as_ref(), style);
        let song = compose(&structure, &mut self.rng);
        tracing::info!(
            style,
            ?source,
            beats = structure.total_beats(),
            bpm = song.bpm,
            notes = song.notes.len(),
            seconds = song.total_duration_ms / 1000.0,
            "song generated"
        );
        let song: &GeneratedSong = self.song.insert(song);
        (song, source)
    }

    pub fn play_song(&mut self, now: Instant) -> Result<(), TransportError> {
        let song = self.song.as_ref().ok_or(TransportError::NothingToPlay)?;
        self.scheduler.start_song(song, now).map(|_| ())
    }

    // the generated song's notes become the take
    pub fn save_song(&mut self, now: Instant) -> Result<(), TransportError> {
        let song = self.song.as_ref().ok_or(TransportError::NothingToPlay)?;
        self.scheduler.adopt(song.notes.clone(), now)
    }

    pub fn tick(&mut self, now: Instant) -> usize {
        self.scheduler.tick(now, &mut self.sink)
    }

    // returns false once the user asked to quit
    pub fn handle_input(&mut self, event: InputEvent, now: Instant) -> bool {
        let result = match event {
            InputEvent::Quit => return false,
            InputEvent::Trigger(id) => {
                self.trigger(id, now);
                return true;
            }
            InputEvent::ToggleRecord => match self.status() {
                TransportStatus::Recording => {
                    let n = self.stop_recording().map_or(0, |r| r.len());
                    self.message = format!("recorded {n} notes");
                    Ok(())
                }
                _ => self.start_recording(now).map(|_| self.message = "recording".into()),
            },
            InputEvent::PlayRecording => self.play_recording(now).map(|_| self.message = "playing take".into()),
            InputEvent::Stop => {
                self.stop();
                self.message = "stopped".into();
                Ok(())
            }
            InputEvent::Clear => {
                self.clear();
                self.message = "cleared".into();
                Ok(())
            }
            InputEvent::VolumeUp => {
                self.set_volume(self.volume() + VOLUME_STEP);
                Ok(())
            }
            InputEvent::VolumeDown => {
                self.set_volume(self.volume() - VOLUME_STEP);
                Ok(())
            }
            InputEvent::Generate(style) => {
                let (song, source) = self.generate_song(style);
                let msg = match source {
                    OutlineSource::Provider => format!("{style}: {} notes", song.notes.len()),
                    OutlineSource::Fallback => format!("{style}: {} notes (preset)", song.notes.len()),
                };
                self.message = msg;
                Ok(())
            }
            InputEvent::PlaySong => self.play_song(now).map(|_| self.message = "playing song".into()),
            InputEvent::SaveSong => self.save_song(now).map(|_| self.message = "song saved as take".into()),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "transport request ignored");
            self.message = e.to_string();
        }
        true
    }

    pub fn status_line(&self, now: Instant) -> StatusLine {
        let transport = match self.status() {
            TransportStatus::Idle => "IDLE",
            TransportStatus::Recording => "REC",
            TransportStatus::Playing => "PLAY",
        };
        let take_len = match self.status() {
            TransportStatus::Recording => self.scheduler.live_events(),
            _ => self.recording().map_or(0, Recording::len),
        };
        let take_secs = match self.scheduler.recording_elapsed(now) {
            Some(elapsed) => elapsed.as_secs_f32(),
            None => (self.recording().map_or(0.0, |r| r.duration_ms()) / 1000.0) as f32,
        };
        StatusLine {
            transport,
            volume: self.volume(),
            take_len,
            take_secs,
            position_secs: self.scheduler.position(now).map(|d| d.as_secs_f32()),
            song: self.song.as_ref().map(|s| format!("{} ({} bpm)", s.description, s.bpm)),
            message: self.message.clone(),
        }
    }
}
