// Records live triggers and plays note lists back on a timer queue.
//
// Time never advances by itself here: every call takes `now`, and `tick`
// fires whatever has come due. The front-end loop calls `tick` with the real
// clock; tests hand in synthetic instants.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::audio_api::VoiceSink;

use super::note::{NoteEvent, Recording};
use super::song::GeneratedSong;
use super::timer::{PlaybackId, TimerQueue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportStatus {
    Idle,
    Recording,
    Playing,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport is busy ({0:?})")]
    Busy(TransportStatus),
    #[error("nothing to play")]
    NothingToPlay,
}

// what a fired timer does
#[derive(Debug)]
enum Cue {
    Note(String),
    End, // a song's tail, so playback lasts its full length
}

#[derive(Debug)]
struct Playback {
    id: PlaybackId,
    started_at: Instant,
}

// one state at a time, with the data that only makes sense in it
#[derive(Debug)]
enum State {
    Idle,
    Recording(Recording),
    Playing(Playback),
}

pub struct NoteScheduler {
    state: State,
    timers: TimerQueue<Cue>,
    take: Option<Recording>, // the last finished (or adopted) recording
    next_playback: u64,
}

impl NoteScheduler {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            timers: TimerQueue::new(),
            take: None,
            next_playback: 0,
        }
    }

    pub fn status(&self) -> TransportStatus {
        match self.state {
            State::Idle => TransportStatus::Idle,
            State::Recording(_) => TransportStatus::Recording,
            State::Playing(_) => TransportStatus::Playing,
        }
    }

    // the finished take, if any
    pub fn recording(&self) -> Option<&Recording> {
        self.take.as_ref()
    }

    // events captured so far in an in-progress recording
    pub fn live_events(&self) -> usize {
        match &self.state {
            State::Recording(rec) => rec.len(),
            _ => 0,
        }
    }

    // how long the in-progress recording has been running
    pub fn recording_elapsed(&self, now: Instant) -> Option<Duration> {
        match &self.state {
            State::Recording(rec) => Some(rec.elapsed(now)),
            _ => None,
        }
    }

    pub fn start_recording(&mut self, now: Instant) -> Result<(), TransportError> {
        if let State::Playing(_) = self.state {
            return Err(TransportError::Busy(TransportStatus::Playing));
        }
        self.take = None;
        self.state = State::Recording(Recording::start(now));
        tracing::debug!("recording started");
        Ok(())
    }

    // Plays the sound now; while recording it is also captured. Unknown ids
    // are neither heard nor recorded.
    pub fn on_live_trigger(&mut self, sound_id: &str, now: Instant, sink: &mut dyn VoiceSink) -> bool {
        let known = sink.trigger(sound_id);
        if known {
            if let State::Recording(rec) = &mut self.state {
                rec.push(sound_id, now);
            }
        }
        known
    }

    pub fn stop_recording(&mut self) -> Option<&Recording> {
        if !matches!(self.state, State::Recording(_)) {
            return None;
        }
        if let State::Recording(rec) = std::mem::replace(&mut self.state, State::Idle) {
            tracing::debug!(events = rec.len(), "recording stopped");
            self.take = Some(rec);
        }
        self.take.as_ref()
    }

    // Makes `events` the current take, as if they had been recorded.
    pub fn adopt(&mut self, events: Vec<NoteEvent>, now: Instant) -> Result<(), TransportError> {
        if let State::Recording(_) = self.state {
            return Err(TransportError::Busy(TransportStatus::Recording));
        }
        self.take = Some(Recording::from_events(events, now));
        Ok(())
    }

    pub fn clear_recording(&mut self) {
        self.stop();
        self.take = None;
    }

    // Replays the finished take.
    pub fn play_recording(&mut self, now: Instant) -> Result<PlaybackId, TransportError> {
        let events = match &self.take {
            Some(rec) if !rec.is_empty() => rec.events().to_vec(),
            _ => return Err(TransportError::NothingToPlay),
        };
        self.start_playback(&events, now)
    }

    // Schedules every event relative to `now` and returns immediately. A
    // playback already running is replaced.
    pub fn start_playback(&mut self, events: &[NoteEvent], now: Instant) -> Result<PlaybackId, TransportError> {
        if events.is_empty() {
            return Err(TransportError::NothingToPlay);
        }
        self.schedule(events, None, now)
    }

    // Like `start_playback`, but the playback lasts the song's full length
    // even if the last note comes earlier.
    pub fn start_song(&mut self, song: &GeneratedSong, now: Instant) -> Result<PlaybackId, TransportError> {
        if song.notes.is_empty() && song.total_duration_ms <= 0.0 {
            return Err(TransportError::NothingToPlay);
        }
        self.schedule(&song.notes, Some(song.total_duration_ms), now)
    }

    fn schedule(&mut self, events: &[NoteEvent], end_ms: Option<f64>, now: Instant) -> Result<PlaybackId, TransportError> {
        if let State::Recording(_) = self.state {
            return Err(TransportError::Busy(TransportStatus::Recording));
        }
        self.stop();

        let id = PlaybackId(self.next_playback);
        self.next_playback += 1;

        let mut scheduled = 0usize;
        for e in events {
            let Some(due) = due_at(now, e.offset_ms).filter(|_| e.is_schedulable()) else {
                tracing::warn!(sound = %e.sound_id, offset_ms = e.offset_ms, "skipping note with bad offset");
                continue;
            };
            self.timers.schedule(due, id, Cue::Note(e.sound_id.clone()));
            scheduled += 1;
        }
        if let Some(end) = end_ms.filter(|e| *e > 0.0) {
            match due_at(now, end) {
                Some(due) => self.timers.schedule(due, id, Cue::End),
                None => tracing::warn!(end_ms = end, "song length out of range, ending with its last note"),
            }
        }
        if self.timers.pending(id) == 0 {
            return Err(TransportError::NothingToPlay);
        }

        self.state = State::Playing(Playback { id, started_at: now });
        tracing::info!(playback = id.0, notes = scheduled, "playback started");
        Ok(id)
    }

    // Cancels every pending note of the current playback. Voices already
    // sounding decay on their own. Returns how many notes were dropped; a
    // no-op (0) when nothing is playing.
    pub fn stop(&mut self) -> usize {
        let State::Playing(p) = &self.state else {
            return 0;
        };
        let dropped = self.timers.cancel(p.id);
        tracing::info!(playback = p.id.0, dropped, "playback stopped");
        self.state = State::Idle;
        dropped
    }

    // Fires every cue due at `now`, in order. Returns how many notes fired.
    pub fn tick(&mut self, now: Instant, sink: &mut dyn VoiceSink) -> usize {
        let mut fired = 0;
        while let Some((_, cue)) = self.timers.pop_due(now) {
            if let Cue::Note(sound_id) = cue {
                // an unknown id only skips itself
                sink.trigger(&sound_id);
                fired += 1;
            }
        }
        if let State::Playing(p) = &self.state {
            if self.timers.pending(p.id) == 0 {
                tracing::info!(playback = p.id.0, "playback finished");
                self.state = State::Idle;
            }
        }
        fired
    }

    // how far into the current playback we are
    pub fn position(&self, now: Instant) -> Option<Duration> {
        match &self.state {
            State::Playing(p) => Some(now.saturating_duration_since(p.started_at)),
            _ => None,
        }
    }

    // when `tick` next has something to do
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_due()
    }
}

impl Default for NoteScheduler {
    fn default() -> Self {
        Self::new()
    }
}

// None for offsets that are negative, not finite, or past what Instant can hold
fn due_at(now: Instant, offset_ms: f64) -> Option<Instant> {
    let offset = Duration::try_from_secs_f64(offset_ms / 1000.0).ok()?;
    now.checked_add(offset)
}
