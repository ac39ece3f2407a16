use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

// "trigger this sound offset_ms after the sequence starts"
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    pub sound_id: String,
    pub offset_ms: f64,
}

impl NoteEvent {
    pub fn new(sound_id: impl Into<String>, offset_ms: f64) -> Self {
        Self { sound_id: sound_id.into(), offset_ms }
    }

    pub fn is_schedulable(&self) -> bool {
        self.offset_ms.is_finite() && self.offset_ms >= 0.0
    }
}

// A take: live triggers captured relative to when recording started.
// Offsets come from a monotonic clock so they never go backwards.
#[derive(Clone, Debug)]
pub struct Recording {
    events: Vec<NoteEvent>,
    started_at: Instant,
}

impl Recording {
    pub fn start(now: Instant) -> Self {
        Self { events: Vec::new(), started_at: now }
    }

    // an already-made sequence (e.g. a generated song) adopted as the take
    pub fn from_events(events: Vec<NoteEvent>, now: Instant) -> Self {
        Self { events, started_at: now }
    }

    pub fn push(&mut self, sound_id: &str, now: Instant) {
        let offset_ms = self.elapsed(now).as_secs_f64() * 1000.0;
        self.events.push(NoteEvent::new(sound_id, offset_ms));
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    // offset of the last event, 0 for an empty take
    pub fn duration_ms(&self) -> f64 {
        self.events.last().map_or(0.0, |e| e.offset_ms)
    }
}
