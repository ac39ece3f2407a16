use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

// The master volume every voice is mixed through. Written from the control
// side, read by the audio callback once per block; stored as f32 bits so
// neither side ever takes a lock.
#[derive(Clone, Debug)]
pub struct OutputBus {
    gain: Arc<AtomicU32>,
}

impl OutputBus {
    pub fn new(gain: f32) -> Self {
        let bus = Self { gain: Arc::new(AtomicU32::new(0)) };
        bus.set_gain(gain);
        bus
    }

    // clamps into [0, 1]; NaN counts as silence
    pub fn set_gain(&self, value: f32) {
        let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        self.gain.store(v.to_bits(), Ordering::Relaxed);
    }

    pub fn gain(&self) -> f32 {
        f32::from_bits(self.gain.load(Ordering::Relaxed))
    }

    pub fn apply(&self, block: &mut [f32]) {
        let g = self.gain();
        for s in block.iter_mut() {
            *s *= g;
        }
    }
}
