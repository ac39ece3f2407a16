use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

// Identifies one playback invocation; every timer it schedules carries it so
// the whole invocation can be cancelled at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlaybackId(pub u64);

struct Entry<T> {
    due: Instant,
    seq: u64,
    owner: PlaybackId,
    payload: T,
}

// BinaryHeap is a max-heap; invert so the earliest (then oldest) entry is on top
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.due.cmp(&self.due).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

// Deferred callbacks on one logical queue. Nothing fires by itself: the
// owner polls `pop_due` with the current time. Equal due times pop in the
// order they were scheduled.
pub struct TimerQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new(), next_seq: 0 }
    }

    pub fn schedule(&mut self, due: Instant, owner: PlaybackId, payload: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { due, seq, owner, payload });
    }

    pub fn pop_due(&mut self, now: Instant) -> Option<(PlaybackId, T)> {
        if self.heap.peek()?.due > now {
            return None;
        }
        self.heap.pop().map(|e| (e.owner, e.payload))
    }

    // removes every not-yet-fired timer of `owner`, returns how many
    pub fn cancel(&mut self, owner: PlaybackId) -> usize {
        let before = self.heap.len();
        self.heap.retain(|e| e.owner != owner);
        before - self.heap.len()
    }

    pub fn pending(&self, owner: PlaybackId) -> usize {
        self.heap.iter().filter(|e| e.owner == owner).count()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.heap.peek().map(|e| e.due)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
