// ═══════════════════════════════════════════════════════════════════════
// Timeline — virtual-clock queue of deferred game steps
//
// Every animated sequence (dice spin, token walk, CPU think time, result
// reveal) is a step queued here with a delay. Steps carry the generation
// they were scheduled under; the owning game drops any step whose
// generation no longer matches, so a stale step can never mutate state
// after the phase has moved on.
// ═══════════════════════════════════════════════════════════════════════

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

// ── Timing (milliseconds) ──────────────────────────────────────────────

pub const DICE_ROLL_MS: u64 = 1000;
pub const STEP_MS: u64 = 400;
pub const MOVE_SETTLE_MS: u64 = 200;
pub const MIN_MOVE_MS: u64 = 600;
pub const CPU_THINK_MS: u64 = 800;
pub const CPU_ROUTE_MS: u64 = 500;
pub const REVEAL_MS: u64 = 1200;
pub const STEAL_PAUSE_MS: u64 = 900;
pub const PARALYSIS_SKIP_MS: u64 = 800;

/// Upper bound on steps processed by one `run_until_idle` call.
pub const MAX_STEPS_PER_RUN: usize = 100_000;

/// Walk time for `nodes` nodes in Classic mode.
pub fn move_duration(nodes: usize) -> u64 {
    (STEP_MS * nodes as u64 + MOVE_SETTLE_MS).max(MIN_MOVE_MS)
}

#[derive(Debug, Clone)]
struct Entry<S> {
    due: u64,
    seq: u64,
    generation: u64,
    step: S,
}

impl<S> PartialEq for Entry<S> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<S> Eq for Entry<S> {}

impl<S> PartialOrd for Entry<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for Entry<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// A step that came due, with the generation it was stamped with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueStep<S> {
    pub at: u64,
    pub generation: u64,
    pub step: S,
}

#[derive(Debug, Clone)]
pub struct Timeline<S> {
    now: u64,
    seq: u64,
    queue: BinaryHeap<Reverse<Entry<S>>>,
}

impl<S> Default for Timeline<S> {
    fn default() -> Self {
        Timeline { now: 0, seq: 0, queue: BinaryHeap::new() }
    }
}

impl<S> Timeline<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue `step` to fire `delay_ms` after the current time. Steps due at
    /// the same instant fire in scheduling order.
    pub fn schedule(&mut self, delay_ms: u64, generation: u64, step: S) {
        self.seq += 1;
        self.queue.push(Reverse(Entry {
            due: self.now + delay_ms,
            seq: self.seq,
            generation,
            step,
        }));
    }

    /// When the earliest pending step is due.
    pub fn next_due(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(e)| e.due)
    }

    /// Pop the earliest step due at or before `deadline`, moving the clock
    /// to its due time. The clock never runs backwards.
    pub fn pop_due(&mut self, deadline: u64) -> Option<DueStep<S>> {
        if self.next_due()? > deadline {
            return None;
        }
        let Reverse(entry) = self.queue.pop()?;
        self.now = self.now.max(entry.due);
        Some(DueStep { at: entry.due, generation: entry.generation, step: entry.step })
    }

    /// Move the clock forward without firing anything.
    pub fn advance_to(&mut self, time: u64) {
        self.now = self.now.max(time);
    }

    /// Drop every pending step. The clock keeps its value.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
