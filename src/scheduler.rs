//! Cancellable timers driven by an explicit clock.
//!
//! Nothing here sleeps or spawns. The host advances a [`Clock`] and asks the
//! queue which timers are due; a session driven by [`VirtualClock`] is fully
//! deterministic.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::boot::BootStep;

/// Monotonic millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Manually advanced clock for headless runs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtualClock {
    now_ms: u64,
}

impl VirtualClock {
    pub fn new(start_ms: u64) -> Self {
        Self { now_ms: start_ms }
    }

    pub fn advance(&mut self, delta_ms: u64) -> u64 {
        self.now_ms = self.now_ms.saturating_add(delta_ms);
        self.now_ms
    }

    pub fn set(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

/// Fixed-rate clock for frame loops. Frame `n` reads `round(n * frame_ms)`,
/// so fractional frame intervals do not accumulate drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    frame_ms: f64,
    frames: u64,
}

impl FrameClock {
    pub fn new(fps: f64) -> Self {
        Self {
            frame_ms: 1_000.0 / fps,
            frames: 0,
        }
    }

    pub fn frame_ms(&self) -> f64 {
        self.frame_ms
    }

    /// Index of the frame the clock currently points at.
    pub fn frame(&self) -> u64 {
        self.frames
    }

    pub fn tick(&mut self) -> u64 {
        self.frames += 1;
        self.now_ms()
    }
}

impl Clock for FrameClock {
    fn now_ms(&self) -> u64 {
        (self.frames as f64 * self.frame_ms).round() as u64
    }
}

/// Opaque handle returned by [`Scheduler::arm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Events the session arms timers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    DemoTimeout,
    BugTimeout,
    Boot(BootStep),
}

/// One-shot timer scheduling. Per-frame work is not registered here: the
/// host calls `Session::frame` once per display refresh.
pub trait Scheduler<E> {
    fn arm(&mut self, now_ms: u64, delay_ms: u64, event: E) -> TimerHandle;
    /// Cancelling an already-fired or unknown handle is a no-op.
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

#[derive(Debug)]
struct Entry<E> {
    due_ms: u64,
    seq: u64,
    event: E,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    // Reversed so the max-heap pops the earliest (due, seq) first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
pub struct TimerQueue<E> {
    heap: BinaryHeap<Entry<E>>,
    next_seq: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<E: Copy + std::fmt::Debug> TimerQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop every timer due at or before `now_ms`, ordered by due time and
    /// then by arming order.
    pub fn due(&mut self, now_ms: u64) -> Vec<(TimerHandle, E)> {
        let mut fired = Vec::new();
        while self.heap.peek().is_some_and(|entry| entry.due_ms <= now_ms) {
            if let Some(entry) = self.heap.pop() {
                fired.push((TimerHandle(entry.seq), entry.event));
            }
        }
        fired
    }

    pub fn pending_count(&self) -> usize {
        self.heap.len()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.heap.iter().any(|entry| entry.seq == handle.0)
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.heap.peek().map(|entry| entry.due_ms)
    }

    /// Drop every timer whose event matches `predicate`.
    pub fn cancel_where(&mut self, predicate: impl Fn(&E) -> bool) -> usize {
        let before = self.heap.len();
        self.heap.retain(|entry| !predicate(&entry.event));
        before - self.heap.len()
    }

    pub fn clear(&mut self) {
        if !self.heap.is_empty() {
            debug!(pending = self.heap.len(), "clearing timers");
        }
        self.heap.clear();
    }
}

impl<E: Copy + std::fmt::Debug> Scheduler<E> for TimerQueue<E> {
    fn arm(&mut self, now_ms: u64, delay_ms: u64, event: E) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        let due_ms = now_ms.saturating_add(delay_ms);
        debug!(?event, due_ms, "timer armed");
        self.heap.push(Entry { due_ms, seq, event });
        TimerHandle(seq)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.heap.len();
        self.heap.retain(|entry| entry.seq != handle.0);
        let removed = self.heap.len() != before;
        if removed {
            debug!(?handle, "timer cancelled");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_returns_in_time_then_arming_order() {
        let mut queue = TimerQueue::new();
        queue.arm(0, 50, TimerEvent::BugTimeout);
        queue.arm(0, 10, TimerEvent::DemoTimeout);
        queue.arm(0, 50, TimerEvent::DemoTimeout);

        assert!(queue.due(9).is_empty());
        let fired: Vec<_> = queue.due(50).into_iter().map(|(_, e)| e).collect();
        assert_eq!(
            fired,
            vec![
                TimerEvent::DemoTimeout,
                TimerEvent::BugTimeout,
                TimerEvent::DemoTimeout
            ]
        );
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut queue = TimerQueue::new();
        let handle = queue.arm(100, 20, TimerEvent::DemoTimeout);
        assert!(queue.is_pending(handle));
        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle));
        assert!(queue.due(1_000).is_empty());
    }

    #[test]
    fn cancel_where_filters_by_event() {
        let mut queue = TimerQueue::new();
        queue.arm(0, 5, TimerEvent::Boot(BootStep::Blink));
        queue.arm(0, 6, TimerEvent::Boot(BootStep::TypeChar));
        queue.arm(0, 7, TimerEvent::DemoTimeout);
        let removed = queue.cancel_where(|event| matches!(event, TimerEvent::Boot(_)));
        assert_eq!(removed, 2);
        assert_eq!(queue.next_due_ms(), Some(7));
    }

    #[test]
    fn virtual_clock_never_runs_backwards() {
        let mut clock = VirtualClock::new(10);
        clock.advance(5);
        clock.set(3);
        assert_eq!(clock.now_ms(), 15);
    }

    #[test]
    fn frame_clock_rounds_without_drift() {
        let mut clock = FrameClock::new(60.0);
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(clock.tick(), 17);
        assert_eq!(clock.tick(), 33);
        for _ in 2..60 {
            clock.tick();
        }
        assert_eq!(clock.frame(), 60);
        assert_eq!(clock.now_ms(), 1_000);
    }
}
