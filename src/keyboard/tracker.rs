//! Per-key transition statistics with chatter detection
//!
//! The tracker is the write-hot half of the diagnostics engine: the event
//! layer calls [`KeyEventTracker::record_transition`] on every switch
//! transition, while report requests read consistent snapshots. All state
//! lives behind a single mutex so the two paths never observe a torn entry.

use std::sync::Mutex;

use super::KeyTransition;

/// Statistics for a single logical key position.
///
/// Counters only ever grow until an explicit [`KeyEventTracker::reset`].
/// `last_change_ms == 0` means the key has never been observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyStat {
    /// Number of press transitions recorded
    pub press_count: u32,
    /// Number of release transitions recorded
    pub release_count: u32,
    /// Transitions that landed inside the chatter window
    pub chatter_count: u32,
    /// Monotonic milliseconds of the most recent transition
    pub last_change_ms: u64,
    /// Whether the key is currently pressed
    pub last_state: bool,
}

/// Tracks per-key transition counters for every position in the keymap.
///
/// Safe to share between the event path and the request path: clone the
/// surrounding `Arc` and call methods from any context. Lock hold times are
/// O(1) for writes and O(keymap length) for full snapshots.
#[derive(Debug)]
pub struct KeyEventTracker {
    chatter_window_ms: u64,
    keys: Mutex<Vec<KeyStat>>,
}

impl KeyEventTracker {
    /// Create a tracker sized for a keymap of `keymap_len` positions.
    pub fn new(keymap_len: usize, chatter_window_ms: u64) -> Self {
        Self {
            chatter_window_ms,
            keys: Mutex::new(vec![KeyStat::default(); keymap_len]),
        }
    }

    /// Number of tracked key positions (fixed at construction)
    pub fn key_count(&self) -> usize {
        self.keys.lock().unwrap().len()
    }

    /// Configured chatter window in milliseconds (read-only at runtime)
    pub fn chatter_window_ms(&self) -> u64 {
        self.chatter_window_ms
    }

    /// Record one switch transition.
    ///
    /// Increments the press or release counter, then checks the time since
    /// the previous transition on the same key: a delta inside
    /// `0..=chatter_window_ms` counts as chatter. A negative delta (timer
    /// wraparound, out-of-order delivery) is never chatter, but the
    /// press/release counter still updates. Positions outside the keymap
    /// are ignored; the event layer is trusted, so this is a bound, not an
    /// error.
    pub fn record_transition(&self, transition: &KeyTransition) {
        let mut keys = self.keys.lock().unwrap();
        let Some(stat) = keys.get_mut(transition.position) else {
            log::debug!(
                "transition for position {} outside keymap, ignored",
                transition.position
            );
            return;
        };

        if transition.pressed {
            stat.press_count += 1;
        } else {
            stat.release_count += 1;
        }

        if stat.last_change_ms > 0 {
            // checked_sub leaves a reordered timestamp out of the chatter
            // count without poisoning the rest of the record
            if let Some(delta) = transition.timestamp_ms.checked_sub(stat.last_change_ms) {
                if delta <= self.chatter_window_ms {
                    stat.chatter_count += 1;
                }
            }
        }

        stat.last_change_ms = transition.timestamp_ms;
        stat.last_state = transition.pressed;
    }

    /// Consistent copy of one key's statistics, `None` if out of range
    pub fn snapshot(&self, position: usize) -> Option<KeyStat> {
        self.keys.lock().unwrap().get(position).copied()
    }

    /// Consistent copy of every key's statistics, taken under one lock hold
    pub fn snapshot_all(&self) -> Vec<KeyStat> {
        self.keys.lock().unwrap().clone()
    }

    /// Zero all counters, timestamps, and states
    pub fn reset(&self) {
        let mut keys = self.keys.lock().unwrap();
        for stat in keys.iter_mut() {
            *stat = KeyStat::default();
        }
    }
}
