use anyhow::{anyhow, Result};

/// Default capacity of the circular history/lookahead buffer.
pub const QUEUE_CAPACITY: usize = 2048;

#[derive(Clone, Copy, Default)]
struct Slot {
    occupied: bool,
    played: bool,
    track_id: i64,
}

/// Fixed-capacity circular buffer of track ids.
///
/// Behaves as an unbounded forward list for as long as entries have been
/// explicitly appended, and falls back to endless random playback once the
/// lookahead is exhausted. Slots behind the current cursor form replayable
/// history until the append cursor wraps around and overwrites them.
pub struct TrackQueue {
    slots: Box<[Slot]>,
    append_at: usize,
    current: Option<usize>,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::with_capacity(QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0);
        TrackQueue {
            slots: vec![Slot::default(); capacity].into_boxed_slice(),
            append_at: 0,
            current: None,
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn wrap_add(&self, idx: usize, n: usize) -> usize {
        (idx + n) % self.capacity()
    }

    /// Cursor subtraction normalized into `[0, capacity)`. A truncating
    /// `%` on the raw difference would go negative at index zero.
    fn wrap_sub(&self, idx: usize, n: usize) -> usize {
        (idx as i64 - n as i64).rem_euclid(self.capacity() as i64) as usize
    }

    /// Write a fresh occupied/unplayed slot at the append cursor.
    ///
    /// Pre-existing content there is discarded; the advance algorithm
    /// guarantees the append cursor only ever lands on vacant slots or
    /// played history, never on pending lookahead.
    pub fn append(&mut self, track_id: i64) {
        self.slots[self.append_at] = Slot {
            occupied: true,
            played: false,
            track_id,
        };
        self.append_at = self.wrap_add(self.append_at, 1);
    }

    /// Track id at the current cursor. Errors before the first advance.
    pub fn current(&self) -> Result<i64> {
        let idx = self
            .current
            .ok_or_else(|| anyhow!("nothing is queued yet"))?;
        Ok(self.slots[idx].track_id)
    }

    pub fn has_current(&self) -> bool {
        self.current.is_some()
    }

    /// Mark the current slot played and step the cursor forward. If the
    /// advanced-to slot holds a pending entry it becomes current as-is;
    /// otherwise (vacant, or wrapped all the way back onto history) a
    /// fresh id is pulled from `pick` and appended into that slot.
    ///
    /// Returns the track id now current.
    pub fn advance<F>(&mut self, mut pick: F) -> Result<i64>
    where
        F: FnMut() -> Result<i64>,
    {
        let next = match self.current {
            Some(cur) => self.wrap_add(cur, 1),
            None => 0,
        };

        // The advanced-to slot counts as played if it is the current
        // slot itself (a full wrap at capacity one).
        let slot = self.slots[next];
        let pending = slot.occupied && !slot.played && self.current != Some(next);
        if pending {
            if let Some(cur) = self.current {
                self.slots[cur].played = true;
            }
            self.current = Some(next);
            return Ok(slot.track_id);
        }

        // Either vacant or already played: the lookahead is exhausted,
        // refill from the picker. The pick comes first so a failure
        // leaves cursor and played flags exactly as they were.
        let track_id = pick()?;
        if let Some(cur) = self.current {
            self.slots[cur].played = true;
        }
        self.current = Some(next);
        self.append_at = next;
        self.append(track_id);
        Ok(track_id)
    }

    /// Step the cursor back onto played history, re-marking the departed
    /// slot unplayed so it is replayed on the way forward again. Returns
    /// false (and mutates nothing) when no eligible history exists.
    pub fn to_prev(&mut self) -> bool {
        let Some(cur) = self.current else {
            return false;
        };

        let prev = self.wrap_sub(cur, 1);
        let slot = self.slots[prev];
        if !slot.occupied || !slot.played {
            return false;
        }

        self.slots[cur].played = false;
        self.current = Some(prev);
        true
    }

    /// Up to `max` played entries behind the current cursor, oldest first.
    pub fn history(&self, max: usize) -> Vec<i64> {
        let Some(cur) = self.current else {
            return Vec::new();
        };

        let mut back = Vec::new();
        for n in 1..=max {
            let idx = self.wrap_sub(cur, n);
            let slot = self.slots[idx];
            if !slot.occupied || !slot.played {
                break;
            }
            back.push(slot.track_id);
        }
        back.reverse();
        back
    }

    /// Up to `max` pending entries ahead of the current cursor, in play
    /// order.
    pub fn pending(&self, max: usize) -> Vec<i64> {
        let Some(cur) = self.current else {
            return Vec::new();
        };

        let mut ahead = Vec::new();
        for n in 1..=max {
            let idx = self.wrap_add(cur, n);
            let slot = self.slots[idx];
            if !slot.occupied || slot.played {
                break;
            }
            ahead.push(slot.track_id);
        }
        ahead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_pick() -> Result<i64> {
        panic!("picker must not be called while pending entries remain");
    }

    #[test]
    fn current_fails_before_first_advance() {
        let queue = TrackQueue::with_capacity(4);
        assert!(queue.current().is_err());
        assert!(!queue.has_current());
    }

    #[test]
    fn advance_walks_explicit_entries_before_random() {
        let mut queue = TrackQueue::with_capacity(4);
        queue.append(101);
        queue.append(102);

        // Cursor moves from unset onto slot 0, which is pending.
        assert_eq!(queue.advance(no_pick).unwrap(), 101);
        assert_eq!(queue.current().unwrap(), 101);

        // Slot 0 marked played, slot 1 pending.
        assert_eq!(queue.advance(no_pick).unwrap(), 102);
        assert_eq!(queue.current().unwrap(), 102);

        // Slot 2 is vacant: exactly one pick fills it.
        let mut picks = 0;
        let id = queue
            .advance(|| {
                picks += 1;
                Ok(777)
            })
            .unwrap();
        assert_eq!(id, 777);
        assert_eq!(picks, 1);
        assert_eq!(queue.current().unwrap(), 777);
    }

    #[test]
    fn empty_queue_triggers_one_pick_per_advance() {
        let mut queue = TrackQueue::with_capacity(8);
        let mut picks = 0;
        for expect in [500, 501, 502] {
            let id = queue
                .advance(|| {
                    picks += 1;
                    Ok(500 + picks - 1)
                })
                .unwrap();
            assert_eq!(id, expect);
        }
        assert_eq!(picks, 3);
    }

    #[test]
    fn failed_pick_leaves_the_queue_untouched() {
        let mut queue = TrackQueue::with_capacity(4);

        // A failure on the very first advance must not park the cursor
        // on a vacant slot.
        assert!(queue.advance(|| Err(anyhow!("catalog is empty"))).is_err());
        assert!(queue.current().is_err());
        assert!(!queue.has_current());

        queue.append(101);
        queue.advance(no_pick).unwrap();

        // With the lookahead exhausted, a failing pick leaves the
        // current entry in place and still unplayed.
        assert!(queue.advance(|| Err(anyhow!("catalog is empty"))).is_err());
        assert_eq!(queue.current().unwrap(), 101);
        assert!(!queue.to_prev());

        // A working picker recovers on the next call.
        assert_eq!(queue.advance(|| Ok(777)).unwrap(), 777);
        assert_eq!(queue.history(5), vec![101]);
    }

    #[test]
    fn to_prev_requires_played_history() {
        let mut queue = TrackQueue::with_capacity(4);
        assert!(!queue.to_prev());

        queue.append(101);
        queue.advance(no_pick).unwrap();

        // Slot behind the cursor is vacant.
        assert!(!queue.to_prev());
        assert_eq!(queue.current().unwrap(), 101);
    }

    #[test]
    fn to_prev_steps_into_history_and_unplays_current() {
        let mut queue = TrackQueue::with_capacity(4);
        queue.append(101);
        queue.append(102);
        queue.advance(no_pick).unwrap();
        queue.advance(no_pick).unwrap();
        let random = queue.advance(|| Ok(777)).unwrap();
        assert_eq!(random, 777);

        // Slot 1 (102) is occupied && played, so it becomes current again
        // and 777 is re-marked pending.
        assert!(queue.to_prev());
        assert_eq!(queue.current().unwrap(), 102);
        assert_eq!(queue.pending(5), vec![777]);
    }

    #[test]
    fn to_prev_then_advance_round_trips() {
        let mut queue = TrackQueue::with_capacity(4);
        queue.append(101);
        queue.append(102);
        queue.advance(no_pick).unwrap();
        queue.advance(no_pick).unwrap();

        assert!(queue.to_prev());
        // 102 was re-marked unplayed by to_prev, so advancing replays it
        // without consulting the picker.
        assert_eq!(queue.advance(no_pick).unwrap(), 102);
    }

    #[test]
    fn cursor_subtraction_wraps_at_zero() {
        let queue = TrackQueue::with_capacity(4);
        assert_eq!(queue.wrap_sub(0, 1), 3);
        assert_eq!(queue.wrap_sub(1, 1), 0);
        assert_eq!(queue.wrap_sub(0, 4), 0);
        for c in 0..4 {
            assert!(queue.wrap_sub(c, 1) < 4);
        }
    }

    #[test]
    fn history_and_pending_windows() {
        let mut queue = TrackQueue::with_capacity(8);
        for id in [1, 2, 3, 4, 5] {
            queue.append(id);
        }
        queue.advance(no_pick).unwrap();
        queue.advance(no_pick).unwrap();
        queue.advance(no_pick).unwrap();

        assert_eq!(queue.history(5), vec![1, 2]);
        assert_eq!(queue.history(1), vec![2]);
        assert_eq!(queue.pending(5), vec![4, 5]);
        assert_eq!(queue.pending(1), vec![4]);
    }

    #[test]
    fn capacity_one_refills_on_every_advance() {
        let mut queue = TrackQueue::with_capacity(1);
        assert_eq!(queue.advance(|| Ok(1)).unwrap(), 1);
        // The only slot is the current one; wrapping onto it must not
        // replay it as pending.
        assert_eq!(queue.advance(|| Ok(2)).unwrap(), 2);
        assert_eq!(queue.current().unwrap(), 2);
    }

    #[test]
    fn wraparound_overwrites_only_played_history() {
        let mut queue = TrackQueue::with_capacity(2);
        queue.append(1);
        queue.append(2);
        queue.advance(no_pick).unwrap();
        queue.advance(no_pick).unwrap();

        // Both slots consumed; the next advance wraps onto played slot 0
        // and overwrites it with the pick.
        assert_eq!(queue.advance(|| Ok(3)).unwrap(), 3);
        assert_eq!(queue.current().unwrap(), 3);
        // Slot 1 is still intact history.
        assert_eq!(queue.history(5), vec![2]);
    }
}
