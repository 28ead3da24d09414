// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Round-robin cursor over a fixed set of frame slots.
//!
//! A [`FrameRing`] is the bookkeeping half of a multi-buffered command queue:
//! the backend pre-allocates one set of GPU objects per slot (command buffer,
//! fence, semaphores) and the ring decides which slot comes next and whether
//! the GPU may still be using it.
//!
//! # Architecture
//!
//! ```text
//! advance() -> slot 0  (first use, no wait)    submit
//! advance() -> slot 1  (first use, no wait)    submit
//! advance() -> slot 0  (outstanding: wait)     submit
//! advance() -> slot 1  (outstanding: wait)     <frame aborted, no submit>
//! advance() -> slot 0  (outstanding: wait)     submit
//! advance() -> slot 1  (nothing pending, no wait)
//! ```
//!
//! A slot only needs a wait if work was submitted from it and nobody has waited
//! on that work yet. This keeps a frame that was abandoned between acquiring a
//! slot and submitting it from blocking forever on a fence that will never be
//! signaled.

/// The slot handed out by [`FrameRing::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTicket {
    /// Index of the slot, in `0..capacity`.
    pub index: usize,
    /// `true` if the caller must block on this slot's fence before reusing it.
    pub wait_required: bool,
}

/// A fixed-capacity ring of slots indexed by an advancing counter modulo capacity.
///
/// The ring owns no GPU objects itself, which keeps it testable without a device.
#[derive(Debug, Clone)]
pub struct FrameRing {
    /// One flag per slot: submitted and not yet waited on.
    outstanding: Vec<bool>,
    /// The slot returned by the last `advance`, `None` before the first one.
    current: Option<usize>,
}

impl FrameRing {
    /// Creates a ring of `capacity` slots. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            log::warn!("FrameRing: capacity 0 requested, using a single slot");
        }
        Self {
            outstanding: vec![false; capacity.max(1)],
            current: None,
        }
    }

    /// Number of slots in the ring.
    pub fn capacity(&self) -> usize {
        self.outstanding.len()
    }

    /// The slot returned by the last [`advance`](Self::advance), if any.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// The slot the next [`advance`](Self::advance) will return. Does not move the cursor.
    pub fn peek_next(&self) -> usize {
        self.current
            .map_or(0, |index| (index + 1) % self.outstanding.len())
    }

    /// Moves to the next slot.
    ///
    /// The returned ticket tells the caller whether that slot still has
    /// submitted work in flight. The outstanding flag is consumed here: the
    /// caller is expected to wait before touching the slot's objects.
    pub fn advance(&mut self) -> FrameTicket {
        let index = self.peek_next();
        let wait_required = std::mem::replace(&mut self.outstanding[index], false);
        self.current = Some(index);
        FrameTicket {
            index,
            wait_required,
        }
    }

    /// Records that work was submitted from slot `index`.
    pub fn mark_submitted(&mut self, index: usize) {
        match self.outstanding.get_mut(index) {
            Some(flag) => *flag = true,
            None => log::warn!(
                "FrameRing: ignoring submission for slot {index}, ring has {} slots",
                self.outstanding.len()
            ),
        }
    }

    /// Returns `true` if any slot has submitted work nobody waited on yet.
    pub fn has_outstanding(&self) -> bool {
        self.outstanding.iter().any(|&flag| flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_advance_yields_slot_zero() {
        let mut ring = FrameRing::new(3);
        assert_eq!(ring.current(), None);
        assert_eq!(ring.peek_next(), 0);

        let ticket = ring.advance();
        assert_eq!(ticket.index, 0);
        assert!(!ticket.wait_required);
        assert_eq!(ring.current(), Some(0));
    }

    #[test]
    fn test_waits_only_on_reused_slots() {
        const SLOTS: usize = 3;
        let mut ring = FrameRing::new(SLOTS);

        let waits: Vec<bool> = (0..2 * SLOTS + 1)
            .map(|_| {
                let ticket = ring.advance();
                ring.mark_submitted(ticket.index);
                ticket.wait_required
            })
            .collect();

        let expected: Vec<bool> = (0..2 * SLOTS + 1).map(|call| call >= SLOTS).collect();
        assert_eq!(waits, expected);
    }

    #[test]
    fn test_indices_wrap_round_robin() {
        let mut ring = FrameRing::new(2);
        let indices: Vec<usize> = (0..5).map(|_| ring.advance().index).collect();
        assert_eq!(indices, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_aborted_frame_does_not_block_later() {
        let mut ring = FrameRing::new(2);

        let first = ring.advance();
        ring.mark_submitted(first.index);
        // Slot 1 is acquired but the frame is dropped before submission.
        let aborted = ring.advance();
        assert_eq!(aborted.index, 1);

        assert!(ring.advance().wait_required, "slot 0 was submitted");
        assert!(!ring.advance().wait_required, "slot 1 never was");
    }

    #[test]
    fn test_released_frame_is_waited_on_next_visit() {
        let mut ring = FrameRing::new(2);

        // Slot 0 acquires an image, recording fails and the slot is released
        // with an empty submission that still signals its fence.
        let released = ring.advance();
        ring.mark_submitted(released.index);
        assert!(!ring.advance().wait_required);

        let revisit = ring.advance();
        assert_eq!(revisit.index, released.index);
        assert!(revisit.wait_required);
    }

    #[test]
    fn test_wait_is_consumed_once() {
        let mut ring = FrameRing::new(1);
        let ticket = ring.advance();
        ring.mark_submitted(ticket.index);
        assert!(ring.has_outstanding());

        assert!(ring.advance().wait_required);
        assert!(!ring.has_outstanding());
        assert!(!ring.advance().wait_required);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut ring = FrameRing::new(0);
        assert_eq!(ring.capacity(), 1);
        assert_eq!(ring.advance().index, 0);
        assert_eq!(ring.advance().index, 0);
        ring.mark_submitted(7);
        assert!(!ring.has_outstanding());
    }
}
