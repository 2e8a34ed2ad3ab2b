use crate::replacer::Replacer;
use crate::FrameID;
use std::sync::Mutex;

#[derive(Clone, Copy, Default)]
struct ClockSlot {
    /// whether the frame is currently eviction-eligible
    tracked: bool,
    /// second-chance bit, set on unpin and cleared by a passing hand
    referenced: bool,
}

struct ClockState {
    slots: Vec<ClockSlot>,
    hand: usize,
    num_tracked: usize,
}

impl ClockState {
    /// advance the clock hand, return the old position
    fn advance(&mut self) -> usize {
        let hand = self.hand;
        self.hand += 1;
        if self.hand == self.slots.len() {
            self.hand = 0;
        }
        hand
    }
}

/// Second-chance eviction order; a drop-in alternative to
/// [`LruReplacer`](crate::LruReplacer).
pub struct ClockReplacer {
    state: Mutex<ClockState>,
}

impl ClockReplacer {
    pub fn new(pool_size: usize) -> Self {
        Self {
            state: Mutex::new(ClockState {
                slots: vec![ClockSlot::default(); pool_size],
                hand: 0,
                num_tracked: 0,
            }),
        }
    }
}

impl Replacer for ClockReplacer {
    fn victim(&self) -> Option<FrameID> {
        let mut guard = self.state.lock().unwrap();
        if guard.num_tracked == 0 {
            return None;
        }
        // terminates within two sweeps: the first pass clears every
        // reference bit it crosses
        loop {
            let hand = guard.advance();
            let state = &mut *guard;
            let slot = &mut state.slots[hand];
            if !slot.tracked {
                continue;
            }
            if slot.referenced {
                slot.referenced = false;
            } else {
                slot.tracked = false;
                state.num_tracked -= 1;
                return Some(hand);
            }
        }
    }

    fn pin(&self, frame_id: FrameID) {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let slot = &mut state.slots[frame_id];
        if slot.tracked {
            slot.tracked = false;
            slot.referenced = false;
            state.num_tracked -= 1;
        }
    }

    fn unpin(&self, frame_id: FrameID) {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let slot = &mut state.slots[frame_id];
        slot.referenced = true;
        if !slot.tracked {
            slot.tracked = true;
            state.num_tracked += 1;
        }
    }

    fn size(&self) -> usize {
        self.state.lock().unwrap().num_tracked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_victim() {
        let replacer = ClockReplacer::new(5);
        assert_eq!(replacer.victim(), None);
    }

    #[test]
    fn unpin_pin_victim() {
        let replacer = ClockReplacer::new(5);
        replacer.unpin(1);
        replacer.unpin(2);
        replacer.unpin(3);
        replacer.pin(2);
        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.victim(), Some(1));
        assert_eq!(replacer.victim(), Some(3));
        assert_eq!(replacer.victim(), None);
    }

    #[test]
    fn second_chance_spares_reunpinned_frame() {
        let replacer = ClockReplacer::new(3);
        replacer.unpin(0);
        replacer.unpin(1);
        // both frames carry a reference bit; the sweep clears them and the
        // hand comes back around to frame 0
        assert_eq!(replacer.victim(), Some(0));
        // frame 0 re-enters with a fresh bit, so frame 1 goes first
        replacer.unpin(0);
        assert_eq!(replacer.victim(), Some(1));
        assert_eq!(replacer.victim(), Some(0));
    }

    #[test]
    fn pin_unknown_is_noop() {
        let replacer = ClockReplacer::new(3);
        replacer.pin(2);
        assert_eq!(replacer.size(), 0);
    }
}
