//! Latest-snapshot slot
//!
//! The only state shared between the network receive loop and the update
//! tick. Writers replace the whole snapshot; readers get the most recent one.
//! There is no history: a publish silently discards the previous value.

use std::sync::Arc;

use parking_lot::RwLock;

use facecast_core::TrackingSnapshot;

#[derive(Debug, Default)]
struct SlotState {
    snapshot: Option<Arc<TrackingSnapshot>>,
    /// Set on publish, cleared by `take_fresh`
    fresh: bool,
    /// Number of publishes so far
    generation: u64,
}

/// Single-writer/multi-reader cell holding the most recent snapshot
///
/// The lock is held only for the pointer swap or clone, never while a frame
/// is being decoded.
#[derive(Debug, Default)]
pub struct LatestSnapshotSlot {
    state: RwLock<SlotState>,
}

impl LatestSnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot. Returns the new generation.
    pub fn publish(&self, snapshot: TrackingSnapshot) -> u64 {
        let snapshot = Arc::new(snapshot);
        let mut state = self.state.write();
        state.snapshot = Some(snapshot);
        state.fresh = true;
        state.generation += 1;
        state.generation
    }

    /// Most recent snapshot, fresh or not
    pub fn latest(&self) -> Option<Arc<TrackingSnapshot>> {
        self.state.read().snapshot.clone()
    }

    /// Most recent snapshot if it has not been taken since it was published
    pub fn take_fresh(&self) -> Option<Arc<TrackingSnapshot>> {
        let mut state = self.state.write();
        if !state.fresh {
            return None;
        }
        state.fresh = false;
        state.snapshot.clone()
    }

    pub fn is_fresh(&self) -> bool {
        self.state.read().fresh
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().snapshot.is_none()
    }

    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facecast_core::Channel;

    #[test]
    fn test_empty_slot() {
        let slot = LatestSnapshotSlot::new();
        assert!(slot.is_empty());
        assert!(slot.latest().is_none());
        assert!(slot.take_fresh().is_none());
        assert_eq!(slot.generation(), 0);
    }

    #[test]
    fn test_publish_overwrites() {
        let slot = LatestSnapshotSlot::new();
        slot.publish(TrackingSnapshot::zeroed().with(Channel::JawOpen, 0.1));
        let gen = slot.publish(TrackingSnapshot::zeroed().with(Channel::JawOpen, 0.9));

        assert_eq!(gen, 2);
        assert_eq!(slot.latest().unwrap().get(Channel::JawOpen), 0.9);
    }

    #[test]
    fn test_take_fresh_once() {
        let slot = LatestSnapshotSlot::new();
        slot.publish(TrackingSnapshot::zeroed());

        assert!(slot.is_fresh());
        assert!(slot.take_fresh().is_some());
        assert!(!slot.is_fresh());
        assert!(slot.take_fresh().is_none());
        // Still readable after being taken
        assert!(slot.latest().is_some());
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_snapshot() {
        let slot = Arc::new(LatestSnapshotSlot::new());

        let writer = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || {
                for i in 0..2000 {
                    let mut s = TrackingSnapshot::zeroed();
                    for channel in Channel::ALL {
                        s.set(channel, i as f32);
                    }
                    slot.publish(s);
                }
            })
        };

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let slot = Arc::clone(&slot);
                std::thread::spawn(move || {
                    for _ in 0..2000 {
                        if let Some(s) = slot.latest() {
                            let first = s.get(Channel::PosX);
                            assert!(s.channels().all(|(_, v)| v == first));
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(slot.generation(), 2000);
    }
}
