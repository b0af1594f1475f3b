//! End-to-end Integration Test Suite
//!
//! Drives the receiver path (decode → slot → avatar) through a simulated
//! lossy link and checks what reaches the rig:
//! - The slot only ever holds a snapshot that was actually sent
//! - Damaged datagrams never reach the avatar
//! - Ticks before the first snapshot write nothing

use std::sync::Arc;
use std::time::Duration;

use facecast_core::TrackingSnapshot;
use facecast_pose::Transform;
use facecast_rig::{ProfileRegistry, RecordingSink, RigProfile};
use facecast_runtime::{Avatar, AvatarRig};
use facecast_transport::{ingest_datagram, LatestSnapshotSlot};
use facecast_wire::encode;

use crate::chaos::{ChaosConfig, ChaosLink, ChaosStats};
use crate::synthetic::SyntheticFace;

/// Outcome of a simulated session
#[derive(Clone, Debug, Default)]
pub struct SessionReport {
    pub frames_sent: u64,
    pub datagrams_received: u64,
    pub published: u64,
    pub rejected: u64,
    /// Ticks that applied a new snapshot
    pub fresh_ticks: u64,
    /// Ticks that reapplied the previous snapshot
    pub stale_ticks: u64,
    /// Ticks before any snapshot arrived
    pub skipped_ticks: u64,
    /// Longest run of consecutive stale ticks
    pub max_stale_run: u64,
    /// Slot contents that were never sent or not finite
    pub invariant_violations: u64,
    pub link: ChaosStats,
}

impl SessionReport {
    pub fn delivery_ratio(&self) -> f64 {
        if self.frames_sent == 0 {
            0.0
        } else {
            self.published as f64 / self.frames_sent as f64
        }
    }
}

/// Synthetic sender → lossy link → receiver slot → avatar, one tick per frame
pub struct LossySession {
    link: ChaosLink,
    face: SyntheticFace,
    slot: LatestSnapshotSlot,
    avatar: Avatar<Transform, RecordingSink>,
    frame_interval: Duration,
    sent: Vec<TrackingSnapshot>,
}

impl LossySession {
    pub fn new(config: ChaosConfig, profile: Arc<RigProfile>, seed: u64) -> Self {
        let rig = AvatarRig::new(
            Transform::default(),
            vec![Transform::default(); 4],
            RecordingSink::new(),
        )
        .with_eyes(Transform::default(), Transform::default());
        let mut avatar = Avatar::new(profile, rig);
        avatar.activate();

        LossySession {
            link: ChaosLink::new(config, seed),
            face: SyntheticFace::new(seed),
            slot: LatestSnapshotSlot::new(),
            avatar,
            frame_interval: Duration::from_millis(16),
            sent: Vec::new(),
        }
    }

    /// Session against a built-in rig
    pub fn builtin(config: ChaosConfig, rig: &str, seed: u64) -> Option<Self> {
        let profile = ProfileRegistry::with_builtin().get(rig).ok()?;
        Some(Self::new(config, profile, seed))
    }

    pub fn avatar(&self) -> &Avatar<Transform, RecordingSink> {
        &self.avatar
    }

    pub fn slot(&self) -> &LatestSnapshotSlot {
        &self.slot
    }

    fn slot_is_sound(&self) -> bool {
        match self.slot.latest() {
            Some(snapshot) => {
                snapshot.first_non_finite().is_none() && self.sent.contains(&*snapshot)
            }
            None => true,
        }
    }

    /// Run `frames` capture ticks, then let the link drain
    pub fn run(&mut self, frames: u64) -> SessionReport {
        let mut report = SessionReport::default();
        let mut stale_run = 0;

        for i in 0..frames {
            let t = i as f32 * self.frame_interval.as_secs_f32();
            let snapshot = self.face.snapshot(t);
            if let Ok(frame) = encode(&snapshot) {
                self.sent.push(snapshot);
                self.link.send(frame.as_bytes().to_vec());
                report.frames_sent += 1;
            }

            let delivered = self.link.tick(self.frame_interval);
            self.receive(delivered, &mut report);

            match self.slot.take_fresh() {
                Some(snapshot) => {
                    self.avatar.update_tracking(&snapshot);
                    report.fresh_ticks += 1;
                    stale_run = 0;
                }
                None if self.slot.is_empty() => report.skipped_ticks += 1,
                None => {
                    report.stale_ticks += 1;
                    stale_run += 1;
                    report.max_stale_run = report.max_stale_run.max(stale_run);
                }
            }
            self.avatar.late_update();
        }

        let remaining = self.link.drain();
        self.receive(remaining, &mut report);

        report.link = self.link.stats().clone();
        report
    }

    fn receive(&mut self, datagrams: Vec<Vec<u8>>, report: &mut SessionReport) {
        for datagram in datagrams {
            report.datagrams_received += 1;
            match ingest_datagram(&datagram, &self.slot) {
                Ok(_) => report.published += 1,
                Err(_) => report.rejected += 1,
            }
            if !self.slot_is_sound() {
                report.invariant_violations += 1;
            }
        }
    }
}
