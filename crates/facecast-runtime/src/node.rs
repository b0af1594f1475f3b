//! FaceCast Node - sender/receiver orchestration and the update tick

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;

use facecast_core::{CaptureSample, FacecastError, FacecastResult, TrackingSnapshot};
use facecast_pose::Bone;
use facecast_rig::{RetargetFrame, RigSink};
use facecast_transport::{
    BroadcastSender, LatestSnapshotSlot, ReceiveStats, ReceiverHandle, SnapshotReceiver,
};
use facecast_wire::encode;

use crate::{AvatarRoster, NodeConfig, NodeMode};

#[derive(Clone, Debug, Default)]
pub struct RuntimeStats {
    pub ticks: u64,
    /// Ticks with no snapshot to apply
    pub skipped_ticks: u64,
    pub captures: u64,
    pub capture_errors: u64,
    /// Fresh snapshots taken from the slot
    pub snapshots_applied: u64,
    pub avatar_switches: u64,
    pub last_tick_duration: Duration,
    /// Filled in by `shutdown` on receiver nodes
    pub receive: Option<ReceiveStats>,
}

enum Role {
    Sender {
        sender: BroadcastSender,
        local: Option<TrackingSnapshot>,
    },
    Receiver {
        slot: Arc<LatestSnapshotSlot>,
        handle: ReceiverHandle,
    },
}

/// FaceCast node: one transport role plus the local avatars
pub struct Node<B, S> {
    config: NodeConfig,
    role: Role,
    roster: AvatarRoster<B, S>,
    stats: RuntimeStats,
}

impl<B: Bone, S: RigSink> Node<B, S> {
    /// Start a node in the configured mode.
    ///
    /// Receiver nodes bind their socket and spawn the receive loop here, so
    /// this must run inside a tokio runtime.
    pub async fn start(config: NodeConfig, mut roster: AvatarRoster<B, S>) -> FacecastResult<Self> {
        config.validate()?;
        if let Some(active) = &config.active_rig {
            roster.select_id(active)?;
        }

        let role = match config.mode {
            NodeMode::Sender => {
                let sender = BroadcastSender::new(config.broadcast_target())
                    .with_timeout(config.send_timeout)
                    .with_runtime(Handle::current());
                tracing::info!(dest = %sender.destination(), "sender node started");
                Role::Sender {
                    sender,
                    local: None,
                }
            }
            NodeMode::Receiver => {
                let slot = Arc::new(LatestSnapshotSlot::new());
                let receiver = SnapshotReceiver::bind(config.bind_target()).await?;
                let handle = receiver.spawn(Arc::clone(&slot));
                Role::Receiver { slot, handle }
            }
        };

        Ok(Node {
            config,
            role,
            roster,
            stats: RuntimeStats::default(),
        })
    }

    pub fn mode(&self) -> NodeMode {
        match self.role {
            Role::Sender { .. } => NodeMode::Sender,
            Role::Receiver { .. } => NodeMode::Receiver,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    pub fn roster(&self) -> &AvatarRoster<B, S> {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut AvatarRoster<B, S> {
        &mut self.roster
    }

    /// Address the receive loop is bound to
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.role {
            Role::Receiver { handle, .. } => Some(handle.local_addr()),
            Role::Sender { .. } => None,
        }
    }

    /// Newest snapshot this node knows about
    pub fn latest_snapshot(&self) -> Option<TrackingSnapshot> {
        match &self.role {
            Role::Sender { local, .. } => *local,
            Role::Receiver { slot, .. } => slot.latest().map(|s| *s),
        }
    }

    /// Pack, broadcast and locally apply one capture sample.
    ///
    /// The send is detached onto the runtime the node was started in; a slow
    /// or failing network never delays the caller, and the caller may be a
    /// thread outside that runtime. Only valid on sender nodes.
    pub fn capture(&mut self, sample: &CaptureSample) -> FacecastResult<TrackingSnapshot> {
        let Role::Sender { sender, local } = &mut self.role else {
            return Err(FacecastError::InvalidArgument(
                "capture on a receiver node".into(),
            ));
        };

        let sent = TrackingSnapshot::from_capture(sample)
            .and_then(|s| encode(&s).map(|frame| (s, frame)))
            .and_then(|(s, frame)| sender.spawn_send(frame).map(|_| s));
        let snapshot = match sent {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.stats.capture_errors += 1;
                tracing::warn!("capture rejected: {}", e);
                return Err(e);
            }
        };

        *local = Some(snapshot);
        self.stats.captures += 1;
        self.roster.update_tracking(&snapshot);
        Ok(snapshot)
    }

    /// One update tick for the active avatar.
    ///
    /// Returns `None`, without touching any rig output, until a first
    /// snapshot is available.
    pub fn tick(&mut self) -> Option<RetargetFrame> {
        let start = Instant::now();
        self.stats.ticks += 1;

        if let Role::Receiver { slot, .. } = &self.role {
            if let Some(snapshot) = slot.take_fresh() {
                self.stats.snapshots_applied += 1;
                self.roster.update_tracking(&snapshot);
            }
        }

        let frame = self.roster.late_update();
        if frame.is_none() {
            self.stats.skipped_ticks += 1;
        }

        self.stats.last_tick_duration = start.elapsed();
        frame
    }

    /// Switch avatar and hand it the newest snapshot
    pub fn switch_avatar(&mut self, forward: bool) -> Option<usize> {
        let index = self.roster.switch(forward)?;
        self.stats.avatar_switches += 1;
        if let Some(snapshot) = self.latest_snapshot() {
            self.roster.update_tracking(&snapshot);
        }
        Some(index)
    }

    pub fn toggle_wear(&mut self) -> Option<bool> {
        self.roster.toggle_active_wear()
    }

    /// Stop the receive loop, if any, and report final counters
    pub async fn shutdown(self) -> RuntimeStats {
        let mut stats = self.stats;
        if let Role::Receiver { handle, .. } = self.role {
            stats.receive = Some(handle.shutdown().await);
        }
        tracing::info!(
            ticks = stats.ticks,
            skipped = stats.skipped_ticks,
            captures = stats.captures,
            "node stopped"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    use facecast_core::{Channel, Vec3};
    use facecast_pose::Transform;
    use facecast_rig::{ProfileRegistry, RecordingSink, RigProfile};

    use crate::AvatarRig;

    fn roster(ids: &[&str]) -> AvatarRoster<Transform, RecordingSink> {
        let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        AvatarRoster::from_registry(&ProfileRegistry::with_builtin(), &ids, |_: &RigProfile| {
            AvatarRig::new(Transform::default(), vec![Transform::default(); 4], RecordingSink::new())
        })
        .unwrap()
    }

    fn loopback(mode: NodeMode, port: u16) -> NodeConfig {
        NodeConfig {
            mode,
            port,
            broadcast_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            ..NodeConfig::default()
        }
    }

    async fn wait_until<F: Fn() -> bool>(check: F) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !check() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn test_receiver_skips_until_first_snapshot() {
        let mut node = Node::start(loopback(NodeMode::Receiver, 0), roster(&["sana"]))
            .await
            .unwrap();

        assert!(node.tick().is_none());
        assert!(node.tick().is_none());
        assert_eq!(node.stats().skipped_ticks, 2);
        assert_eq!(node.roster().active().unwrap().face().writes(), 0);

        let stats = node.shutdown().await;
        assert_eq!(stats.receive.unwrap().datagrams, 0);
    }

    #[tokio::test]
    async fn test_capture_rejected_on_receiver() {
        let mut node = Node::start(loopback(NodeMode::Receiver, 0), roster(&["sana"]))
            .await
            .unwrap();
        let sample = CaptureSample::uniform(Vec3::ZERO, Vec3::ZERO, 0.0);
        assert!(matches!(
            node.capture(&sample),
            Err(FacecastError::InvalidArgument(_))
        ));
        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_sender_drives_local_avatar() {
        let mut node = Node::start(loopback(NodeMode::Sender, 9), roster(&["sana", "yuni"]))
            .await
            .unwrap();
        assert!(node.tick().is_none());

        let sample = CaptureSample::uniform(Vec3::ZERO, Vec3::ZERO, 0.0)
            .with_expression(Channel::JawOpen, 1.0);
        node.capture(&sample).unwrap();

        let frame = node.tick().unwrap();
        assert_eq!(frame.weight("10"), Some(100.0));
        assert_eq!(node.stats().captures, 1);

        // The new avatar picks up the last capture straight away
        node.switch_avatar(true);
        let frame = node.tick().unwrap();
        assert_eq!(frame.weight("10"), Some(100.0));
        assert_eq!(node.roster().active().unwrap().id(), "yuni");

        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_incomplete_capture_counted() {
        let mut node = Node::start(loopback(NodeMode::Sender, 9), roster(&["sana"]))
            .await
            .unwrap();
        let sample = CaptureSample::new(Vec3::ZERO, Vec3::ZERO);
        assert!(node.capture(&sample).is_err());
        assert_eq!(node.stats().capture_errors, 1);
        assert!(node.latest_snapshot().is_none());
        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_sender_to_receiver_over_loopback() {
        let mut receiver = Node::start(loopback(NodeMode::Receiver, 0), roster(&["andelte"]))
            .await
            .unwrap();
        let port = receiver.local_addr().unwrap().port();
        let mut sender = Node::start(loopback(NodeMode::Sender, port), roster(&["andelte"]))
            .await
            .unwrap();

        let sample = CaptureSample::uniform(Vec3::ZERO, Vec3::ZERO, 0.0)
            .with_expression(Channel::EyeLookUpLeft, 1.0)
            .with_expression(Channel::EyeLookUpRight, 1.0);
        sender.capture(&sample).unwrap();

        wait_until(|| receiver.latest_snapshot().is_some()).await;
        let frame = receiver.tick().unwrap();
        assert_eq!(frame.weight("25"), Some(80.0));
        assert_eq!(receiver.stats().snapshots_applied, 1);

        // No new datagram: the last snapshot is reapplied, not re-taken
        receiver.tick().unwrap();
        assert_eq!(receiver.stats().snapshots_applied, 1);

        sender.shutdown().await;
        let stats = receiver.shutdown().await;
        assert_eq!(stats.receive.unwrap().published, 1);
    }

    #[test]
    fn test_capture_from_thread_outside_runtime() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let receiver = rt
            .block_on(Node::start(loopback(NodeMode::Receiver, 0), roster(&["sana"])))
            .unwrap();
        let port = receiver.local_addr().unwrap().port();
        let mut sender = rt
            .block_on(Node::start(loopback(NodeMode::Sender, port), roster(&["sana"])))
            .unwrap();

        let sample = CaptureSample::uniform(Vec3::ZERO, Vec3::ZERO, 0.0)
            .with_expression(Channel::JawOpen, 1.0);
        let (sender, captured) = std::thread::spawn(move || {
            let captured = sender.capture(&sample);
            (sender, captured)
        })
        .join()
        .unwrap();
        let captured = captured.unwrap();
        assert_eq!(sender.stats().captures, 1);

        rt.block_on(async {
            wait_until(|| receiver.latest_snapshot() == Some(captured)).await;
            sender.shutdown().await;
            let stats = receiver.shutdown().await;
            assert_eq!(stats.receive.unwrap().published, 1);
        });
    }

    #[tokio::test]
    async fn test_active_rig_from_config() {
        let mut config = loopback(NodeMode::Receiver, 0);
        config.rigs = vec!["sana".into(), "fencer".into()];
        config.active_rig = Some("fencer".into());

        let node = Node::start(config, roster(&["sana", "fencer"])).await.unwrap();
        assert_eq!(node.roster().active().unwrap().id(), "fencer");
        node.shutdown().await;
    }
}
