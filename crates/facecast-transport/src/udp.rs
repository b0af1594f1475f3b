//! UDP broadcast transport
//!
//! Both directions are best-effort: no retry, no acknowledgment, no ordering.
//! The sender opens a transient socket per frame; the receiver owns one
//! socket for its whole lifetime and publishes into a `LatestSnapshotSlot`.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use facecast_core::{FacecastError, FacecastResult, TrackingSnapshot};
use facecast_wire::{decode_bytes, WireFrame, MAX_FRAME_SIZE};

use crate::LatestSnapshotSlot;

/// Upper bound on a single send before it is abandoned
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(500);

/// Pause after a socket error before the receive loop polls again
pub const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(50);

fn transport_err(e: impl std::fmt::Display) -> FacecastError {
    FacecastError::Transport(e.to_string())
}

/// Fire-and-forget broadcast sender
#[derive(Clone, Debug)]
pub struct BroadcastSender {
    dest: SocketAddr,
    send_timeout: Duration,
    runtime: Option<Handle>,
}

impl BroadcastSender {
    /// Sender targeting `dest`.
    ///
    /// When created inside a tokio runtime, detached sends go to that
    /// runtime even if `spawn_send` is later called from a plain thread.
    pub fn new(dest: SocketAddr) -> Self {
        BroadcastSender {
            dest,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Sender targeting the limited broadcast address on `port`
    pub fn broadcast(port: u16) -> Self {
        Self::new(SocketAddr::from((Ipv4Addr::BROADCAST, port)))
    }

    pub fn with_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Run detached sends on this runtime
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn destination(&self) -> SocketAddr {
        self.dest
    }

    /// Send one frame on a transient socket.
    ///
    /// The socket is closed when this returns, whether the send completed,
    /// failed or timed out.
    pub async fn send(&self, frame: &WireFrame) -> FacecastResult<()> {
        let bind = if self.dest.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(bind).await.map_err(transport_err)?;
        if self.dest.is_ipv4() {
            socket.set_broadcast(true).map_err(transport_err)?;
        }

        let sent = timeout(self.send_timeout, socket.send_to(frame.as_bytes(), self.dest))
            .await
            .map_err(|_| FacecastError::Transport(format!("send to {} timed out", self.dest)))?
            .map_err(transport_err)?;

        if sent != frame.len() {
            return Err(FacecastError::Transport(format!(
                "short send: {} of {} bytes",
                sent,
                frame.len()
            )));
        }
        Ok(())
    }

    /// Send on a detached task. Send failures are logged, never returned:
    /// the next frame is independent of this one.
    ///
    /// Safe to call from threads outside the runtime. Fails only when no
    /// runtime was captured and none is entered on the calling thread.
    pub fn spawn_send(&self, frame: WireFrame) -> FacecastResult<JoinHandle<()>> {
        let runtime = match &self.runtime {
            Some(runtime) => runtime.clone(),
            None => Handle::try_current().map_err(transport_err)?,
        };
        let sender = self.clone();
        Ok(runtime.spawn(async move {
            if let Err(e) = sender.send(&frame).await {
                tracing::warn!(dest = %sender.dest, "broadcast send failed: {}", e);
            }
        }))
    }
}

/// Decode one datagram and publish it.
///
/// Decoding happens before the slot is touched, so a bad datagram leaves the
/// previous snapshot in place.
pub fn ingest_datagram(buf: &[u8], slot: &LatestSnapshotSlot) -> FacecastResult<TrackingSnapshot> {
    let snapshot = decode_bytes(buf)?;
    slot.publish(snapshot);
    Ok(snapshot)
}

/// Counters reported when a receive loop stops
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReceiveStats {
    pub datagrams: u64,
    pub published: u64,
    pub dropped: u64,
    pub socket_errors: u64,
}

/// Broadcast-enabled UDP socket bound for the receiver's lifetime
#[derive(Debug)]
pub struct SnapshotReceiver {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl SnapshotReceiver {
    /// Bind to a local address
    pub async fn bind(addr: SocketAddr) -> FacecastResult<Self> {
        let socket = UdpSocket::bind(addr).await.map_err(transport_err)?;
        socket.set_broadcast(true).map_err(transport_err)?;

        let local_addr = socket.local_addr().map_err(transport_err)?;

        Ok(SnapshotReceiver { socket, local_addr })
    }

    /// Get local address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for one datagram and ingest it
    pub async fn recv_once(&self, slot: &LatestSnapshotSlot) -> FacecastResult<TrackingSnapshot> {
        let mut buf = vec![0u8; MAX_FRAME_SIZE];
        let (len, _) = self.socket.recv_from(&mut buf).await.map_err(transport_err)?;
        ingest_datagram(&buf[..len], slot)
    }

    /// Start the background receive loop.
    ///
    /// The loop runs until the returned handle is shut down or dropped.
    pub fn spawn(self, slot: Arc<LatestSnapshotSlot>) -> ReceiverHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let local_addr = self.local_addr;
        let task = tokio::spawn(receive_loop(self.socket, slot, shutdown_rx));

        tracing::info!(%local_addr, "snapshot receiver started");

        ReceiverHandle {
            shutdown: shutdown_tx,
            task,
            local_addr,
        }
    }
}

async fn receive_loop(
    socket: UdpSocket,
    slot: Arc<LatestSnapshotSlot>,
    mut shutdown: watch::Receiver<bool>,
) -> ReceiveStats {
    let mut stats = ReceiveStats::default();
    let mut buf = vec![0u8; MAX_FRAME_SIZE];

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                // Err means the handle was dropped
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            received = socket.recv_from(&mut buf) => match received {
                Ok((len, from)) => {
                    stats.datagrams += 1;
                    match ingest_datagram(&buf[..len], &slot) {
                        Ok(_) => stats.published += 1,
                        Err(e) => {
                            stats.dropped += 1;
                            tracing::debug!(%from, "dropped datagram: {}", e);
                        }
                    }
                }
                Err(e) => {
                    stats.socket_errors += 1;
                    tracing::warn!("UDP receive error: {}", e);
                    tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                }
            }
        }
    }

    tracing::info!(
        datagrams = stats.datagrams,
        published = stats.published,
        dropped = stats.dropped,
        "snapshot receiver stopped"
    );
    stats
}

/// Owner of a running receive loop
#[derive(Debug)]
pub struct ReceiverHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<ReceiveStats>,
    local_addr: SocketAddr,
}

impl ReceiverHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the loop and wait for it to release its socket
    pub async fn shutdown(self) -> ReceiveStats {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!("receive loop ended abnormally: {}", e);
                ReceiveStats::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facecast_core::Channel;
    use facecast_wire::encode;

    async fn wait_for_generation(slot: &LatestSnapshotSlot, generation: u64) {
        timeout(Duration::from_secs(2), async {
            while slot.generation() < generation {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("snapshot was not published in time");
    }

    #[tokio::test]
    async fn test_receiver_bind() {
        let receiver = SnapshotReceiver::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();

        assert_ne!(receiver.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn test_send_and_recv_once() {
        let receiver = SnapshotReceiver::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let sender = BroadcastSender::new(receiver.local_addr());
        let slot = LatestSnapshotSlot::new();

        let snapshot = TrackingSnapshot::zeroed().with(Channel::JawOpen, 1.0);
        sender.send(&encode(&snapshot).unwrap()).await.unwrap();

        let received = receiver.recv_once(&slot).await.unwrap();
        assert_eq!(received, snapshot);
        assert_eq!(slot.latest().as_deref(), Some(&snapshot));
    }

    #[tokio::test]
    async fn test_receive_loop_drops_malformed_and_keeps_last() {
        let receiver = SnapshotReceiver::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let sender = BroadcastSender::new(receiver.local_addr());
        let slot = Arc::new(LatestSnapshotSlot::new());
        let handle = receiver.spawn(Arc::clone(&slot));

        let first = TrackingSnapshot::zeroed().with(Channel::EyeBlinkLeft, 0.5);
        sender.send(&encode(&first).unwrap()).await.unwrap();
        wait_for_generation(&slot, 1).await;

        sender.send(&WireFrame::from("ARKF0001,1,2,3")).await.unwrap();
        sender.send(&WireFrame::from("garbage")).await.unwrap();

        let second = TrackingSnapshot::zeroed().with(Channel::EyeBlinkLeft, 0.75);
        sender.send(&encode(&second).unwrap()).await.unwrap();
        wait_for_generation(&slot, 2).await;

        assert_eq!(slot.latest().unwrap().get(Channel::EyeBlinkLeft), 0.75);

        let stats = handle.shutdown().await;
        assert_eq!(stats.datagrams, 4);
        assert_eq!(stats.published, 2);
        assert_eq!(stats.dropped, 2);
    }

    #[tokio::test]
    async fn test_spawn_send_is_detached() {
        let receiver = SnapshotReceiver::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let sender = BroadcastSender::new(receiver.local_addr());
        let slot = Arc::new(LatestSnapshotSlot::new());
        let handle = receiver.spawn(Arc::clone(&slot));

        let snapshot = TrackingSnapshot::zeroed().with(Channel::MouthSmileRight, 0.3);
        sender
            .spawn_send(encode(&snapshot).unwrap())
            .unwrap()
            .await
            .unwrap();
        wait_for_generation(&slot, 1).await;

        handle.shutdown().await;
    }

    #[test]
    fn test_spawn_send_from_plain_thread() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (receiver, sender) = rt.block_on(async {
            let receiver = SnapshotReceiver::bind("127.0.0.1:0".parse().unwrap())
                .await
                .unwrap();
            let sender = BroadcastSender::new(receiver.local_addr());
            (receiver, sender)
        });
        let slot = Arc::new(LatestSnapshotSlot::new());
        let handle = rt.block_on(async { receiver.spawn(Arc::clone(&slot)) });

        let snapshot = TrackingSnapshot::zeroed().with(Channel::JawOpen, 0.6);
        let frame = encode(&snapshot).unwrap();
        let sent = std::thread::spawn(move || sender.spawn_send(frame).is_ok())
            .join()
            .unwrap();
        assert!(sent);

        rt.block_on(async {
            wait_for_generation(&slot, 1).await;
            handle.shutdown().await;
        });
        assert_eq!(slot.latest().as_deref(), Some(&snapshot));
    }

    #[test]
    fn test_spawn_send_without_runtime_is_error() {
        let sender = BroadcastSender::new("127.0.0.1:9".parse().unwrap());
        let frame = encode(&TrackingSnapshot::zeroed()).unwrap();
        assert!(matches!(
            sender.spawn_send(frame),
            Err(FacecastError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_loop() {
        let receiver = SnapshotReceiver::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = receiver.local_addr();
        let handle = receiver.spawn(Arc::new(LatestSnapshotSlot::new()));
        drop(handle);

        // Once the loop exits the port can be bound again
        timeout(Duration::from_secs(2), async {
            loop {
                if UdpSocket::bind(addr).await.is_ok() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("receive loop did not release its socket");
    }

    #[test]
    fn test_ingest_failure_keeps_previous() {
        let slot = LatestSnapshotSlot::new();
        let good = TrackingSnapshot::zeroed().with(Channel::JawOpen, 0.4);
        ingest_datagram(encode(&good).unwrap().as_bytes(), &slot).unwrap();

        assert!(ingest_datagram(b"ARKF0001,oops", &slot).is_err());
        assert_eq!(slot.generation(), 1);
        assert_eq!(slot.latest().as_deref(), Some(&good));
    }
}
