//! FaceCast Transport Layer - UDP broadcast and the latest-snapshot slot
//!
//! This crate provides:
//! - `LatestSnapshotSlot`, the single-slot mailbox between the network and
//!   the update tick
//! - A fire-and-forget broadcast sender
//! - A background receive loop that publishes decoded snapshots

pub mod slot;
pub mod udp;

pub use slot::*;
pub use udp::*;

/// Port the reference deployment broadcasts on
pub const DEFAULT_PORT: u16 = 11340;
