//! FaceCast Core - Fundamental types and primitives
//!
//! This crate defines the core types shared by every FaceCast crate:
//! - Tracking channels and their fixed wire order
//! - Tracking snapshots and raw capture samples
//! - Vector and quaternion math used by retargeting and posing
//! - The error taxonomy

pub mod channel;
pub mod error;
pub mod math;
pub mod snapshot;

pub use channel::*;
pub use error::*;
pub use math::*;
pub use snapshot::*;
