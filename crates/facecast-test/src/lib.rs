//! FaceCast Test Harness - Synthetic capture and hostile-network testing
//!
//! This crate provides:
//! - A deterministic synthetic face for driving senders without a camera
//! - A lossy link that drops, delays, reorders, duplicates and damages
//!   datagrams
//! - End-to-end sessions checking what reaches the rig under those
//!   conditions

pub mod chaos;
pub mod integration;
pub mod synthetic;

pub use chaos::*;
pub use integration::*;
pub use synthetic::*;
