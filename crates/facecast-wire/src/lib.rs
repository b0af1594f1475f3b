//! FaceCast Wire Protocol - Text snapshot frames
//!
//! A frame is plain ASCII:
//! - 8-byte magic header `ARKF0001`
//! - 21 fields, each `,` followed by a decimal float, in channel order
//!
//! Frames carry no sequence number or sender identity; the newest frame
//! simply supersedes whatever came before it.

pub mod frame;

pub use frame::*;
