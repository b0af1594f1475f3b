//! Snapshot frame encoding and decoding
//!
//! Frame = `ARKF0001` + 21 × (`,` + value)
//!
//! Values are written with the shortest decimal form that parses back to the
//! identical `f32`, so `decode(encode(s)) == s` holds bit for bit for every
//! finite snapshot.

use std::fmt::{self, Write};

use facecast_core::{Channel, FacecastError, FacecastResult, TrackingSnapshot, SLOT_COUNT};

/// Magic header: ARKit face, format version 1
pub const HEADER: &str = "ARKF0001";

/// Field delimiter
pub const DELIMITER: char = ',';

/// Largest datagram a receiver reads (MTU-friendly; a worst-case frame is
/// well under this)
pub const MAX_FRAME_SIZE: usize = 1400;

/// Encoded text frame
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WireFrame(String);

impl WireFrame {
    /// Wrap datagram bytes; only validates that they are UTF-8
    pub fn from_bytes(buf: &[u8]) -> FacecastResult<Self> {
        std::str::from_utf8(buf)
            .map(|s| WireFrame(s.to_owned()))
            .map_err(|e| FacecastError::MalformedFrame(format!("not UTF-8: {}", e)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode this frame into a snapshot
    pub fn decode(&self) -> FacecastResult<TrackingSnapshot> {
        decode(&self.0)
    }
}

impl From<String> for WireFrame {
    fn from(s: String) -> Self {
        WireFrame(s)
    }
}

impl From<&str> for WireFrame {
    fn from(s: &str) -> Self {
        WireFrame(s.to_owned())
    }
}

impl fmt::Display for WireFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode a snapshot
///
/// Fails with `InvalidArgument` if any channel is NaN or infinite; such a
/// value would not survive the text round trip.
pub fn encode(snapshot: &TrackingSnapshot) -> FacecastResult<WireFrame> {
    if let Some(channel) = snapshot.first_non_finite() {
        return Err(FacecastError::InvalidArgument(format!(
            "channel {} is not finite",
            channel
        )));
    }

    // Typical frames are ~150 bytes
    let mut out = String::with_capacity(256);
    out.push_str(HEADER);
    for (_, value) in snapshot.channels() {
        // Writing to a String cannot fail
        let _ = write!(out, "{}{}", DELIMITER, value);
    }
    Ok(WireFrame(out))
}

/// Encode a raw slot slice laid out in wire order (slot 0 reserved)
pub fn encode_slots(slots: &[f32]) -> FacecastResult<WireFrame> {
    let snapshot = TrackingSnapshot::from_slots(slots)?;
    encode(&snapshot)
}

/// Decode a frame
///
/// The first field must be exactly the header. This is stricter than a
/// prefix match: `ARKF0001x,...` is rejected rather than read as version 1.
/// Fields 1..=21 must parse as finite floats (surrounding ASCII whitespace
/// is ignored). Extra trailing fields are ignored.
pub fn decode(frame: &str) -> FacecastResult<TrackingSnapshot> {
    if !frame.starts_with(HEADER) {
        return Err(FacecastError::MalformedFrame("bad header".into()));
    }

    let fields: Vec<&str> = frame.split(DELIMITER).collect();
    if fields[0] != HEADER {
        return Err(FacecastError::MalformedFrame(format!(
            "header field is '{}'",
            fields[0]
        )));
    }
    if fields.len() < SLOT_COUNT {
        return Err(FacecastError::MalformedFrame(format!(
            "expected {} fields, got {}",
            SLOT_COUNT,
            fields.len()
        )));
    }

    let mut snapshot = TrackingSnapshot::zeroed();
    for channel in Channel::ALL {
        let field = fields[channel.index()].trim();
        let value: f32 = field.parse().map_err(|_| {
            FacecastError::MalformedFrame(format!("channel {}: '{}' is not a number", channel, field))
        })?;
        if !value.is_finite() {
            return Err(FacecastError::MalformedFrame(format!(
                "channel {} is not finite",
                channel
            )));
        }
        snapshot.set(channel, value);
    }

    Ok(snapshot)
}

/// Decode raw datagram bytes
pub fn decode_bytes(buf: &[u8]) -> FacecastResult<TrackingSnapshot> {
    let text = std::str::from_utf8(buf)
        .map_err(|e| FacecastError::MalformedFrame(format!("not UTF-8: {}", e)))?;
    decode(text)
}
