//! Tracking snapshots
//!
//! A snapshot is one complete tracked-pose sample: head position, head
//! rotation and 15 expression weights. It is created once per capture tick,
//! never mutated after it is published, and replaced wholesale by the next
//! one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Channel, FacecastError, FacecastResult, Vec3, SLOT_COUNT};

/// One complete tracked-pose sample
///
/// Slot 0 is reserved and always zero; channel `n` lives in slot `n`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackingSnapshot {
    slots: [f32; SLOT_COUNT],
}

impl Default for TrackingSnapshot {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl TrackingSnapshot {
    /// Snapshot with every channel at zero
    pub fn zeroed() -> Self {
        TrackingSnapshot {
            slots: [0.0; SLOT_COUNT],
        }
    }

    /// Build from a raw slot slice laid out in wire order.
    ///
    /// Needs at least `SLOT_COUNT` entries; anything past the last channel is
    /// ignored and slot 0 is cleared.
    pub fn from_slots(slots: &[f32]) -> FacecastResult<Self> {
        if slots.len() < SLOT_COUNT {
            return Err(FacecastError::InvalidArgument(format!(
                "snapshot needs {} slots, got {}",
                SLOT_COUNT,
                slots.len()
            )));
        }
        let mut snapshot = Self::zeroed();
        snapshot.slots[1..].copy_from_slice(&slots[1..SLOT_COUNT]);
        Ok(snapshot)
    }

    /// Pack a capture sample, failing on the first missing expression key
    pub fn from_capture(sample: &CaptureSample) -> FacecastResult<Self> {
        let mut snapshot = Self::zeroed();
        snapshot.set_head_position(sample.position);
        snapshot.set_head_rotation(sample.rotation);

        for channel in Channel::EXPRESSIONS {
            let key = channel.capture_key().unwrap_or_else(|| channel.name());
            let value = sample
                .expressions
                .get(key)
                .or_else(|| sample.expressions.get(channel.name()))
                .copied()
                .ok_or_else(|| {
                    FacecastError::InvalidArgument(format!("capture sample is missing '{}'", key))
                })?;
            snapshot.set(channel, value);
        }

        Ok(snapshot)
    }

    #[inline]
    pub fn get(&self, channel: Channel) -> f32 {
        self.slots[channel.index()]
    }

    #[inline]
    pub fn set(&mut self, channel: Channel, value: f32) {
        self.slots[channel.index()] = value;
    }

    /// Builder-style `set`
    pub fn with(mut self, channel: Channel, value: f32) -> Self {
        self.set(channel, value);
        self
    }

    /// All slots including the reserved slot 0
    pub fn slots(&self) -> &[f32; SLOT_COUNT] {
        &self.slots
    }

    /// Channel values in wire order (slots 1..=21)
    pub fn channels(&self) -> impl Iterator<Item = (Channel, f32)> + '_ {
        Channel::ALL.iter().map(move |c| (*c, self.get(*c)))
    }

    pub fn head_position(&self) -> Vec3 {
        Vec3::new(
            self.get(Channel::PosX),
            self.get(Channel::PosY),
            self.get(Channel::PosZ),
        )
    }

    /// Head rotation as Euler angles in degrees
    pub fn head_rotation(&self) -> Vec3 {
        Vec3::new(
            self.get(Channel::RotX),
            self.get(Channel::RotY),
            self.get(Channel::RotZ),
        )
    }

    pub fn set_head_position(&mut self, p: Vec3) {
        self.set(Channel::PosX, p.x);
        self.set(Channel::PosY, p.y);
        self.set(Channel::PosZ, p.z);
    }

    pub fn set_head_rotation(&mut self, r: Vec3) {
        self.set(Channel::RotX, r.x);
        self.set(Channel::RotY, r.y);
        self.set(Channel::RotZ, r.z);
    }

    /// First channel holding NaN or an infinity, if any
    pub fn first_non_finite(&self) -> Option<Channel> {
        self.channels().find(|(_, v)| !v.is_finite()).map(|(c, _)| c)
    }
}

/// Raw tracking input as the capture device reports it
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureSample {
    /// Head anchor position
    pub position: Vec3,
    /// Head anchor rotation, Euler degrees
    pub rotation: Vec3,
    /// Expression weights keyed by capture name (`jawOpen`, `eyeBlink_L`, ...)
    pub expressions: HashMap<String, f32>,
}

impl CaptureSample {
    pub fn new(position: Vec3, rotation: Vec3) -> Self {
        Self {
            position,
            rotation,
            expressions: HashMap::new(),
        }
    }

    /// Sample with every expression key present at `value`
    pub fn uniform(position: Vec3, rotation: Vec3, value: f32) -> Self {
        let mut sample = Self::new(position, rotation);
        for channel in Channel::EXPRESSIONS {
            if let Some(key) = channel.capture_key() {
                sample.expressions.insert(key.to_string(), value);
            }
        }
        sample
    }

    /// Set one expression by channel
    pub fn with_expression(mut self, channel: Channel, value: f32) -> Self {
        if let Some(key) = channel.capture_key() {
            self.expressions.insert(key.to_string(), value);
        }
        self
    }
}
