//! Tracking channels
//!
//! A snapshot carries 21 scalar channels in a fixed order. The order is the
//! wire contract: channel `n` is always field `n` of a frame, and slot 0 is
//! reserved so that channel numbers and slot indices line up.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::FacecastError;

/// Number of populated channels in a snapshot
pub const CHANNEL_COUNT: usize = 21;

/// Number of slots in a snapshot, including the reserved slot 0
pub const SLOT_COUNT: usize = CHANNEL_COUNT + 1;

/// One named scalar slot within a tracking snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum Channel {
    PosX = 1,
    PosY = 2,
    PosZ = 3,
    /// Head rotation around X, degrees
    RotX = 4,
    /// Head rotation around Y, degrees
    RotY = 5,
    /// Head rotation around Z, degrees
    RotZ = 6,
    EyeWideLeft = 7,
    EyeWideRight = 8,
    MouthSmileLeft = 9,
    MouthSmileRight = 10,
    JawOpen = 11,
    EyeBlinkLeft = 12,
    EyeBlinkRight = 13,
    EyeLookInLeft = 14,
    EyeLookOutLeft = 15,
    EyeLookUpLeft = 16,
    EyeLookDownLeft = 17,
    EyeLookInRight = 18,
    EyeLookOutRight = 19,
    EyeLookUpRight = 20,
    EyeLookDownRight = 21,
}

impl Channel {
    /// All channels in wire order
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::PosX,
        Channel::PosY,
        Channel::PosZ,
        Channel::RotX,
        Channel::RotY,
        Channel::RotZ,
        Channel::EyeWideLeft,
        Channel::EyeWideRight,
        Channel::MouthSmileLeft,
        Channel::MouthSmileRight,
        Channel::JawOpen,
        Channel::EyeBlinkLeft,
        Channel::EyeBlinkRight,
        Channel::EyeLookInLeft,
        Channel::EyeLookOutLeft,
        Channel::EyeLookUpLeft,
        Channel::EyeLookDownLeft,
        Channel::EyeLookInRight,
        Channel::EyeLookOutRight,
        Channel::EyeLookUpRight,
        Channel::EyeLookDownRight,
    ];

    /// The 15 normalized expression channels, in wire order
    pub const EXPRESSIONS: [Channel; 15] = [
        Channel::EyeWideLeft,
        Channel::EyeWideRight,
        Channel::MouthSmileLeft,
        Channel::MouthSmileRight,
        Channel::JawOpen,
        Channel::EyeBlinkLeft,
        Channel::EyeBlinkRight,
        Channel::EyeLookInLeft,
        Channel::EyeLookOutLeft,
        Channel::EyeLookUpLeft,
        Channel::EyeLookDownLeft,
        Channel::EyeLookInRight,
        Channel::EyeLookOutRight,
        Channel::EyeLookUpRight,
        Channel::EyeLookDownRight,
    ];

    /// Slot index (1..=21)
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Channel for a slot index; slot 0 and anything past 21 have none
    pub fn from_index(index: usize) -> Option<Self> {
        if index == 0 {
            return None;
        }
        Channel::ALL.get(index - 1).copied()
    }

    /// Is this one of the normalized [0, 1] expression channels?
    pub fn is_expression(self) -> bool {
        self.index() >= Channel::EyeWideLeft.index()
    }

    /// Profile-facing name (camelCase, as used in rig profile files)
    pub fn name(self) -> &'static str {
        match self {
            Channel::PosX => "posX",
            Channel::PosY => "posY",
            Channel::PosZ => "posZ",
            Channel::RotX => "rotX",
            Channel::RotY => "rotY",
            Channel::RotZ => "rotZ",
            Channel::EyeWideLeft => "eyeWideLeft",
            Channel::EyeWideRight => "eyeWideRight",
            Channel::MouthSmileLeft => "mouthSmileLeft",
            Channel::MouthSmileRight => "mouthSmileRight",
            Channel::JawOpen => "jawOpen",
            Channel::EyeBlinkLeft => "eyeBlinkLeft",
            Channel::EyeBlinkRight => "eyeBlinkRight",
            Channel::EyeLookInLeft => "eyeLookInLeft",
            Channel::EyeLookOutLeft => "eyeLookOutLeft",
            Channel::EyeLookUpLeft => "eyeLookUpLeft",
            Channel::EyeLookDownLeft => "eyeLookDownLeft",
            Channel::EyeLookInRight => "eyeLookInRight",
            Channel::EyeLookOutRight => "eyeLookOutRight",
            Channel::EyeLookUpRight => "eyeLookUpRight",
            Channel::EyeLookDownRight => "eyeLookDownRight",
        }
    }

    /// Key the capture device reports this expression under.
    ///
    /// Head pose channels come from the anchor transform, not the blend
    /// shape dictionary, and have no key.
    pub fn capture_key(self) -> Option<&'static str> {
        let key = match self {
            Channel::PosX
            | Channel::PosY
            | Channel::PosZ
            | Channel::RotX
            | Channel::RotY
            | Channel::RotZ => return None,
            Channel::EyeWideLeft => "eyeWide_L",
            Channel::EyeWideRight => "eyeWide_R",
            Channel::MouthSmileLeft => "mouthSmile_L",
            Channel::MouthSmileRight => "mouthSmile_R",
            Channel::JawOpen => "jawOpen",
            Channel::EyeBlinkLeft => "eyeBlink_L",
            Channel::EyeBlinkRight => "eyeBlink_R",
            Channel::EyeLookInLeft => "eyeLookIn_L",
            Channel::EyeLookOutLeft => "eyeLookOut_L",
            Channel::EyeLookUpLeft => "eyeLookUp_L",
            Channel::EyeLookDownLeft => "eyeLookDown_L",
            Channel::EyeLookInRight => "eyeLookIn_R",
            Channel::EyeLookOutRight => "eyeLookOut_R",
            Channel::EyeLookUpRight => "eyeLookUp_R",
            Channel::EyeLookDownRight => "eyeLookDown_R",
        };
        Some(key)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = FacecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s || c.capture_key() == Some(s))
            .ok_or_else(|| FacecastError::InvalidArgument(format!("unknown channel '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_order_is_contiguous() {
        for (i, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i + 1);
            assert_eq!(Channel::from_index(i + 1), Some(*channel));
        }
        assert_eq!(Channel::from_index(0), None);
        assert_eq!(Channel::from_index(SLOT_COUNT), None);
    }

    #[test]
    fn test_expression_channels() {
        assert_eq!(Channel::EXPRESSIONS.len(), 15);
        assert!(Channel::EXPRESSIONS.iter().all(|c| c.is_expression()));
        assert!(Channel::EXPRESSIONS.iter().all(|c| c.capture_key().is_some()));
        assert!(!Channel::RotZ.is_expression());
        assert_eq!(Channel::RotZ.capture_key(), None);
    }

    #[test]
    fn test_channel_parse() {
        assert_eq!("jawOpen".parse::<Channel>().unwrap(), Channel::JawOpen);
        assert_eq!("eyeBlink_L".parse::<Channel>().unwrap(), Channel::EyeBlinkLeft);
        assert!("eyeBrowUp".parse::<Channel>().is_err());
    }
}
