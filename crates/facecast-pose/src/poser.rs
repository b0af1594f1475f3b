//! Joint chain poser
//!
//! A head driven by one joint takes the whole rotation sample. A four-joint
//! chain (head, neck, upper chest, chest) spreads it, each joint moving a
//! fixed fraction of the way from its rest rotation toward the sample.

use facecast_core::{Quat, Vec3};

use crate::Bone;

/// Share of the sample each joint of a four-joint chain takes, head first
pub const CHAIN_WEIGHTS: [f32; 4] = [0.5, 0.35, 0.1, 0.05];

/// Joints and rest pose captured at activation
#[derive(Debug)]
struct Rig<B> {
    root: B,
    rest_position: Vec3,
    joints: Vec<B>,
    rest: Vec<Quat>,
}

#[derive(Debug)]
enum PoserState<B> {
    Uninitialized,
    Active(Rig<B>),
}

/// Applies head position and rotation samples to a joint chain
#[derive(Debug)]
pub struct Poser<B> {
    state: PoserState<B>,
    sample: Option<(Vec3, Quat)>,
}

impl<B> Default for Poser<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> Poser<B> {
    pub fn new() -> Self {
        Poser {
            state: PoserState::Uninitialized,
            sample: None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, PoserState::Active(_))
    }

    /// Number of joints in the active chain
    pub fn chain_len(&self) -> usize {
        match &self.state {
            PoserState::Active(rig) => rig.joints.len(),
            PoserState::Uninitialized => 0,
        }
    }

    /// Buffer a sample for the next `apply`. Moves nothing.
    pub fn update(&mut self, position: Vec3, rotation: Quat) {
        self.sample = Some((position, rotation));
    }

    /// Release the chain and return its joints
    pub fn deactivate(&mut self) -> Option<(B, Vec<B>)> {
        self.sample = None;
        match std::mem::replace(&mut self.state, PoserState::Uninitialized) {
            PoserState::Active(rig) => Some((rig.root, rig.joints)),
            PoserState::Uninitialized => None,
        }
    }
}

impl<B: Bone> Poser<B> {
    /// Take ownership of the chain and capture its rest pose.
    ///
    /// Any previously active chain is dropped. Chains of other than one or
    /// four joints are accepted, but their joints are never rotated.
    pub fn activate(&mut self, root: B, joints: Vec<B>) {
        let rest_position = root.local_position();
        let rest = joints.iter().map(|j| j.local_rotation()).collect();

        if !matches!(joints.len(), 1 | 4) {
            tracing::warn!(joints = joints.len(), "unsupported joint chain length, rotation disabled");
        }

        self.sample = None;
        self.state = PoserState::Active(Rig {
            root,
            rest_position,
            joints,
            rest,
        });
    }

    /// Root position captured at activation
    pub fn rest_position(&self) -> Option<Vec3> {
        match &self.state {
            PoserState::Active(rig) => Some(rig.rest_position),
            PoserState::Uninitialized => None,
        }
    }

    /// Rest rotation of joint `i`
    pub fn rest_rotation(&self, i: usize) -> Option<Quat> {
        match &self.state {
            PoserState::Active(rig) => rig.rest.get(i).copied(),
            PoserState::Uninitialized => None,
        }
    }

    pub fn root(&self) -> Option<&B> {
        match &self.state {
            PoserState::Active(rig) => Some(&rig.root),
            PoserState::Uninitialized => None,
        }
    }

    pub fn joint(&self, i: usize) -> Option<&B> {
        match &self.state {
            PoserState::Active(rig) => rig.joints.get(i),
            PoserState::Uninitialized => None,
        }
    }

    /// Write the buffered sample to the chain.
    ///
    /// Each joint is computed from its rest rotation, so calling this twice
    /// with the same sample gives the same pose.
    pub fn apply(&mut self) {
        let (rig, (position, sample)) = match (&mut self.state, self.sample) {
            (PoserState::Active(rig), Some(sample)) => (rig, sample),
            _ => return,
        };

        rig.root.set_position(position);

        match rig.joints.len() {
            1 => rig.joints[0].set_local_rotation(rig.rest[0] * sample),
            4 => {
                for ((joint, rest), weight) in rig.joints.iter_mut().zip(&rig.rest).zip(CHAIN_WEIGHTS) {
                    joint.set_local_rotation(*rest * rest.slerp(&sample, weight));
                }
            }
            _ => {}
        }
    }
}
