//! One avatar: a rig, its profile, its poser and its wear flag

use std::sync::Arc;

use facecast_core::{Quat, TrackingSnapshot};
use facecast_pose::{remap_snapshot, Bone, Poser};
use facecast_rig::{RetargetFrame, Retargeter, RigProfile, RigSink, WearState};

/// The scene objects an avatar drives
#[derive(Debug)]
pub struct AvatarRig<B, S> {
    /// Positioned from the head translation
    pub root: B,
    /// Head first; one or four joints are smoothed
    pub joints: Vec<B>,
    pub left_eye: Option<B>,
    pub right_eye: Option<B>,
    /// Blend-shape and sub-part outputs
    pub face: S,
}

impl<B, S> AvatarRig<B, S> {
    pub fn new(root: B, joints: Vec<B>, face: S) -> Self {
        AvatarRig {
            root,
            joints,
            left_eye: None,
            right_eye: None,
            face,
        }
    }

    pub fn with_eyes(mut self, left: B, right: B) -> Self {
        self.left_eye = Some(left);
        self.right_eye = Some(right);
        self
    }
}

/// Rig driven by one profile
pub struct Avatar<B, S> {
    retargeter: Retargeter,
    poser: Poser<B>,
    /// Root and joints while the poser does not hold them
    parked: Option<(B, Vec<B>)>,
    left_eye: Option<B>,
    right_eye: Option<B>,
    face: S,
    wear: WearState,
    current: Option<TrackingSnapshot>,
}

impl<B: Bone, S: RigSink> Avatar<B, S> {
    /// Inactive avatar
    pub fn new(profile: Arc<RigProfile>, rig: AvatarRig<B, S>) -> Self {
        Avatar {
            retargeter: Retargeter::new(profile),
            poser: Poser::new(),
            parked: Some((rig.root, rig.joints)),
            left_eye: rig.left_eye,
            right_eye: rig.right_eye,
            face: rig.face,
            wear: WearState::new(),
            current: None,
        }
    }

    pub fn profile(&self) -> &Arc<RigProfile> {
        self.retargeter.profile()
    }

    pub fn id(&self) -> &str {
        &self.profile().id
    }

    pub fn is_active(&self) -> bool {
        self.poser.is_active()
    }

    pub fn is_wearing(&self) -> bool {
        self.wear.is_wearing()
    }

    /// Hand the joint chain to the poser; the current pose becomes rest
    pub fn activate(&mut self) {
        if let Some((root, joints)) = self.parked.take() {
            tracing::debug!(avatar = %self.id(), joints = joints.len(), "avatar activated");
            self.poser.activate(root, joints);
        }
    }

    /// Take the chain back from the poser and forget the last snapshot
    pub fn deactivate(&mut self) {
        if let Some(parts) = self.poser.deactivate() {
            tracing::debug!(avatar = %self.id(), "avatar deactivated");
            self.parked = Some(parts);
        }
        self.current = None;
    }

    /// Remember a snapshot and buffer its head pose. Moves nothing.
    pub fn update_tracking(&mut self, snapshot: &TrackingSnapshot) {
        let (position, rotation) = remap_snapshot(snapshot);
        self.poser.update(position, rotation);
        self.current = Some(*snapshot);
    }

    /// Apply the buffered pose, write expression weights and rotate the
    /// eyes. Returns `None` until the first snapshot arrives.
    pub fn late_update(&mut self) -> Option<RetargetFrame> {
        self.poser.apply();

        let snapshot = self.current?;
        let frame = self.retargeter.drive(&snapshot, &mut self.face);

        if let Some(eye) = &mut self.left_eye {
            eye.set_local_rotation(Quat::from_euler_degrees(frame.eyes.left));
        }
        if let Some(eye) = &mut self.right_eye {
            eye.set_local_rotation(Quat::from_euler_degrees(frame.eyes.right));
        }
        Some(frame)
    }

    /// Flip the wear flag and write the profile's wear outputs
    pub fn toggle_wear(&mut self) -> bool {
        let wearing = self.wear.toggle(self.retargeter.profile(), &mut self.face);
        tracing::debug!(avatar = %self.id(), wearing, "wear toggled");
        wearing
    }

    pub fn face(&self) -> &S {
        &self.face
    }

    pub fn root(&self) -> Option<&B> {
        match &self.parked {
            Some((root, _)) => Some(root),
            None => self.poser.root(),
        }
    }

    pub fn joint(&self, i: usize) -> Option<&B> {
        match &self.parked {
            Some((_, joints)) => joints.get(i),
            None => self.poser.joint(i),
        }
    }

    pub fn left_eye(&self) -> Option<&B> {
        self.left_eye.as_ref()
    }

    pub fn right_eye(&self) -> Option<&B> {
        self.right_eye.as_ref()
    }
}
