//! Avatar roster
//!
//! Exactly one avatar is active whenever the roster is non-empty. Tracking,
//! ticks and wear toggles go to the active avatar only.

use facecast_core::{FacecastError, FacecastResult, TrackingSnapshot};
use facecast_pose::Bone;
use facecast_rig::{ProfileRegistry, RetargetFrame, RigProfile, RigSink};

use crate::{Avatar, AvatarRig};

/// Ordered set of avatars with one active
pub struct AvatarRoster<B, S> {
    avatars: Vec<Avatar<B, S>>,
    active: usize,
}

impl<B: Bone, S: RigSink> AvatarRoster<B, S> {
    /// Roster with the first avatar active
    pub fn new(avatars: Vec<Avatar<B, S>>) -> Self {
        let mut roster = AvatarRoster { avatars, active: 0 };
        if let Some(first) = roster.avatars.first_mut() {
            first.activate();
        }
        roster
    }

    /// Build one avatar per id, creating each rig with `make_rig`
    pub fn from_registry<F>(registry: &ProfileRegistry, ids: &[String], mut make_rig: F) -> FacecastResult<Self>
    where
        F: FnMut(&RigProfile) -> AvatarRig<B, S>,
    {
        let mut avatars = Vec::with_capacity(ids.len());
        for id in ids {
            let profile = registry.get(id)?;
            let rig = make_rig(&profile);
            avatars.push(Avatar::new(profile, rig));
        }
        Ok(Self::new(avatars))
    }

    pub fn len(&self) -> usize {
        self.avatars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.avatars.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.avatars.iter().map(|a| a.id())
    }

    pub fn active_index(&self) -> Option<usize> {
        (!self.avatars.is_empty()).then_some(self.active)
    }

    pub fn active(&self) -> Option<&Avatar<B, S>> {
        self.avatars.get(self.active)
    }

    pub fn active_mut(&mut self) -> Option<&mut Avatar<B, S>> {
        self.avatars.get_mut(self.active)
    }

    pub fn get(&self, index: usize) -> Option<&Avatar<B, S>> {
        self.avatars.get(index)
    }

    /// Make avatar `index` the active one
    pub fn select(&mut self, index: usize) -> FacecastResult<()> {
        if index >= self.avatars.len() {
            return Err(FacecastError::InvalidArgument(format!(
                "avatar index {} out of range ({} avatars)",
                index,
                self.avatars.len()
            )));
        }
        if index == self.active && self.avatars[index].is_active() {
            return Ok(());
        }

        self.avatars[self.active].deactivate();
        self.active = index;
        self.avatars[index].activate();
        tracing::info!(avatar = %self.avatars[index].id(), index, "active avatar changed");
        Ok(())
    }

    /// Make the avatar with this profile id the active one
    pub fn select_id(&mut self, id: &str) -> FacecastResult<()> {
        let index = self
            .avatars
            .iter()
            .position(|a| a.id() == id)
            .ok_or_else(|| FacecastError::UnknownRig(id.to_owned()))?;
        self.select(index)
    }

    /// Step to the next (or previous) avatar, wrapping at both ends
    pub fn switch(&mut self, forward: bool) -> Option<usize> {
        let len = self.avatars.len();
        if len == 0 {
            return None;
        }
        let next = if forward {
            (self.active + 1) % len
        } else {
            (self.active + len - 1) % len
        };
        // next < len, so select cannot fail
        self.select(next).ok()?;
        Some(next)
    }

    /// Toggle wear on the active avatar; `None` if the roster is empty
    pub fn toggle_active_wear(&mut self) -> Option<bool> {
        self.active_mut().map(Avatar::toggle_wear)
    }

    pub fn update_tracking(&mut self, snapshot: &TrackingSnapshot) {
        if let Some(avatar) = self.active_mut() {
            avatar.update_tracking(snapshot);
        }
    }

    pub fn late_update(&mut self) -> Option<RetargetFrame> {
        self.active_mut().and_then(Avatar::late_update)
    }
}
