//! Error types for FaceCast

use thiserror::Error;

/// Core FaceCast errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FacecastError {
    // Wire errors
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Profile errors
    #[error("Profile '{profile}' rejected: {reason}")]
    ProfileValidation { profile: String, reason: String },

    #[error("Unknown rig: {0}")]
    UnknownRig(String),

    // Transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FacecastError {
    /// Shorthand for a profile validation failure
    pub fn profile(profile: impl Into<String>, reason: impl Into<String>) -> Self {
        FacecastError::ProfileValidation {
            profile: profile.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for FaceCast operations
pub type FacecastResult<T> = Result<T, FacecastError>;
