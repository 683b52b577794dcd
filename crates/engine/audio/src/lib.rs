//! Audio channel capabilities for voice chat
//!
//! This crate describes the contract between audio channels and the external
//! mixer that spatializes them:
//! - [`AudioChannel`]: what every channel exposes
//! - [`LocationalAudioChannel`]: channels that can be placed in 3D space
//! - [`Position`]: world-space coordinates understood by the mixer
//!
//! # Example
//!
//! ```rust
//! use voicechat_audio::{AudioChannel, LocationalChannel, LocationalAudioChannel, Position};
//!
//! let mut channel = LocationalChannel::new(Position::new(0.0, 64.0, 0.0));
//! channel.update_location(Position::new(10.0, 64.0, -3.5));
//!
//! // The mixer reads the location on its next spatialization pass.
//! assert_eq!(channel.location(), Position::new(10.0, 64.0, -3.5));
//! assert!(channel.as_locational().is_some());
//! ```

pub mod channel;

pub use channel::{
    AudioChannel, ChannelId, ChannelKind, LocationalAudioChannel, LocationalChannel,
    StaticChannel,
};

use glam::DVec3;

/// Error types for the audio crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Audio channel {0} is closed")]
    ChannelClosed(ChannelId),
}

/// Result type for audio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Position in world space.
///
/// Carries no world/dimension identifier; that context belongs to the channel.
/// Coordinates are not validated here.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Position(DVec3);

impl Position {
    pub const ORIGIN: Self = Self(DVec3::ZERO);

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(DVec3::new(x, y, z))
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    pub fn z(&self) -> f64 {
        self.0.z
    }

    /// Distance to another position, for mixers that attenuate by range
    pub fn distance(&self, other: Position) -> f64 {
        self.0.distance(other.0)
    }

    pub fn as_dvec3(&self) -> DVec3 {
        self.0
    }
}

impl From<DVec3> for Position {
    fn from(value: DVec3) -> Self {
        Self(value)
    }
}

impl From<glam::Vec3> for Position {
    fn from(value: glam::Vec3) -> Self {
        Self(value.as_dvec3())
    }
}

impl From<Position> for DVec3 {
    fn from(value: Position) -> Self {
        value.0
    }
}
