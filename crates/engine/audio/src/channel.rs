//! Audio channel capabilities
//!
//! Every channel implements [`AudioChannel`]. Channels the mixer may place in
//! the world additionally implement [`LocationalAudioChannel`]. The set of
//! variants is closed: [`LocationalChannel`] and [`StaticChannel`].

use std::fmt;

use tracing::debug;
use uuid::Uuid;

use crate::{Error, Position, Result};

/// Unique identifier of an audio channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ChannelId(pub Uuid);

impl ChannelId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Channel variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ChannelKind {
    /// Placed in 3D space by the mixer
    Locational,
    /// Played without spatialization
    Static,
}

/// Capabilities shared by all audio channels
pub trait AudioChannel {
    fn id(&self) -> ChannelId;

    /// Volume category the channel is mixed under
    fn category(&self) -> Option<&str>;

    fn set_category(&mut self, category: Option<String>);

    fn is_closed(&self) -> bool;

    fn close(&mut self);

    fn kind(&self) -> ChannelKind;

    /// Fails with [`Error::ChannelClosed`] once the channel has been closed.
    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::ChannelClosed(self.id()))
        } else {
            Ok(())
        }
    }

    /// The positional capability, if this channel has one.
    fn as_locational(&self) -> Option<&dyn LocationalAudioChannel> {
        None
    }

    fn as_locational_mut(&mut self) -> Option<&mut dyn LocationalAudioChannel> {
        None
    }
}

/// A channel the mixer can place in 3D space.
pub trait LocationalAudioChannel: AudioChannel {
    /// Replace the channel's position.
    ///
    /// Only stores the value; the mixer picks it up on its next
    /// spatialization pass.
    fn update_location(&mut self, position: Position);

    /// The most recently set position.
    fn location(&self) -> Position;
}

#[derive(Debug, Clone)]
struct ChannelCommon {
    id: ChannelId,
    category: Option<String>,
    closed: bool,
}

impl ChannelCommon {
    fn new() -> Self {
        Self {
            id: ChannelId::new_v4(),
            category: None,
            closed: false,
        }
    }
}

/// Positional channel
#[derive(Debug, Clone)]
pub struct LocationalChannel {
    common: ChannelCommon,
    location: Position,
}

impl LocationalChannel {
    pub fn new(location: Position) -> Self {
        Self {
            common: ChannelCommon::new(),
            location,
        }
    }
}

impl AudioChannel for LocationalChannel {
    fn id(&self) -> ChannelId {
        self.common.id
    }

    fn category(&self) -> Option<&str> {
        self.common.category.as_deref()
    }

    fn set_category(&mut self, category: Option<String>) {
        self.common.category = category;
    }

    fn is_closed(&self) -> bool {
        self.common.closed
    }

    fn close(&mut self) {
        debug!("Closing locational channel {}", self.common.id);
        self.common.closed = true;
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Locational
    }

    fn as_locational(&self) -> Option<&dyn LocationalAudioChannel> {
        Some(self)
    }

    fn as_locational_mut(&mut self) -> Option<&mut dyn LocationalAudioChannel> {
        Some(self)
    }
}

impl LocationalAudioChannel for LocationalChannel {
    fn update_location(&mut self, position: Position) {
        self.location = position;
    }

    fn location(&self) -> Position {
        self.location
    }
}

/// Non-positional channel
#[derive(Debug, Clone)]
pub struct StaticChannel {
    common: ChannelCommon,
}

impl StaticChannel {
    pub fn new() -> Self {
        Self {
            common: ChannelCommon::new(),
        }
    }
}

impl Default for StaticChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioChannel for StaticChannel {
    fn id(&self) -> ChannelId {
        self.common.id
    }

    fn category(&self) -> Option<&str> {
        self.common.category.as_deref()
    }

    fn set_category(&mut self, category: Option<String>) {
        self.common.category = category;
    }

    fn is_closed(&self) -> bool {
        self.common.closed
    }

    fn close(&mut self) {
        debug!("Closing static channel {}", self.common.id);
        self.common.closed = true;
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Static
    }
}
