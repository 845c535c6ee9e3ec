//! Volume control
//!
//! Volume is a linear level in `[0, 1]`. Mute is independent and never
//! overwrites the stored level; the device gain is `level × (muted ? 0 : 1)`.

/// Volume controller
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// Volume level (0.0-1.0)
    level: f32,

    /// Mute state (preserves volume level)
    muted: bool,
}

impl Volume {
    /// Create new volume controller
    pub fn new(level: f32) -> Self {
        let mut volume = Self {
            level: 1.0,
            muted: false,
        };
        volume.set_level(level);
        volume
    }

    /// Set volume level, clamped to `[0, 1]`
    ///
    /// Non-finite input is ignored. Returns true if the level changed.
    pub fn set_level(&mut self, level: f32) -> bool {
        if !level.is_finite() {
            return false;
        }
        let level = level.clamp(0.0, 1.0);
        let changed = (level - self.level).abs() > f32::EPSILON;
        self.level = level;
        changed
    }

    /// Get current volume level (0.0-1.0)
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn set_muted(&mut self, muted: bool) -> bool {
        let changed = self.muted != muted;
        self.muted = muted;
        changed
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Gain applied at the device boundary
    pub fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.level
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(1.0)
    }
}
