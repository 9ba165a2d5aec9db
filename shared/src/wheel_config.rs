use serde::{Serialize, Deserialize};
use std::fmt;
use std::time::Duration;

use crate::error::{ConfigError, EmptyColorName};

pub const FULL_TURN_DEGREES: usize = 360;

/// A wheel color. Names are trimmed and lowercased so `"Red"` and `"red"`
/// are the same palette member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    pub fn new(name: &str) -> Result<Self, EmptyColorName> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EmptyColorName);
        }
        Ok(Self(name.to_lowercase()))
    }

    pub fn red() -> Self {
        Self("red".to_string())
    }

    pub fn green() -> Self {
        Self("green".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Color {
    type Error = EmptyColorName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::new(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compact description of how colors are laid out around the wheel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum SegmentSpec {
    /// Cycle through `colors` across `count` equal segments, starting with the first.
    Alternating { colors: Vec<Color>, count: usize },
    /// One color per segment; `colors.len()` must equal `count`.
    Explicit { colors: Vec<Color>, count: usize },
}

impl SegmentSpec {
    pub fn alternating(colors: Vec<Color>, count: usize) -> Self {
        Self::Alternating { colors, count }
    }

    pub fn explicit(colors: Vec<Color>, count: usize) -> Self {
        Self::Explicit { colors, count }
    }
}

/// The authoritative `segment index -> color` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMap {
    segments: Vec<Color>,
}

impl SegmentMap {
    pub fn build(spec: &SegmentSpec) -> Result<Self, ConfigError> {
        let segments = match spec {
            SegmentSpec::Alternating { colors, count } => {
                if *count == 0 {
                    return Err(ConfigError::InvalidSegmentCount { count: 0 });
                }
                if colors.is_empty() {
                    return Err(ConfigError::EmptyPalette);
                }
                colors.iter().cycle().take(*count).cloned().collect::<Vec<_>>()
            }
            SegmentSpec::Explicit { colors, count } => {
                if *count == 0 {
                    return Err(ConfigError::InvalidSegmentCount { count: 0 });
                }
                if colors.len() != *count {
                    return Err(ConfigError::SegmentMapLengthMismatch {
                        expected: *count,
                        actual: colors.len(),
                    });
                }
                colors.clone()
            }
        };
        Ok(Self { segments })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn color_at(&self, index: usize) -> Option<&Color> {
        self.segments.get(index)
    }

    pub fn colors(&self) -> &[Color] {
        &self.segments
    }

    /// Distinct colors in order of first appearance.
    pub fn palette(&self) -> Vec<Color> {
        let mut palette: Vec<Color> = Vec::new();
        for color in &self.segments {
            if !palette.contains(color) {
                palette.push(color.clone());
            }
        }
        palette
    }

    pub fn contains(&self, color: &Color) -> bool {
        self.segments.contains(color)
    }
}

/// Immutable wheel setup shared by every session for the process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct WheelConfig {
    segments: SegmentMap,
    extra_rotations: u32,
    initial_balance: u64,
    default_color: Option<Color>,
    spin_duration: Duration,
}

impl WheelConfig {
    pub fn new(
        segments: SegmentMap,
        extra_rotations: u32,
        initial_balance: u64,
        default_color: Option<Color>,
        spin_duration: Duration,
    ) -> Result<Self, ConfigError> {
        let count = segments.len();
        if count == 0 || FULL_TURN_DEGREES % count != 0 {
            return Err(ConfigError::InvalidSegmentCount { count });
        }
        if let Some(color) = &default_color {
            if !segments.contains(color) {
                return Err(ConfigError::UnknownDefaultColor(color.to_string()));
            }
        }
        log::info!(
            "wheel configured: {} segments, palette {:?}, initial balance {}",
            count,
            segments.palette().iter().map(Color::as_str).collect::<Vec<_>>(),
            initial_balance
        );
        Ok(Self {
            segments,
            extra_rotations,
            initial_balance,
            default_color,
            spin_duration,
        })
    }

    pub fn segments(&self) -> &SegmentMap {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn extra_rotations(&self) -> u32 {
        self.extra_rotations
    }

    pub fn initial_balance(&self) -> u64 {
        self.initial_balance
    }

    pub fn default_color(&self) -> Option<&Color> {
        self.default_color.as_ref()
    }

    pub fn spin_duration(&self) -> Duration {
        self.spin_duration
    }

    pub fn segment_angle(&self) -> f64 {
        FULL_TURN_DEGREES as f64 / self.segment_count() as f64
    }

    /// Angle of the center of `segment_index`, measured clockwise from the pointer.
    pub fn segment_center(&self, segment_index: usize) -> f64 {
        let angle = self.segment_angle();
        segment_index as f64 * angle + angle / 2.0
    }

    /// Landing angle for a spin that starts from rest, including the cosmetic
    /// full turns. Always derived from the already-chosen segment.
    pub fn landing_angle(&self, segment_index: usize) -> f64 {
        self.segment_center(segment_index) + self.extra_rotations as f64 * FULL_TURN_DEGREES as f64
    }

    /// Absolute wheel rotation after spinning from `current` to `segment_index`.
    /// Drops the partial turn already applied so the result is always
    /// `whole turns + landing angle` and keeps increasing.
    pub fn next_rotation(&self, current: f64, segment_index: usize) -> f64 {
        let whole_turns = current - current.rem_euclid(FULL_TURN_DEGREES as f64);
        whole_turns + self.landing_angle(segment_index)
    }
}
