use once_cell::sync::Lazy;
use serde::{Serialize, Deserialize};
use std::borrow::Cow;
use std::time::Duration;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::constants::*;
use crate::error::ConfigError;
use crate::wheel_config::{Color, SegmentMap, SegmentSpec, WheelConfig};

static DEFAULT_SEGMENT_COLORS: Lazy<Vec<Color>> = Lazy::new(|| vec![Color::red(), Color::green()]);

/// Everything an operator can tune. Only `initial_balance`, the segment
/// layout and `default_color` affect game logic; the rest is cosmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub initial_balance: u64,
    pub segment_count: usize,
    /// Colors cycled around the wheel when no explicit map is given.
    pub segment_colors: Vec<Color>,
    /// Explicit per-segment colors; overrides `segment_colors`.
    pub segment_map: Option<Vec<Color>>,
    pub extra_rotations: u32,
    pub spin_duration_ms: u64,
    pub default_color: Option<Color>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            initial_balance: DEFAULT_INITIAL_BALANCE,
            segment_count: DEFAULT_SEGMENT_COUNT,
            segment_colors: DEFAULT_SEGMENT_COLORS.clone(),
            segment_map: None,
            extra_rotations: DEFAULT_EXTRA_ROTATIONS,
            spin_duration_ms: DEFAULT_SPIN_DURATION_MS,
            default_color: Some(Color::red()),
        }
    }
}

fn out_of_range(code: &'static str, value: u64, min: u64, max: u64) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(format!("must be between {} and {}", min, max)));
    error.add_param(Cow::Borrowed("value"), &value);
    error.add_param(Cow::Borrowed("min"), &min);
    error.add_param(Cow::Borrowed("max"), &max);
    error
}

impl Validate for GameSettings {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.initial_balance == 0 || self.initial_balance > MAX_INITIAL_BALANCE {
            errors.add(
                "initial_balance",
                out_of_range("range", self.initial_balance, 1, MAX_INITIAL_BALANCE),
            );
        }
        if self.extra_rotations > MAX_EXTRA_ROTATIONS {
            errors.add(
                "extra_rotations",
                out_of_range("range", self.extra_rotations as u64, 0, MAX_EXTRA_ROTATIONS as u64),
            );
        }
        if self.spin_duration_ms > MAX_SPIN_DURATION_MS {
            errors.add(
                "spin_duration_ms",
                out_of_range("range", self.spin_duration_ms, 0, MAX_SPIN_DURATION_MS),
            );
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl GameSettings {
    pub fn segment_spec(&self) -> SegmentSpec {
        match &self.segment_map {
            Some(colors) => SegmentSpec::explicit(colors.clone(), self.segment_count),
            None => SegmentSpec::alternating(self.segment_colors.clone(), self.segment_count),
        }
    }

    /// Validates the settings and builds the immutable wheel. Meant to run
    /// once at startup.
    pub fn build(&self) -> Result<WheelConfig, ConfigError> {
        self.validate()?;
        let segments = SegmentMap::build(&self.segment_spec())?;
        WheelConfig::new(
            segments,
            self.extra_rotations,
            self.initial_balance,
            self.default_color.clone(),
            Duration::from_millis(self.spin_duration_ms),
        )
    }
}
