use thiserror::Error;

/// Reasons a spin request is refused. Nothing is mutated when one of these
/// is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("stake must be a positive whole number")]
    InvalidStake,
    #[error("stake {stake} exceeds balance {balance}")]
    InsufficientBalance { stake: u64, balance: u64 },
    #[error("a win on stake {stake} would exceed the table limit of {limit}")]
    OverTableLimit { stake: u64, limit: u64 },
    #[error("no color selected")]
    NoColorSelected,
    #[error("a spin is already in flight")]
    SpinInProgress,
    #[error("color `{0}` is not on the wheel")]
    UnknownColor(String),
}

impl RequestError {
    /// Stable machine-readable name, used by callers that render their own text.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidStake => "invalid_stake",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::OverTableLimit { .. } => "over_table_limit",
            Self::NoColorSelected => "no_color_selected",
            Self::SpinInProgress => "spin_in_progress",
            Self::UnknownColor(_) => "unknown_color",
        }
    }
}

/// Errors raised while building the wheel at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("segment count {count} must be at least 1 and evenly divide 360")]
    InvalidSegmentCount { count: usize },
    #[error("segment map lists {actual} colors for {expected} segments")]
    SegmentMapLengthMismatch { expected: usize, actual: usize },
    #[error("alternating segment layout needs at least one color")]
    EmptyPalette,
    #[error("default color `{0}` does not appear on the wheel")]
    UnknownDefaultColor(String),
    #[error("invalid settings: {0}")]
    Settings(#[from] validator::ValidationErrors),
}

impl ConfigError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSegmentCount { .. } => "invalid_segment_count",
            Self::SegmentMapLengthMismatch { .. } => "segment_map_length_mismatch",
            Self::EmptyPalette => "empty_palette",
            Self::UnknownDefaultColor(_) => "unknown_default_color",
            Self::Settings(_) => "invalid_settings",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("color name must not be empty")]
pub struct EmptyColorName;
