use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::TABLE_LIMIT;
use crate::error::RequestError;
use crate::random::RandomSource;
use crate::wheel_config::{Color, WheelConfig};

/// Stake exactly as the player typed or sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StakeInput {
    Whole(i64),
    Number(f64),
    Text(String),
    /// Booleans, arrays, objects: never a valid stake, but still a typed
    /// rejection rather than a malformed body.
    Other(serde_json::Value),
}

impl StakeInput {
    /// The stake as a positive whole number, if it is one. Fractions are
    /// rejected rather than floored.
    pub fn as_positive_whole(&self) -> Option<u64> {
        match self {
            Self::Whole(n) => u64::try_from(*n).ok().filter(|n| *n > 0),
            Self::Number(n) => positive_whole(*n),
            Self::Text(text) => {
                let text = text.trim();
                match text.parse::<u64>() {
                    Ok(n) => Some(n).filter(|n| *n > 0),
                    Err(_) => text.parse::<f64>().ok().and_then(positive_whole),
                }
            }
            Self::Other(_) => None,
        }
    }
}

fn positive_whole(n: f64) -> Option<u64> {
    if !n.is_finite() || n.fract() != 0.0 || n < 1.0 {
        return None;
    }
    Some(n as u64)
}

impl From<u64> for StakeInput {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Self::Whole(n),
            Err(_) => Self::Text(n.to_string()),
        }
    }
}

impl From<&str> for StakeInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// A stake that passed validation: positive, no larger than the balance it
/// was checked against, and small enough that a win stays within
/// [`TABLE_LIMIT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidatedStake(u64);

impl ValidatedStake {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Checks a spin request without touching any state.
///
/// Order of checks: in-flight guard, stake shape, balance, table limit, color.
pub fn validate_request(
    balance: u64,
    in_flight: bool,
    stake: &StakeInput,
    chosen_color: Option<&Color>,
) -> Result<ValidatedStake, RequestError> {
    if in_flight {
        return Err(RequestError::SpinInProgress);
    }
    let stake = stake.as_positive_whole().ok_or(RequestError::InvalidStake)?;
    if stake > balance {
        return Err(RequestError::InsufficientBalance { stake, balance });
    }
    if stake > TABLE_LIMIT.saturating_sub(balance) {
        return Err(RequestError::OverTableLimit { stake, limit: TABLE_LIMIT });
    }
    if chosen_color.is_none() {
        return Err(RequestError::NoColorSelected);
    }
    Ok(ValidatedStake(stake))
}

/// Result of a single spin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinOutcome {
    pub segment_index: usize,
    pub result_color: Color,
    pub stake: u64,
    /// Net balance change: `+stake` on a win, `-stake` on a loss.
    pub delta: i64,
}

impl SpinOutcome {
    pub fn is_win(&self) -> bool {
        self.delta > 0
    }

    /// Amount credited back once the spin settles. The stake was already
    /// debited when the spin started.
    pub fn credit(&self) -> u64 {
        if self.is_win() {
            self.stake * 2
        } else {
            0
        }
    }
}

/// Picks the segment for `draw` and scores it against `chosen_color`.
///
/// The segment index is the only source of truth; callers derive any wheel
/// angle from it with [`WheelConfig::landing_angle`]. Draws outside `[0, 1)`
/// (including exactly 1.0 and NaN) are clamped onto the wheel.
pub fn resolve_spin(
    config: &WheelConfig,
    chosen_color: &Color,
    stake: ValidatedStake,
    draw: f64,
) -> SpinOutcome {
    let count = config.segment_count();
    let segment_index = ((draw * count as f64).floor() as usize).min(count - 1);
    let result_color = config.segments().colors()[segment_index].clone();
    let stake = stake.get();
    // Validation caps stakes at TABLE_LIMIT, which is i64::MAX.
    let magnitude = stake as i64;
    let delta = if &result_color == chosen_color { magnitude } else { -magnitude };

    log::debug!(
        "spin resolved: draw={:.4} segment={} color={} chosen={} delta={}",
        draw,
        segment_index,
        result_color,
        chosen_color,
        delta
    );

    SpinOutcome {
        segment_index,
        result_color,
        stake,
        delta,
    }
}

/// Per-player game state.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Session {
    pub balance: u64,
    pub is_spinning: bool,
    pub chosen_color: Option<Color>,
}

/// A fresh session: initial balance, nothing in flight, default color.
pub fn reset_session(config: &WheelConfig) -> Session {
    Session {
        balance: config.initial_balance(),
        is_spinning: false,
        chosen_color: config.default_color().cloned(),
    }
}

impl Session {
    pub fn new(config: &WheelConfig) -> Self {
        reset_session(config)
    }

    pub fn validate_request(&self, stake: &StakeInput) -> Result<ValidatedStake, RequestError> {
        validate_request(self.balance, self.is_spinning, stake, self.chosen_color.as_ref())
    }

    /// Changes the chosen color. Not allowed mid-spin.
    pub fn select_color(&mut self, config: &WheelConfig, color: Color) -> Result<(), RequestError> {
        if self.is_spinning {
            return Err(RequestError::SpinInProgress);
        }
        if !config.segments().contains(&color) {
            return Err(RequestError::UnknownColor(color.to_string()));
        }
        self.chosen_color = Some(color);
        Ok(())
    }

    /// Validates, then debits the stake and marks the spin in flight.
    /// On error the session is left exactly as it was.
    pub fn begin_spin(&mut self, stake: &StakeInput) -> Result<ValidatedStake, RequestError> {
        let stake = self.validate_request(stake)?;
        self.balance -= stake.get();
        self.is_spinning = true;
        Ok(stake)
    }

    /// Applies a resolved outcome and clears the in-flight flag.
    pub fn settle(&mut self, outcome: &SpinOutcome) {
        self.balance += outcome.credit();
        self.is_spinning = false;
    }

    pub fn is_bankrupt(&self) -> bool {
        self.balance == 0 && !self.is_spinning
    }
}

/// Runs a whole spin synchronously: begin, draw, resolve, settle.
/// For callers with no animation delay between resolution and settlement.
pub fn spin_and_settle<R: RandomSource + ?Sized>(
    config: &WheelConfig,
    session: &mut Session,
    stake: &StakeInput,
    rng: &mut R,
) -> Result<SpinOutcome, RequestError> {
    let stake = session.begin_spin(stake)?;
    let chosen = session.chosen_color.clone().ok_or(RequestError::NoColorSelected)?;
    let outcome = resolve_spin(config, &chosen, stake, rng.unit_draw());
    session.settle(&outcome);
    Ok(outcome)
}

// === API Types ===

/// A blank or missing color name reads as "no color" so the request fails
/// with a typed error instead of a malformed body.
fn blank_color_as_none<'de, D>(deserializer: D) -> Result<Option<Color>, D::Error>
where
    D: Deserializer<'de>,
{
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(name.and_then(|name| Color::new(&name).ok()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectColorRequest {
    #[serde(default, deserialize_with = "blank_color_as_none")]
    pub color: Option<Color>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WheelSpinRequest {
    pub stake: Option<StakeInput>,
    #[serde(default, deserialize_with = "blank_color_as_none")]
    pub color: Option<Color>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WheelSpinResponse {
    pub outcome: SpinOutcome,
    pub is_win: bool,
    /// Balance right after the stake was debited; the credit lands on settlement.
    pub balance: u64,
    pub target_rotation: f64,
    pub spin_duration_ms: u64,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub session: Session,
    pub rotation: f64,
    pub last_outcome: Option<SpinOutcome>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WheelLayout {
    pub segments: Vec<Color>,
    pub palette: Vec<Color>,
    pub segment_angle: f64,
    pub extra_rotations: u32,
    pub spin_duration_ms: u64,
    pub default_stake: u64,
    pub initial_balance: u64,
}
