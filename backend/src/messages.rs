use shared::RequestError;

use crate::games::wheel_table::TableStatus;

pub const WELCOME_MESSAGE: &str = "Place your stake and choose a color!";
pub const SPINNING_MESSAGE: &str = "Spinning...";
pub const BANKRUPT_MESSAGE: &str = "You've run out of diamonds! Resetting...";
pub const RESET_MESSAGE: &str = "Game reset! Place your stake.";

pub fn status_message(status: &TableStatus) -> String {
    match status {
        TableStatus::Idle => WELCOME_MESSAGE.to_string(),
        TableStatus::Selected(color) => format!("You selected: {}", color.as_str().to_uppercase()),
        TableStatus::Spinning => SPINNING_MESSAGE.to_string(),
        TableStatus::Settled(outcome) => {
            let color = outcome.result_color.as_str().to_uppercase();
            if outcome.is_win() {
                format!("✅ {} wins! You gain {} diamonds.", color, outcome.stake)
            } else {
                format!("❌ {} wins! You lose {} diamonds.", color, outcome.stake)
            }
        }
        TableStatus::Bankrupt => BANKRUPT_MESSAGE.to_string(),
        TableStatus::Reset => RESET_MESSAGE.to_string(),
    }
}

pub fn request_error_message(error: &RequestError) -> &'static str {
    match error {
        RequestError::InvalidStake => "❗ Invalid stake amount.",
        RequestError::InsufficientBalance { .. } => "❗ Cannot bet more than your diamonds.",
        RequestError::OverTableLimit { .. } => "❗ That stake would take you past the table limit.",
        RequestError::NoColorSelected => "❗ Choose a color first.",
        RequestError::SpinInProgress => "❗ A spin is already in progress.",
        RequestError::UnknownColor(_) => "❗ That color is not on the wheel.",
    }
}
