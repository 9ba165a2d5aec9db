pub mod constants;
pub mod error;
pub mod random;
pub mod settings;
pub mod shared_wheel_game;
pub mod wheel_config;

pub use error::{ConfigError, RequestError};
pub use random::{RandomSource, WheelRng};
pub use settings::GameSettings;
pub use shared_wheel_game::{
    reset_session, resolve_spin, spin_and_settle, validate_request, Session, SpinOutcome,
    StakeInput, ValidatedStake,
};
pub use wheel_config::{Color, SegmentMap, SegmentSpec, WheelConfig};
