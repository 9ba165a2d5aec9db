pub const DEFAULT_INITIAL_BALANCE: u64 = 100;
pub const DEFAULT_SEGMENT_COUNT: usize = 8;
pub const DEFAULT_EXTRA_ROTATIONS: u32 = 5;
pub const DEFAULT_SPIN_DURATION_MS: u64 = 4000;
pub const DEFAULT_STAKE: u64 = 10;
pub const DEFAULT_BANKRUPT_RESET_MS: u64 = 3000;

/// Largest balance a session may ever hold. Keeps every stake and net
/// payout representable as an `i64` delta.
pub const TABLE_LIMIT: u64 = i64::MAX as u64;
/// Half the table limit, so a fresh session can still win an all-in stake.
pub const MAX_INITIAL_BALANCE: u64 = TABLE_LIMIT / 2;

pub const MAX_EXTRA_ROTATIONS: u32 = 100;
pub const MAX_SPIN_DURATION_MS: u64 = 60_000;
