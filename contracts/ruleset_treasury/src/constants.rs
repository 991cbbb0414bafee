//! Protocol-wide fixed-point bounds and denominators.

/// Denominator for `reserved_rate` (10_000 = 100%).
pub const MAX_RESERVED_RATE: u32 = 10_000;

/// Denominator for `redemption_rate` (10_000 = 100%).
pub const MAX_REDEMPTION_RATE: u32 = 10_000;

/// Denominator for `decay_rate` (1_000_000_000 = 100% per cycle).
pub const MAX_DECAY_RATE: u32 = 1_000_000_000;

/// Sum of all split percents in a group may not exceed this.
pub const SPLITS_TOTAL_PERCENT: u32 = 1_000_000_000;

/// Weights are 18-decimal fixed point and must fit in 88 bits.
pub const MAX_WEIGHT: i128 = (1i128 << 88) - 1;

/// Fund-access limit currencies are stored in a 24-bit field.
pub const MAX_LIMIT_CURRENCY: u32 = (1u32 << 24) - 1;

/// Ruleset durations are bounded to a 32-bit number of seconds.
pub const MAX_DURATION: u64 = u32::MAX as u64;

/// Largest decimals an accounting context may declare.
pub const MAX_TOKEN_DECIMALS: u32 = 18;

/// Decimals of project tokens and of ruleset weights.
pub const WEIGHT_DECIMALS: u32 = 18;

/// `10^18`, one whole unit of an 18-decimal value.
pub const WAD: i128 = 1_000_000_000_000_000_000;

/// Split domain used when a ruleset has no splits of its own.
pub const DEFAULT_SPLIT_DOMAIN: u64 = 0;
