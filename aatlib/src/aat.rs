//! Average access time for one and two cache levels
//!
//! All times are in nanoseconds, miss rates are fractions in `[0, 1]`

/// Penalty of going to main memory, used unless the configuration overrides it
pub const MISS_PENALTY_NS: f64 = 100.0;

/// `AAT = L1 hit time + L1 miss rate * miss penalty`
///
/// # Examples
///
/// ```
/// use aatlib::aat::single_level;
/// let aat = single_level(1.2, 0.05, 100.0);
/// assert!((aat - 6.2).abs() < 1e-9);
/// ```
pub fn single_level(l1_hit_time: f64, l1_miss_rate: f64, miss_penalty: f64) -> f64 {
    l1_hit_time + l1_miss_rate * miss_penalty
}

/// `AAT = L1 hit time + L1 miss rate * (L2 hit time + L2 miss rate * miss penalty)`
///
/// A perfect L2 (miss rate 0) leaves only its hit time as the L1 miss penalty
pub fn two_level(l1_hit_time: f64, l1_miss_rate: f64, l2_hit_time: f64, l2_miss_rate: f64, miss_penalty: f64) -> f64 {
    single_level(l1_hit_time, l1_miss_rate, single_level(l2_hit_time, l2_miss_rate, miss_penalty))
}
