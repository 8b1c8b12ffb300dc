//! Millisecond/tick arithmetic shared by every blocking primitive.

use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

/// Emulated scheduler tick rate in Hz.
pub const TICK_HZ: u32 = 100;

static BOOT: Lazy<Instant> = Lazy::new(Instant::now);

/// Converts milliseconds to ticks, rounding up so a nonzero wait never
/// collapses to zero ticks.
pub fn ticks_from_millis(ms: u32) -> u32 {
    if ms == 0 {
        return 0;
    }
    let ticks = (u64::from(ms) * u64::from(TICK_HZ)).div_ceil(1000);
    u32::try_from(ticks).unwrap_or(u32::MAX)
}

/// Tick count back to a wall-clock duration at `TICK_HZ` granularity.
pub fn duration_from_ticks(ticks: u32) -> Duration {
    Duration::from_micros(u64::from(ticks) * (1_000_000 / u64::from(TICK_HZ)))
}

/// Monotonic time since the tick source was first touched.
pub fn now() -> Duration {
    BOOT.elapsed()
}

/// Milliseconds since the tick source was first touched.
pub fn uptime_ms() -> u64 {
    now().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonzero_millis_never_give_zero_ticks() {
        for ms in 1..2000 {
            assert!(ticks_from_millis(ms) >= 1, "ms={ms}");
        }
    }

    #[test]
    fn rounds_up_to_the_next_tick() {
        assert_eq!(ticks_from_millis(0), 0);
        assert_eq!(ticks_from_millis(1), 1);
        assert_eq!(ticks_from_millis(10), 1);
        assert_eq!(ticks_from_millis(11), 2);
        assert_eq!(ticks_from_millis(1000), TICK_HZ);
        assert_eq!(ticks_from_millis(3_600_000), 360_000);
    }

    #[test]
    fn conversion_is_monotonic() {
        let mut last = 0;
        for ms in 0..5000 {
            let ticks = ticks_from_millis(ms);
            assert!(ticks >= last, "ms={ms}");
            last = ticks;
        }
        // Large inputs stay well-defined.
        let _ = ticks_from_millis(u32::MAX);
    }

    #[test]
    fn tick_durations_round_trip() {
        assert_eq!(duration_from_ticks(0), Duration::ZERO);
        assert_eq!(duration_from_ticks(1), Duration::from_millis(10));
        assert_eq!(duration_from_ticks(TICK_HZ), Duration::from_secs(1));
    }

    #[test]
    fn uptime_is_monotonic() {
        let a = uptime_ms();
        std::thread::sleep(Duration::from_millis(20));
        let b = uptime_ms();
        assert!(b >= a + 20);
    }
}
