use std::time::Duration;

use thiserror::Error;

use crate::tick;

/// Bound for a blocking operation.
///
/// The zero-millisecond value keeps its historical meaning of "no
/// bound": [`Timeout::from_millis`] maps 0 to [`Timeout::Forever`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Block until the operation completes.
    Forever,
    /// Block for at most this many milliseconds, quantized to ticks.
    Millis(u32),
}

impl Timeout {
    pub fn from_millis(ms: u32) -> Self {
        if ms == 0 {
            Timeout::Forever
        } else {
            Timeout::Millis(ms)
        }
    }

    /// Tick budget for the wait; `None` means unbounded.
    pub fn ticks(self) -> Option<u32> {
        match self {
            Timeout::Forever => None,
            Timeout::Millis(ms) => Some(tick::ticks_from_millis(ms)),
        }
    }

    /// Tick-quantized wall-clock bound for the wait; `None` means
    /// unbounded.
    pub fn bound(self) -> Option<Duration> {
        self.ticks().map(tick::duration_from_ticks)
    }
}

impl From<u32> for Timeout {
    fn from(ms: u32) -> Self {
        Timeout::from_millis(ms)
    }
}

/// A bounded wait elapsed, or the awaited primitive went away.
///
/// Deletion while waiting is deliberately indistinguishable from an
/// ordinary timeout; both mean "nothing available, stop waiting".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out")]
pub struct TimedOut;
