// Countdown evaluation — a pure function of the wall clock and the page context.

use std::fmt;

use crate::context::PageContext;

use super::format::format_time;

/// Contest boundary crossed by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

/// What a countdown displays at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// No fixed start and the contest can only be taken virtually.
    Practice,
    /// No fixed start yet.
    WaitForStart,
    StartsIn(i64),
    EndsIn(i64),
    Over,
    /// The start was reached but the page was rendered before it.
    Starting,
    /// The end was reached but the page was rendered before it.
    Ending,
}

impl Countdown {
    /// Boundary to reload on, if this is a transition.
    pub fn boundary(&self) -> Option<Boundary> {
        match self {
            Countdown::Starting => Some(Boundary::Start),
            Countdown::Ending => Some(Boundary::End),
            _ => None,
        }
    }

    pub fn is_transition(&self) -> bool {
        self.boundary().is_some()
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Countdown::Practice => f.write_str("Practice contest"),
            Countdown::WaitForStart => f.write_str("Wait for start"),
            Countdown::StartsIn(s) => write!(f, "Starts in: {}", format_time(*s)),
            Countdown::EndsIn(s) => write!(f, "Ends in: {}", format_time(*s)),
            Countdown::Over => f.write_str("Contest is over"),
            Countdown::Starting => f.write_str("Contest is starting - loading the problems..."),
            Countdown::Ending => f.write_str("Contest is ending"),
        }
    }
}

/// Whole seconds from `now` until `target`, clamped at zero.
pub fn seconds_until(target: f64, now: f64) -> i64 {
    (target - now).max(0.0).floor() as i64
}

/// Evaluate the countdown at wall-clock time `now` (Unix seconds).
///
/// With `watch_end` the end boundary is checked too, and wins over the start
/// boundary when both are pending.
pub fn evaluate(now: f64, ctx: &PageContext, watch_end: bool) -> Countdown {
    let Some(start) = ctx.contest_start_timestamp else {
        return if ctx.only_virtual {
            Countdown::Practice
        } else {
            Countdown::WaitForStart
        };
    };

    let until_start = seconds_until(start, now);
    let until_end = seconds_until(start + ctx.contest_duration, now);

    let mut state = if until_start > 0 {
        Countdown::StartsIn(until_start)
    } else if until_end > 0 {
        Countdown::EndsIn(until_end)
    } else {
        Countdown::Over
    };

    if until_start == 0 && !ctx.contest_started {
        state = Countdown::Starting;
    }
    if watch_end && until_end == 0 && !ctx.contest_ended {
        state = Countdown::Ending;
    }
    state
}
