use chrono::Utc;

/// Wall-clock source, in Unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Reads the system wall clock. Not monotonic: a clock change on the host
/// moves the countdown with it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        Utc::now().timestamp_millis() as f64 / 1000.0
    }
}

/// A UI element that shows countdown text.
pub trait CountdownTarget: Send + Sync {
    fn set_text(&self, text: &str);
}

/// Reloads the whole page, tearing down the current execution context.
pub trait PageReloader: Send + Sync {
    fn reload(&self);
}
