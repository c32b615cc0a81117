// Contest countdown — display evaluation, formatting and the polling driver.

pub mod engine;
pub mod format;
pub mod state;
pub mod traits;

pub use engine::{reload_delay, CountdownEngine, CountdownOutcome, Phase};
pub use format::format_time;
pub use state::{evaluate, Boundary, Countdown};
pub use traits::{Clock, CountdownTarget, PageReloader, SystemClock};
