// Timestamp rendering for date elements. Rendered once, not live-updated.

use std::fmt::Display;

use chrono::{Local, TimeZone};

use crate::config::{LOCAL_DATE_CLASS, SIMPLE_LOCAL_DATE_CLASS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// Date and time followed by the zone name.
    WithZone,
    Simple,
}

impl DateStyle {
    /// Style selected by a date element's marker class.
    pub fn for_class(class: &str) -> Option<Self> {
        match class {
            LOCAL_DATE_CLASS => Some(DateStyle::WithZone),
            SIMPLE_LOCAL_DATE_CLASS => Some(DateStyle::Simple),
            _ => None,
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            DateStyle::WithZone => "%Y-%m-%d %H:%M:%S %Z",
            DateStyle::Simple => "%Y-%m-%d %H:%M:%S",
        }
    }
}

/// Parse the timestamp data attribute (Unix seconds).
pub fn parse_timestamp_attr(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Render Unix seconds `timestamp` in `tz`. `None` if out of range.
pub fn render_timestamp<Tz>(timestamp: i64, tz: &Tz, style: DateStyle) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let at = tz.timestamp_opt(timestamp, 0).single()?;
    Some(at.format(style.pattern()).to_string())
}

/// Render in the host's local time zone.
pub fn render_local(timestamp: i64, style: DateStyle) -> Option<String> {
    render_timestamp(timestamp, &Local, style)
}
