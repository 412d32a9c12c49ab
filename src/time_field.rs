use chrono::{NaiveTime, TimeDelta};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::errors::TrimError;
use crate::form::{Validity, Validator};

// @module: Time-of-day entry parsing and duration arithmetic

// @const: Accepted time entry, colons optional: "SS", "MMSS", "M:SS", "HMMSS", "HH:MM:SS", ...
static TIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(([0-9]?[0-9]:?)?[0-5][0-9]:?)?[0-5][0-9]$").unwrap()
});

/// Longest text the time pattern can accept
pub const MAX_TIME_LEN: usize = 8;

/// Template used to fill missing high-order groups
const CANONICAL_TEMPLATE: &str = "00:00:00";

/// A wall-clock position inside a video, second precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeOfDay {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl TimeOfDay {
    /// Build a time of day, rejecting fields outside 0-23 / 0-59 / 0-59
    pub fn new(hours: u32, minutes: u32, seconds: u32) -> Option<Self> {
        if hours > 23 || minutes > 59 || seconds > 59 {
            return None;
        }
        Some(Self { hours, minutes, seconds })
    }

    /// Parse a free-form entry; see [`canonical`] for the accepted shapes
    pub fn parse(text: &str) -> Result<Self, TrimError> {
        Self::parse_field("time", text)
    }

    /// Same as [`TimeOfDay::parse`] but names the offending field in errors
    pub fn parse_field(field: &str, text: &str) -> Result<Self, TrimError> {
        if TimeValidator.validate(text) == Validity::Invalid {
            return Err(TrimError::invalid_format(field, text));
        }

        let canonical = canonical(text).ok_or_else(|| TrimError::invalid_format(field, text))?;

        let number = |range: std::ops::Range<usize>| canonical[range].parse::<u32>().ok();
        match (number(0..2), number(3..5), number(6..8)) {
            (Some(h), Some(m), Some(s)) => {
                Self::new(h, m, s).ok_or_else(|| TrimError::invalid_format(field, text))
            }
            _ => Err(TrimError::invalid_format(field, text)),
        }
    }

    /// Offset from midnight in milliseconds
    pub fn as_millis(&self) -> u64 {
        (u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)) * 1000
    }

    fn to_naive_time(self) -> NaiveTime {
        // Fields are range checked on construction
        NaiveTime::from_hms_opt(self.hours, self.minutes, self.seconds).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

impl FromStr for TimeOfDay {
    type Err = TrimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Rebuild the canonical `HH:MM:SS` form of an entry.
///
/// The text is read from the right in groups of at most two digits, seconds
/// first, with a colon allowed between groups. Missing groups come from the
/// `00:00:00` template, so `"5:30"` becomes `"00:05:30"` and `"130"` becomes
/// `"00:01:30"`. Returns `None` when the text cannot be split that way.
pub fn canonical(text: &str) -> Option<String> {
    if text.is_empty() || text.len() > MAX_TIME_LEN {
        return None;
    }

    let mut groups: Vec<&str> = Vec::with_capacity(3);
    let mut rest = text;
    while !rest.is_empty() {
        if groups.len() == 3 {
            return None;
        }

        let bytes = rest.as_bytes();
        let mut cut = rest.len();
        while cut > 0 && rest.len() - cut < 2 && bytes[cut - 1].is_ascii_digit() {
            cut -= 1;
        }
        if cut == rest.len() {
            return None;
        }

        groups.push(&rest[cut..]);
        rest = &rest[..cut];
        rest = rest.strip_suffix(':').unwrap_or(rest);
    }

    let mut canonical = CANONICAL_TEMPLATE.to_string();
    for (slot, group) in groups.iter().enumerate() {
        // slot 0 is seconds at offset 6, slot 2 is hours at offset 0
        let end = MAX_TIME_LEN - slot * 3;
        canonical.replace_range(end - group.len()..end, group);
    }
    Some(canonical)
}

/// Three-state check of a time entry against the accepted pattern.
///
/// Text that fully matches is `Acceptable`. Text that could still become
/// acceptable by typing more characters is `Intermediate`, the empty string
/// included. Anything else is `Invalid`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeValidator;

impl Validator for TimeValidator {
    fn validate(&self, text: &str) -> Validity {
        if text.len() > MAX_TIME_LEN || !text.chars().all(|c| c.is_ascii_digit() || c == ':') {
            return Validity::Invalid;
        }
        if TIME_PATTERN.is_match(text) {
            return Validity::Acceptable;
        }
        if has_acceptable_completion(text) {
            Validity::Intermediate
        } else {
            Validity::Invalid
        }
    }

    // "5:30" only prefixes an accepted entry while "00:05:30" is one.
    // The seconds must be complete: "12:3" may still become "12:34".
    fn fixup(&self, text: &str) -> Option<String> {
        let seconds = text.rsplit(':').next().unwrap_or_default();
        if seconds.len() < 2 {
            return None;
        }
        canonical(text).filter(|fixed| TIME_PATTERN.is_match(fixed))
    }
}

// Every character class of the pattern admits '0' or ':', so trying
// completions over those two characters is enough to decide a prefix.
fn has_acceptable_completion(prefix: &str) -> bool {
    let room = MAX_TIME_LEN - prefix.len();
    let mut candidate = String::with_capacity(MAX_TIME_LEN);
    for extra in 1..=room {
        for mask in 0u32..(1 << extra) {
            candidate.clear();
            candidate.push_str(prefix);
            for bit in 0..extra {
                candidate.push(if mask & (1 << bit) == 0 { '0' } else { ':' });
            }
            if TIME_PATTERN.is_match(&candidate) {
                return true;
            }
        }
    }
    false
}

/// Selected window of the source video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub stop: TimeOfDay,
}

impl TimeRange {
    pub fn new(start: TimeOfDay, stop: TimeOfDay) -> Self {
        Self { start, stop }
    }

    /// Elapsed time from `start` to `stop` on the same day
    pub fn duration(&self) -> Result<TimeDelta, TrimError> {
        let delta = self.stop.to_naive_time().signed_duration_since(self.start.to_naive_time());
        if delta < TimeDelta::zero() {
            return Err(TrimError::NegativeDuration {
                start: self.start.to_string(),
                stop: self.stop.to_string(),
            });
        }
        if delta.is_zero() {
            return Err(TrimError::EmptyRange(self.start.to_string()));
        }
        Ok(delta)
    }

    /// Duration formatted for the media tool's `-t` flag
    pub fn duration_string(&self) -> Result<String, TrimError> {
        self.duration().map(format_duration)
    }

    /// Whether `[start_ms, end_ms]` lies strictly inside the range
    pub fn strictly_contains(&self, start_ms: u64, end_ms: u64) -> bool {
        start_ms > self.start.as_millis() && end_ms < self.stop.as_millis()
    }
}

/// Format a non-negative duration shorter than a day as `HH:MM:SS`
pub fn format_duration(duration: TimeDelta) -> String {
    let total = duration.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
