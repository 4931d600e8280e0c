//! Timestamp normalization for chat message display.
//!
//! Chat backends are inconsistent about timezone annotation: some emit
//! RFC 3339 with a `Z` or `+HH:MM` suffix, others serialize a naive local
//! datetime (`2024-01-01T10:00:00.123456`). [`Normalizer`] turns either into a
//! display string:
//!
//! - **Absolute**: `"Jan 1, 05:00 AM"` in the viewer's timezone
//! - **Relative**: `"5 minutes ago"` against a supplied or ambient "now"
//!
//! Rendering never fails. Unparseable input is logged and replaced by the
//! configured fallback string.

use crate::config::TimestampConfig;
use crate::error::{Error, Result};
use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use serde::Deserialize;

/// Formats accepted for timestamps carrying an explicit offset (after a
/// trailing `Z` has been rewritten to `+00:00`).
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Formats accepted for naive timestamps.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// How a timestamp should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayPolicy {
    /// Calendar date and time of day, e.g. "Jan 1, 05:00 AM"
    #[default]
    Absolute,
    /// Elapsed time, e.g. "5 minutes ago"
    Relative,
}

/// How to interpret timestamps that carry no offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NaiveZone {
    /// The backend emits UTC without saying so
    #[default]
    Utc,
    /// The backend emits wall-clock time in the viewer's zone
    Local,
}

/// Clock style for absolute rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum HourCycle {
    #[default]
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "24h")]
    H24,
}

impl HourCycle {
    /// strftime pattern used for absolute rendering
    pub fn pattern(self) -> &'static str {
        match self {
            HourCycle::H12 => "%b %-d, %I:%M %p",
            HourCycle::H24 => "%b %-d, %H:%M",
        }
    }
}

/// The timezone the reader sees absolute times in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewerZone {
    /// The process's local timezone
    #[default]
    Local,
    /// A fixed UTC offset
    Fixed(FixedOffset),
}

impl ViewerZone {
    /// Offset in effect at the given instant.
    fn offset_at(self, instant: &DateTime<Utc>) -> FixedOffset {
        match self {
            ViewerZone::Local => chrono::Local
                .offset_from_utc_datetime(&instant.naive_utc())
                .fix(),
            ViewerZone::Fixed(offset) => offset,
        }
    }

    /// Interpret a wall-clock datetime in this zone.
    fn instant_from_local(self, raw: &str, naive: &NaiveDateTime) -> Result<DateTime<Utc>> {
        let offset = match self {
            ViewerZone::Fixed(offset) => offset,
            ViewerZone::Local => match chrono::Local.offset_from_local_datetime(naive) {
                LocalResult::Single(offset) => offset.fix(),
                LocalResult::Ambiguous(earliest, _) => earliest.fix(),
                LocalResult::None => {
                    return Err(Error::timestamp(
                        raw,
                        "wall-clock time does not exist in the local timezone",
                    ))
                }
            },
        };

        naive
            .checked_sub_signed(Duration::seconds(offset.local_minus_utc() as i64))
            .map(|utc| Utc.from_utc_datetime(&utc))
            .ok_or_else(|| Error::timestamp(raw, "offset moves timestamp out of range"))
    }
}

/// Where the zone of a [`NormalizedInstant`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneSource {
    /// The text carried `Z` or `±HH:MM`
    Explicit,
    /// Naive text read as UTC
    AssumedUtc,
    /// Naive text read in the viewer's zone
    AssumedLocal,
}

/// An absolute instant parsed from a raw timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedInstant {
    pub instant: DateTime<Utc>,
    pub source: ZoneSource,
}

/// Raw text split by whether it carried an offset.
enum Parsed {
    Explicit(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

/// Returns true if `raw` ends with `Z` or a `+HH:MM` / `-HH:MM` offset.
pub fn has_explicit_offset(raw: &str) -> bool {
    let raw = raw.trim_end();
    if raw.ends_with(|c: char| c == 'Z' || c == 'z') {
        return true;
    }

    let bytes = raw.as_bytes();
    if bytes.len() < 6 {
        return false;
    }
    let tail = &bytes[bytes.len() - 6..];
    matches!(tail[0], b'+' | b'-')
        && tail[1].is_ascii_digit()
        && tail[2].is_ascii_digit()
        && tail[3] == b':'
        && tail[4].is_ascii_digit()
        && tail[5].is_ascii_digit()
}

/// Parse a `+HH:MM`, `-HHMM`, `+HH`, `Z` or `UTC` offset.
pub fn parse_utc_offset(text: &str) -> Result<FixedOffset> {
    let text = text.trim();
    let invalid = || Error::Config(format!("invalid UTC offset {:?}", text));

    if text.eq_ignore_ascii_case("z") || text.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }

    let (sign, rest) = match text.as_bytes().first() {
        Some(b'+') => (1, &text[1..]),
        Some(b'-') => (-1, &text[1..]),
        _ => return Err(invalid()),
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some(parts) => parts,
        None if rest.len() == 4 && rest.is_ascii() => rest.split_at(2),
        None => (rest, "00"),
    };

    let two_digits = |s: &str| -> Option<i32> {
        if s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse().ok()
        } else {
            None
        }
    };
    let hours = two_digits(hours).ok_or_else(invalid)?;
    let minutes = two_digits(minutes).ok_or_else(invalid)?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

fn parse_raw(raw: &str) -> Result<Parsed> {
    if has_explicit_offset(raw) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Parsed::Explicit(dt));
        }

        let rewritten = match raw.strip_suffix(|c: char| c == 'Z' || c == 'z') {
            Some(stem) => format!("{}+00:00", stem),
            None => raw.to_string(),
        };
        return OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(&rewritten, fmt).ok())
            .map(Parsed::Explicit)
            .ok_or_else(|| Error::timestamp(raw, "unrecognized timestamp with offset"));
    }

    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Ok(Parsed::Naive(naive));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(Parsed::Naive)
        .ok_or_else(|| Error::timestamp(raw, "unrecognized timestamp"))
}

/// Format the elapsed time between `instant` and `now` (e.g. "5 minutes ago").
///
/// Instants in the future, and anything under a minute old, read "just now".
pub fn format_relative(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(instant);
    let days = elapsed.num_days();

    if elapsed.num_seconds() < 60 {
        "just now".to_string()
    } else if elapsed.num_minutes() < 60 {
        ago(elapsed.num_minutes(), "minute")
    } else if elapsed.num_hours() < 24 {
        ago(elapsed.num_hours(), "hour")
    } else if days < 30 {
        ago(days, "day")
    } else if days < 365 {
        ago((days / 30).min(11), "month")
    } else {
        ago(days / 365, "year")
    }
}

fn ago(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

/// Renders raw chat timestamps into display strings.
///
/// A normalizer is immutable once built and can be shared between threads.
#[derive(Debug, Clone)]
pub struct Normalizer {
    policy: DisplayPolicy,
    naive_zone: NaiveZone,
    hour_cycle: HourCycle,
    viewer: ViewerZone,
    fallback: String,
    correct_future_skew: bool,
    future_tolerance: Duration,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            policy: DisplayPolicy::default(),
            naive_zone: NaiveZone::default(),
            hour_cycle: HourCycle::default(),
            viewer: ViewerZone::default(),
            fallback: String::new(),
            correct_future_skew: false,
            future_tolerance: Duration::seconds(60),
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a normalizer from the `[timestamps]` config section.
    pub fn from_config(config: &TimestampConfig) -> Result<Self> {
        config.validate()?;

        let viewer = match config.utc_offset.as_deref() {
            Some(offset) => ViewerZone::Fixed(parse_utc_offset(offset)?),
            None => ViewerZone::Local,
        };

        Ok(Self {
            policy: config.policy,
            naive_zone: config.naive_zone,
            hour_cycle: config.hour_cycle,
            viewer,
            fallback: config.fallback.clone(),
            correct_future_skew: config.correct_future_skew,
            future_tolerance: Duration::seconds(config.future_tolerance_secs as i64),
        })
    }

    pub fn with_policy(mut self, policy: DisplayPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_naive_zone(mut self, naive_zone: NaiveZone) -> Self {
        self.naive_zone = naive_zone;
        self
    }

    pub fn with_hour_cycle(mut self, hour_cycle: HourCycle) -> Self {
        self.hour_cycle = hour_cycle;
        self
    }

    pub fn with_viewer(mut self, viewer: ViewerZone) -> Self {
        self.viewer = viewer;
        self
    }

    /// String returned for missing or unparseable input ("" by default).
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Reinterpret naive timestamps that land more than `tolerance` in the
    /// future as viewer-local wall-clock time.
    pub fn with_future_skew_correction(mut self, tolerance: Duration) -> Self {
        self.correct_future_skew = true;
        self.future_tolerance = tolerance;
        self
    }

    pub fn policy(&self) -> DisplayPolicy {
        self.policy
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Parse `raw` into an instant without any clock-based correction.
    pub fn parse(&self, raw: &str) -> Result<NormalizedInstant> {
        let raw = raw.trim();
        let parsed = parse_raw(raw)?;
        self.resolve(raw, &parsed)
    }

    /// Parse `raw` into an instant, applying future-skew correction
    /// against `now` when enabled.
    pub fn normalize_at(&self, raw: &str, now: DateTime<Utc>) -> Result<NormalizedInstant> {
        let raw = raw.trim();
        let parsed = parse_raw(raw)?;
        let normalized = self.resolve(raw, &parsed)?;

        if !self.correct_future_skew || normalized.source != ZoneSource::AssumedUtc {
            return Ok(normalized);
        }
        if normalized.instant.signed_duration_since(now) <= self.future_tolerance {
            return Ok(normalized);
        }

        if let Parsed::Naive(naive) = &parsed {
            if let Ok(instant) = self.viewer.instant_from_local(raw, naive) {
                tracing::debug!(
                    raw = %raw,
                    assumed_utc = %normalized.instant,
                    corrected = %instant,
                    "Reinterpreted future timestamp as viewer-local time"
                );
                return Ok(NormalizedInstant {
                    instant,
                    source: ZoneSource::AssumedLocal,
                });
            }
        }

        Ok(normalized)
    }

    /// Render `raw` against the current wall clock.
    pub fn render(&self, raw: Option<&str>) -> String {
        self.render_at(raw, Utc::now())
    }

    /// Render `raw` as if the current time were `now`.
    pub fn render_at(&self, raw: Option<&str>, now: DateTime<Utc>) -> String {
        let original = match raw {
            Some(original) if !original.trim().is_empty() => original,
            _ => return self.fallback.clone(),
        };

        match self.try_render(original.trim(), now) {
            Ok(display) => display,
            Err(e) => {
                tracing::warn!(raw = ?original, error = %e, "Failed to render timestamp");
                self.fallback.clone()
            }
        }
    }

    fn try_render(&self, raw: &str, now: DateTime<Utc>) -> Result<String> {
        let normalized = self.normalize_at(raw, now)?;

        match self.policy {
            DisplayPolicy::Relative => Ok(format_relative(normalized.instant, now)),
            DisplayPolicy::Absolute => self.format_absolute(raw, &normalized.instant),
        }
    }

    fn format_absolute(&self, raw: &str, instant: &DateTime<Utc>) -> Result<String> {
        let offset = self.viewer.offset_at(instant);
        let local = instant
            .naive_utc()
            .checked_add_signed(Duration::seconds(offset.local_minus_utc() as i64))
            .ok_or_else(|| Error::timestamp(raw, "viewer offset moves timestamp out of range"))?;

        Ok(local.format(self.hour_cycle.pattern()).to_string())
    }

    fn resolve(&self, raw: &str, parsed: &Parsed) -> Result<NormalizedInstant> {
        match parsed {
            Parsed::Explicit(dt) => Ok(NormalizedInstant {
                instant: dt.with_timezone(&Utc),
                source: ZoneSource::Explicit,
            }),
            Parsed::Naive(naive) => match self.naive_zone {
                NaiveZone::Utc => Ok(NormalizedInstant {
                    instant: Utc.from_utc_datetime(naive),
                    source: ZoneSource::AssumedUtc,
                }),
                NaiveZone::Local => Ok(NormalizedInstant {
                    instant: self.viewer.instant_from_local(raw, naive)?,
                    source: ZoneSource::AssumedLocal,
                }),
            },
        }
    }
}

/// Render a chat timestamp with default settings: absolute, naive read as
/// UTC, 12-hour clock, local viewer zone, empty fallback.
pub fn time_ago(raw: Option<&str>) -> String {
    Normalizer::default().render(raw)
}
