//! chatstamp - render chat message timestamps
//!
//! Formats raw timestamps given as arguments, or chat messages read as JSON
//! lines from stdin, the way a chat view would display them.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chatstamp_core::{
    ChatMessage, Config, DisplayPolicy, HourCycle, NaiveZone, Normalizer, TimestampConfig,
};
use chrono::{DateTime, Utc};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chatstamp")]
#[command(about = "Render chat message timestamps for display")]
#[command(version)]
struct Args {
    /// Timestamps to render, one output line each
    timestamps: Vec<String>,

    /// Read chat messages as JSON lines from stdin instead
    #[arg(long, conflicts_with = "timestamps")]
    messages: bool,

    /// Show elapsed time ("5 minutes ago") instead of date and time
    #[arg(long)]
    relative: bool,

    /// Read timestamps without an offset as viewer-local time instead of UTC
    #[arg(long)]
    naive_local: bool,

    /// Use a 24-hour clock
    #[arg(long = "24h")]
    hour24: bool,

    /// Fixed viewer offset, e.g. -05:00 (default: local timezone)
    #[arg(long, allow_hyphen_values = true)]
    utc_offset: Option<String>,

    /// Text shown for missing or unreadable timestamps
    #[arg(long)]
    fallback: Option<String>,

    /// Pretend the current time is this RFC 3339 instant
    #[arg(long)]
    now: Option<String>,

    /// Reinterpret naive timestamps that land in the future as local time
    #[arg(long)]
    fix_future_skew: bool,
}

impl Args {
    /// Apply command-line overrides on top of the config file.
    fn apply(&self, mut config: TimestampConfig) -> TimestampConfig {
        if self.relative {
            config.policy = DisplayPolicy::Relative;
        }
        if self.naive_local {
            config.naive_zone = NaiveZone::Local;
        }
        if self.hour24 {
            config.hour_cycle = HourCycle::H24;
        }
        if let Some(offset) = &self.utc_offset {
            config.utc_offset = Some(offset.clone());
        }
        if let Some(fallback) = &self.fallback {
            config.fallback = fallback.clone();
        }
        if self.fix_future_skew {
            config.correct_future_skew = true;
        }
        config
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = chatstamp_core::logging::init(&config.logging).ok();

    let timestamps = args.apply(config.timestamps);
    let normalizer =
        Normalizer::from_config(&timestamps).context("invalid timestamp configuration")?;

    let now = match &args.now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid --now value {:?}", raw))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    tracing::debug!(policy = ?normalizer.policy(), %now, "Rendering timestamps");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.messages {
        render_messages(&normalizer, now, io::stdin().lock(), &mut out)?;
    } else {
        for raw in &args.timestamps {
            writeln!(out, "{}", normalizer.render_at(Some(raw), now))?;
        }
    }

    Ok(())
}

/// Render each JSON-lines chat message; unreadable lines are logged and skipped.
fn render_messages(
    normalizer: &Normalizer,
    now: DateTime<Utc>,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let mut skipped = 0usize;

    for (index, line) in input.lines().enumerate() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        match ChatMessage::from_json(&line) {
            Ok(message) => writeln!(out, "{}", message.render_line(normalizer, now))?,
            Err(e) => {
                skipped += 1;
                tracing::warn!(line = index + 1, error = %e, "Skipping unreadable message");
            }
        }
    }

    if skipped > 0 {
        tracing::info!(skipped, "Finished with unreadable messages");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T10:05:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "chatstamp",
            "--relative",
            "--24h",
            "--utc-offset",
            "-05:00",
            "--fallback",
            "just now",
        ]);
        let config = args.apply(TimestampConfig::default());
        assert_eq!(config.policy, DisplayPolicy::Relative);
        assert_eq!(config.hour_cycle, HourCycle::H24);
        assert_eq!(config.utc_offset.as_deref(), Some("-05:00"));
        assert_eq!(config.fallback, "just now");
        assert_eq!(config.naive_zone, NaiveZone::Utc);
    }

    #[test]
    fn test_render_messages_skips_bad_lines() {
        let normalizer = Normalizer::new().with_policy(DisplayPolicy::Relative);
        let input = concat!(
            r#"{"sender":"alice","content":"hi","timeStamp":"2024-01-01T10:00:00"}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"sender":"bob","content":"hey","timeStamp":"2024-01-01T09:05:00Z"}"#,
            "\n",
        );

        let mut out = Vec::new();
        render_messages(&normalizer, now(), input.as_bytes(), &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[5 minutes ago] alice: hi\n[1 hour ago] bob: hey\n"
        );
    }
}
