//! Timezone resolution for offset-less date/time values.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::InvalidTimezone;

/// A configured timezone: a fixed offset or an IANA zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Fixed(FixedOffset),
    Named(Tz),
}

impl Zone {
    pub fn utc() -> Self {
        Self::Fixed(Utc.fix())
    }

    /// Reads `UTC`, `Z`, `GMT`, `±hh[:mm]`, `UTC±hh[:mm]` or an IANA zone name.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTimezone`] when the text matches none of these forms.
    pub fn parse(spec: &str) -> Result<Self, InvalidTimezone> {
        let trimmed = spec.trim();
        let invalid = || InvalidTimezone {
            value: spec.to_string(),
        };
        if ["UTC", "GMT", "Z"]
            .iter()
            .any(|name| trimmed.eq_ignore_ascii_case(name))
        {
            return Ok(Self::utc());
        }
        let offset_text = ["UTC", "GMT"]
            .iter()
            .find_map(|prefix| {
                trimmed
                    .get(..prefix.len())
                    .filter(|head| head.eq_ignore_ascii_case(prefix))
                    .map(|_| &trimmed[prefix.len()..])
            })
            .unwrap_or(trimmed);
        if offset_text.starts_with(['+', '-']) {
            return parse_offset(offset_text).map(Self::Fixed).ok_or_else(invalid);
        }
        trimmed.parse::<Tz>().map(Self::Named).map_err(|_| invalid())
    }

    /// Interprets a wall-clock time in this zone. Ambiguous local times
    /// resolve to the earlier instant; nonexistent ones yield `None`.
    pub fn localize(&self, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Fixed(offset) => offset.from_local_datetime(naive).single(),
            Self::Named(tz) => tz
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
        }
    }

    /// The same instant expressed in this zone.
    pub fn convert(&self, instant: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        match self {
            Self::Fixed(offset) => instant.with_timezone(offset),
            Self::Named(tz) => instant.with_timezone(tz).fixed_offset(),
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(offset) => write!(f, "UTC{offset}"),
            Self::Named(tz) => f.write_str(tz.name()),
        }
    }
}

/// `±hh`, `±hhmm` or `±hh:mm`.
fn parse_offset(text: &str) -> Option<FixedOffset> {
    let (sign, digits) = match text.split_at_checked(1)? {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    let (hours, minutes) = match (digits.len(), digits.split_once(':')) {
        (_, Some((hours, minutes))) => (hours, minutes),
        (2, None) => (digits, "00"),
        (4, None) => digits.split_at(2),
        _ => return None,
    };
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_aliases() {
        for spec in ["UTC", "utc", "Z", "GMT", " UTC "] {
            assert_eq!(Zone::parse(spec).unwrap(), Zone::utc(), "{spec}");
        }
    }

    #[test]
    fn fixed_offsets() {
        let plus_two = Zone::Fixed(FixedOffset::east_opt(7200).unwrap());
        assert_eq!(Zone::parse("+02:00").unwrap(), plus_two);
        assert_eq!(Zone::parse("+0200").unwrap(), plus_two);
        assert_eq!(Zone::parse("UTC+02").unwrap(), plus_two);
        assert_eq!(
            Zone::parse("GMT-05:30").unwrap(),
            Zone::Fixed(FixedOffset::west_opt(5 * 3600 + 1800).unwrap())
        );
    }

    #[test]
    fn iana_names() {
        assert_eq!(
            Zone::parse("Europe/Zurich").unwrap(),
            Zone::Named(chrono_tz::Europe::Zurich)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(Zone::parse("Mars/Olympus").is_err());
        assert!(Zone::parse("+25:00").is_err());
        assert!(Zone::parse("UTC+2:0").is_err());
    }
}
