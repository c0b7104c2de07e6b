//! Date/time coercion for `dateTime`, `dateTimeStamp`, `date` and `time`
//! columns.
//!
//! Values are parsed with an optional LDML pattern (`yyyy-MM-dd HH:mm`), the
//! `rfc2822` keyword, or, without a pattern, as ISO 8601 with an RFC 2822
//! fallback. Fields missing from a pattern default to the start of their
//! period, so `yyyy` reads `2000` as midnight on 2000-01-01.

use std::borrow::Cow;

use chrono::format::{self, Parsed, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use csvw_model::vocab::xsd;
use tracing::trace;

use crate::error::{DateTimeParseFailure, InvalidTimezone};
use crate::pattern::{OffsetMarker, ends_with_offset_marker, to_strftime};
use crate::zone::Zone;

/// Pattern keyword selecting the RFC 2822 grammar.
pub const RFC2822_KEYWORD: &str = "rfc2822";

/// Fallback year for patterns without a year field.
const EPOCH_YEAR: i64 = 1970;

// ============================================================================
// Target types
// ============================================================================

/// The XML Schema date/time family a column may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    DateTime,
    DateTimeStamp,
    Date,
    Time,
}

impl TemporalKind {
    /// Maps a datatype IRI to its temporal kind, if it has one.
    pub fn from_datatype(iri: &str) -> Option<Self> {
        match iri {
            iri if iri == xsd::DATE_TIME.as_str() => Some(Self::DateTime),
            iri if iri == xsd::DATE_TIME_STAMP.as_str() => Some(Self::DateTimeStamp),
            iri if iri == xsd::DATE.as_str() => Some(Self::Date),
            iri if iri == xsd::TIME.as_str() => Some(Self::Time),
            _ => None,
        }
    }
}

/// A successfully coerced instant, carrying the offset it is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeValue(DateTime<FixedOffset>);

impl DateTimeValue {
    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    /// Canonical lexical form for `kind`. Fractional seconds appear only
    /// when present; a zero offset is written `Z`.
    pub fn render(&self, kind: TemporalKind) -> String {
        match kind {
            TemporalKind::DateTime | TemporalKind::DateTimeStamp => {
                let offset = if self.0.offset().local_minus_utc() == 0 {
                    Cow::Borrowed("Z")
                } else {
                    Cow::Owned(self.0.format("%:z").to_string())
                };
                format!("{}{offset}", self.0.format("%Y-%m-%dT%H:%M:%S%.f"))
            }
            TemporalKind::Date => self.0.format("%Y-%m-%d").to_string(),
            TemporalKind::Time => self.0.format("%H:%M:%S%.f").to_string(),
        }
    }
}

impl From<DateTime<FixedOffset>> for DateTimeValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self(value)
    }
}

// ============================================================================
// Coercion
// ============================================================================

/// Parses date/time cells against a fixed timezone setting.
///
/// Without a configured zone, offset-less values are read as UTC and values
/// with an explicit offset keep it. With a zone, offset-less values are read
/// in that zone and every result is expressed in it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTimeCoercer {
    zone: Option<Zone>,
}

impl DateTimeCoercer {
    /// # Errors
    ///
    /// Returns [`InvalidTimezone`] when `timezone` cannot be resolved.
    pub fn new(timezone: Option<&str>) -> Result<Self, InvalidTimezone> {
        Ok(Self {
            zone: timezone.map(Zone::parse).transpose()?,
        })
    }

    pub fn with_zone(zone: Option<Zone>) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> Option<&Zone> {
        self.zone.as_ref()
    }

    /// Parses `raw`, optionally with an LDML `format`.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeParseFailure`] when no strategy reads the value.
    pub fn coerce(
        &self,
        raw: &str,
        format: Option<&str>,
    ) -> Result<DateTimeValue, DateTimeParseFailure> {
        let moment = match format {
            None => parse_default(raw),
            Some(keyword) if keyword.eq_ignore_ascii_case(RFC2822_KEYWORD) => {
                DateTime::parse_from_rfc2822(raw.trim()).ok().map(Moment::Aware)
            }
            Some(pattern) => parse_with_pattern(raw, pattern),
        };
        let resolved = match moment {
            Some(Moment::Aware(instant)) => Some(match &self.zone {
                Some(zone) => zone.convert(&instant),
                None => instant,
            }),
            Some(Moment::Naive(naive)) => self.zone.unwrap_or_else(Zone::utc).localize(&naive),
            None => None,
        };
        resolved
            .map(DateTimeValue)
            .ok_or_else(|| DateTimeParseFailure::new(raw, format))
    }
}

/// Parses `raw` with an optional format and timezone.
///
/// An unresolvable `timezone` is reported as a parse failure.
///
/// # Errors
///
/// Returns [`DateTimeParseFailure`] when the value cannot be read.
pub fn coerce(
    raw: &str,
    format: Option<&str>,
    timezone: Option<&str>,
) -> Result<DateTimeValue, DateTimeParseFailure> {
    DateTimeCoercer::new(timezone)
        .map_err(|_| DateTimeParseFailure::new(raw, format))?
        .coerce(raw, format)
}

enum Moment {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

fn parse_default(raw: &str) -> Option<Moment> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(Moment::Aware(instant));
    }
    if let Ok(instant) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%#z") {
        return Some(Moment::Aware(instant));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(Moment::Naive(naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Moment::Naive(date.and_time(NaiveTime::MIN)));
    }
    DateTime::parse_from_rfc2822(raw).ok().map(Moment::Aware)
}

fn parse_with_pattern(raw: &str, pattern: &str) -> Option<Moment> {
    if let Some(moment) = parse_items(raw, &to_strftime(pattern, OffsetMarker::Strict)) {
        return Some(moment);
    }
    if !ends_with_offset_marker(pattern) {
        return None;
    }
    let raw = match raw.strip_suffix('Z') {
        Some(head) => Cow::Owned(format!("{head}+00:00")),
        None => Cow::Borrowed(raw),
    };
    trace!(pattern, "retrying with a permissive offset marker");
    parse_items(&raw, &to_strftime(pattern, OffsetMarker::Permissive))
}

fn parse_items(raw: &str, strftime: &str) -> Option<Moment> {
    let mut parsed = Parsed::new();
    format::parse(&mut parsed, raw, StrftimeItems::new(strftime)).ok()?;
    fill_defaults(&mut parsed).ok()?;
    let naive = parsed
        .to_naive_date()
        .ok()?
        .and_time(parsed.to_naive_time().ok()?);
    match parsed.offset() {
        Some(seconds) => FixedOffset::east_opt(seconds)?
            .from_local_datetime(&naive)
            .single()
            .map(Moment::Aware),
        None => Some(Moment::Naive(naive)),
    }
}

fn fill_defaults(parsed: &mut Parsed) -> format::ParseResult<()> {
    if parsed.year().is_none() && parsed.year_div_100().is_none() && parsed.year_mod_100().is_none()
    {
        parsed.set_year(EPOCH_YEAR)?;
    }
    if parsed.month().is_none() && parsed.ordinal().is_none() {
        parsed.set_month(1)?;
    }
    if parsed.day().is_none() && parsed.ordinal().is_none() {
        parsed.set_day(1)?;
    }
    match (parsed.hour_div_12(), parsed.hour_mod_12()) {
        (None, None) => parsed.set_hour(0)?,
        (None, Some(_)) => parsed.set_ampm(false)?,
        _ => {}
    }
    if parsed.minute().is_none() {
        parsed.set_minute(0)?;
    }
    if parsed.second().is_none() {
        parsed.set_second(0)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_datatype_covers_the_family() {
        assert_eq!(
            TemporalKind::from_datatype("http://www.w3.org/2001/XMLSchema#date"),
            Some(TemporalKind::Date)
        );
        assert_eq!(
            TemporalKind::from_datatype("http://www.w3.org/2001/XMLSchema#string"),
            None
        );
    }

    #[test]
    fn fill_defaults_keeps_parsed_fields() {
        let mut parsed = Parsed::new();
        format::parse(&mut parsed, "2021-07", StrftimeItems::new("%Y-%m")).unwrap();
        fill_defaults(&mut parsed).unwrap();
        assert_eq!(parsed.month(), Some(7));
        assert_eq!(parsed.day(), Some(1));
    }

    #[test]
    fn twelve_hour_clock_without_meridiem_is_morning() {
        let value = DateTimeCoercer::default()
            .coerce("2021-01-02 09:15", Some("yyyy-MM-dd hh:mm"))
            .unwrap();
        assert_eq!(value.render(TemporalKind::DateTime), "2021-01-02T09:15:00Z");
    }
}
