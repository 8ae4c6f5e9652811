//! Calendar dates and timestamp parsing.
//!
//! Dates are stored as calendar fields (`month` is zero-based) rather than as
//! instants, so a date column never shifts when read in another time zone.
//! Civil (zone-less) strings are interpreted in the caller's zone.

use jiff::civil;
use jiff::tz::TimeZone;
use jiff::Timestamp;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Civil formats accepted in addition to RFC 3339 / ISO 8601
const DATETIME_FORMATS: [&str; 3] = ["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M", "%Y/%m/%d %H:%M:%S"];
const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y/%m/%d"];

/// A calendar date with a zero-based month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl CalendarDate {
    pub fn new(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    pub fn from_civil(date: civil::Date) -> Self {
        Self {
            year: i32::from(date.year()),
            month: (date.month() - 1) as u8,
            day: date.day() as u8,
        }
    }

    /// `None` when the fields do not name a real day
    pub fn to_civil(&self) -> Option<civil::Date> {
        let year = i16::try_from(self.year).ok()?;
        civil::Date::new(year, self.month as i8 + 1, self.day as i8).ok()
    }

    /// Calendar fields of an epoch-millisecond instant in `tz`
    pub fn from_epoch_millis(millis: i64, tz: &TimeZone) -> Option<Self> {
        let ts = Timestamp::from_millisecond(millis).ok()?;
        Some(Self::from_civil(ts.to_zoned(tz.clone()).date()))
    }

    pub fn from_days_since_epoch(days: i32) -> Option<Self> {
        Self::from_epoch_millis(i64::from(days) * MILLIS_PER_DAY, &TimeZone::UTC)
    }

    /// Days since 1970-01-01, the Arrow `Date32` representation
    pub fn days_since_epoch(&self) -> Option<i32> {
        let zoned = self.to_civil()?.to_zoned(TimeZone::UTC).ok()?;
        i32::try_from(zoned.timestamp().as_second().div_euclid(86_400)).ok()
    }

    /// Epoch milliseconds of midnight on this date in `tz`
    pub fn local_midnight_millis(&self, tz: &TimeZone) -> Option<i64> {
        let zoned = self.to_civil()?.to_zoned(tz.clone()).ok()?;
        Some(zoned.timestamp().as_millisecond())
    }
}

impl std::fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month + 1, self.day)
    }
}

/// Whether an instant falls exactly on local midnight
pub fn is_local_midnight(millis: i64, tz: &TimeZone) -> bool {
    match Timestamp::from_millisecond(millis) {
        Ok(ts) => ts.to_zoned(tz.clone()).time() == civil::Time::midnight(),
        Err(_) => false,
    }
}

/// Parse a timestamp string into epoch milliseconds.
///
/// Accepts RFC 3339 instants, ISO civil datetimes and dates, and a handful of
/// slash-separated civil forms. Returns `None` when nothing matches.
pub fn parse_timestamp(input: &str, tz: &TimeZone) -> Option<i64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(ts) = input.parse::<Timestamp>() {
        return Some(ts.as_millisecond());
    }

    if let Ok(dt) = input.parse::<civil::DateTime>() {
        return civil_to_millis(dt, tz);
    }

    if let Ok(date) = input.parse::<civil::Date>() {
        return civil_to_millis(date.to_datetime(civil::Time::midnight()), tz);
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = civil::DateTime::strptime(format, input) {
            return civil_to_millis(dt, tz);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = civil::Date::strptime(format, input) {
            return civil_to_millis(date.to_datetime(civil::Time::midnight()), tz);
        }
    }

    None
}

fn civil_to_millis(dt: civil::DateTime, tz: &TimeZone) -> Option<i64> {
    dt.to_zoned(tz.clone())
        .ok()
        .map(|zoned| zoned.timestamp().as_millisecond())
}

/// Render epoch milliseconds as `YYYY-MM-DD HH:MM:SS.fff` in `tz`
pub fn format_datetime(millis: i64, tz: &TimeZone) -> Option<String> {
    let ts = Timestamp::from_millisecond(millis).ok()?;
    let base = ts.to_zoned(tz.clone()).strftime("%Y-%m-%d %H:%M:%S").to_string();
    Some(format!("{}.{:03}", base, millis.rem_euclid(1000)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339() {
        let millis = parse_timestamp("2020-01-02T03:04:05.678Z", &TimeZone::UTC).unwrap();
        assert_eq!(millis, 1_577_934_245_678);
    }

    #[test]
    fn test_parse_civil_forms() {
        let tz = TimeZone::UTC;
        assert_eq!(parse_timestamp("1970-01-02", &tz), Some(MILLIS_PER_DAY));
        assert_eq!(
            parse_timestamp("1970-01-01 00:00:01", &tz),
            Some(1_000)
        );
        assert_eq!(parse_timestamp("01/02/1970", &tz), Some(MILLIS_PER_DAY));
    }

    #[test]
    fn test_parse_rejects_plain_text() {
        let tz = TimeZone::UTC;
        assert_eq!(parse_timestamp("hello", &tz), None);
        assert_eq!(parse_timestamp("12", &tz), None);
        assert_eq!(parse_timestamp("", &tz), None);
        assert_eq!(parse_timestamp("true", &tz), None);
    }

    #[test]
    fn test_calendar_date_conversions() {
        let date = CalendarDate::new(2020, 0, 31);
        assert_eq!(date.to_string(), "2020-01-31");
        let days = date.days_since_epoch().unwrap();
        assert_eq!(CalendarDate::from_days_since_epoch(days), Some(date));
        assert_eq!(
            date.local_midnight_millis(&TimeZone::UTC),
            Some(i64::from(days) * MILLIS_PER_DAY)
        );
        assert!(CalendarDate::new(2020, 1, 30).to_civil().is_none());
    }

    #[test]
    fn test_local_midnight() {
        let tz = TimeZone::UTC;
        assert!(is_local_midnight(0, &tz));
        assert!(is_local_midnight(MILLIS_PER_DAY * 10, &tz));
        assert!(!is_local_midnight(1, &tz));
    }
}
