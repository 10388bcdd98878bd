use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::value::{
    DatePrecision, DateTimePrecision, PartialDate, PartialDateTime, PartialTime, TimePrecision,
};

/// Parse `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
pub(crate) fn parse_date(input: &str) -> Option<PartialDate> {
    let s = input.trim();
    let all_digits = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());

    let parts: Vec<&str> = s.split('-').collect();
    let (year, month, day, precision) = match parts.as_slice() {
        [y] if y.len() == 4 && all_digits(y) => (*y, "01", "01", DatePrecision::Year),
        [y, m] if y.len() == 4 && m.len() == 2 && all_digits(y) && all_digits(m) => {
            (*y, *m, "01", DatePrecision::Month)
        }
        [y, m, d]
            if y.len() == 4
                && m.len() == 2
                && d.len() == 2
                && all_digits(y)
                && all_digits(m)
                && all_digits(d) =>
        {
            (*y, *m, *d, DatePrecision::Day)
        }
        _ => return None,
    };

    let value = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;
    Some(PartialDate { value, precision })
}

/// Parse `HH`, `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff`
pub(crate) fn parse_time(input: &str) -> Option<PartialTime> {
    let (value, precision) = parse_clock(input.trim())?;
    let precision = match precision {
        DateTimePrecision::Hour => TimePrecision::Hour,
        DateTimePrecision::Minute => TimePrecision::Minute,
        DateTimePrecision::Second => TimePrecision::Second,
        _ => TimePrecision::Millisecond,
    };
    Some(PartialTime { value, precision })
}

/// Parse a dateTime; date-only input becomes a dateTime with date precision
///
/// Accepts the literal form with a trailing `T` (`2015T`) and an optional
/// `Z` or `+HH:MM` offset after the time part.
pub(crate) fn parse_datetime(input: &str) -> Option<PartialDateTime> {
    let raw = input.trim();

    let Some((date_part, rest)) = raw.split_once('T') else {
        return parse_date(raw).map(PartialDateTime::from);
    };

    let date = parse_date(date_part)?;
    if rest.is_empty() {
        return Some(PartialDateTime::from(date));
    }
    if date.precision != DatePrecision::Day {
        return None;
    }

    let (time_part, offset) = split_timezone(rest)?;
    let (time, precision) = parse_clock(time_part)?;

    Some(PartialDateTime {
        value: NaiveDateTime::new(date.value, time),
        precision,
        offset,
    })
}

/// Split a trailing `Z` / `+HH:MM` / `-HH:MM` from a time string
fn split_timezone(rest: &str) -> Option<(&str, Option<i32>)> {
    if let Some(stripped) = rest.strip_suffix('Z') {
        return Some((stripped, Some(0)));
    }

    if let Some(pos) = rest.rfind(['+', '-']) {
        let (time, tz) = rest.split_at(pos);
        if tz.len() != 6 || tz.as_bytes().get(3) != Some(&b':') {
            return None;
        }
        let sign = if tz.starts_with('-') { -1 } else { 1 };
        let hours: i32 = tz[1..3].parse().ok()?;
        let minutes: i32 = tz[4..6].parse().ok()?;
        if hours > 14 || minutes > 59 {
            return None;
        }
        return Some((time, Some(sign * (hours * 3600 + minutes * 60))));
    }

    Some((rest, None))
}

/// Clock time with the precision it was written at (`Hour` through `Millisecond`)
fn parse_clock(time_part: &str) -> Option<(NaiveTime, DateTimePrecision)> {
    let (main, frac) = match time_part.split_once('.') {
        Some((main, frac)) => (main, Some(frac)),
        None => (time_part, None),
    };

    let two_digits = |s: &str| -> Option<u32> {
        if s.len() == 2 && s.chars().all(|c| c.is_ascii_digit()) {
            s.parse().ok()
        } else {
            None
        }
    };

    let parts: Vec<&str> = main.split(':').collect();
    let (hour, minute, second, precision) = match parts.as_slice() {
        [hh] => (two_digits(hh)?, 0, 0, DateTimePrecision::Hour),
        [hh, mm] => (two_digits(hh)?, two_digits(mm)?, 0, DateTimePrecision::Minute),
        [hh, mm, ss] => (
            two_digits(hh)?,
            two_digits(mm)?,
            two_digits(ss)?,
            if frac.is_some() {
                DateTimePrecision::Millisecond
            } else {
                DateTimePrecision::Second
            },
        ),
        _ => return None,
    };

    if frac.is_some() && precision != DateTimePrecision::Millisecond {
        return None;
    }

    let millis: u32 = match frac {
        Some(frac) if !frac.is_empty() && frac.chars().all(|c| c.is_ascii_digit()) => {
            let digits: String = frac.chars().take(3).collect();
            format!("{:0<3}", digits).parse().ok()?
        }
        Some(_) => return None,
        None => 0,
    };

    let time = NaiveTime::from_hms_milli_opt(hour, minute, second, millis)?;
    Some((time, precision))
}
