//! Bridges between the calendar types and their wire shapes.
//!
//! Varint-shaped temporals travel as their ISO ordinal; `month-day`,
//! `year-month`, `period`, and `duration` travel as small records of
//! integers; everything carrying a date or time of day travels as its
//! canonical ISO-8601 / RFC 3339 string.

use std::collections::BTreeMap;

use chrono::offset::Offset as _;
use chrono::{
    DateTime, FixedOffset, Month, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc, Weekday,
};
use chrono_tz::Tz;

use crate::error::DecodeError;
use crate::schema::Schema;
use crate::value::Value;

const LOCAL_DATE_FORMAT: &str = "%Y-%m-%d";
const LOCAL_TIME_FORMAT: &str = "%H:%M:%S%.f";
const LOCAL_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

// --------------------------------- varint ---------------------------------

pub(crate) fn weekday_from_ordinal(ordinal: i64) -> Result<Weekday, DecodeError> {
    let weekday = match ordinal {
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        6 => Weekday::Sat,
        7 => Weekday::Sun,
        other => {
            return Err(DecodeError::message(format!(
                "Invalid day-of-week value: {other}"
            )))
        }
    };
    Ok(weekday)
}

pub(crate) fn month_from_ordinal(ordinal: i64) -> Result<Month, DecodeError> {
    let month = match ordinal {
        1 => Month::January,
        2 => Month::February,
        3 => Month::March,
        4 => Month::April,
        5 => Month::May,
        6 => Month::June,
        7 => Month::July,
        8 => Month::August,
        9 => Month::September,
        10 => Month::October,
        11 => Month::November,
        12 => Month::December,
        other => {
            return Err(DecodeError::message(format!(
                "Invalid month value: {other}"
            )))
        }
    };
    Ok(month)
}

pub(crate) fn zone_offset_from_seconds(seconds: i64) -> Result<FixedOffset, DecodeError> {
    i32::try_from(seconds)
        .ok()
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| DecodeError::message(format!("Invalid zone offset: {seconds} seconds")))
}

// --------------------------------- records --------------------------------

fn int_fields(names: &[&str]) -> Vec<(String, Schema)> {
    names
        .iter()
        .map(|name| (name.to_string(), Schema::int()))
        .collect()
}

fn get_i64(data: &BTreeMap<String, Value>, name: &str) -> i64 {
    // Absent sub-fields default to zero.
    match data.get(name) {
        Some(Value::Long(value)) => *value,
        Some(Value::Int(value)) => i64::from(*value),
        _ => 0,
    }
}

pub(crate) fn month_day_fields() -> Vec<(String, Schema)> {
    int_fields(&["month", "day"])
}

pub(crate) fn month_day_data(month: u32, day: u32) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("month".to_string(), Value::Int(month as i32)),
        ("day".to_string(), Value::Int(day as i32)),
    ])
}

pub(crate) fn month_day_from_record(data: &BTreeMap<String, Value>) -> Result<Value, DecodeError> {
    let month = get_i64(data, "month");
    let day = get_i64(data, "day");
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(DecodeError::message(format!(
            "Invalid month-day: month {month}, day {day}"
        )));
    }
    Ok(Value::MonthDay {
        month: month as u32,
        day: day as u32,
    })
}

pub(crate) fn year_month_fields() -> Vec<(String, Schema)> {
    int_fields(&["year", "month"])
}

pub(crate) fn year_month_data(year: i32, month: u32) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("year".to_string(), Value::Int(year)),
        ("month".to_string(), Value::Int(month as i32)),
    ])
}

pub(crate) fn year_month_from_record(data: &BTreeMap<String, Value>) -> Result<Value, DecodeError> {
    let year = get_i64(data, "year");
    let month = get_i64(data, "month");
    if !(1..=12).contains(&month) {
        return Err(DecodeError::message(format!("Invalid month value: {month}")));
    }
    Ok(Value::YearMonth {
        year: year as i32,
        month: month as u32,
    })
}

pub(crate) fn period_fields() -> Vec<(String, Schema)> {
    int_fields(&["years", "months", "days"])
}

pub(crate) fn period_data(years: i32, months: i32, days: i32) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("years".to_string(), Value::Int(years)),
        ("months".to_string(), Value::Int(months)),
        ("days".to_string(), Value::Int(days)),
    ])
}

pub(crate) fn period_from_record(data: &BTreeMap<String, Value>) -> Result<Value, DecodeError> {
    Ok(Value::Period {
        years: get_i64(data, "years") as i32,
        months: get_i64(data, "months") as i32,
        days: get_i64(data, "days") as i32,
    })
}

pub(crate) fn duration_fields() -> Vec<(String, Schema)> {
    vec![
        ("seconds".to_string(), Schema::long()),
        ("nanos".to_string(), Schema::int()),
    ]
}

pub(crate) fn duration_data(duration: &TimeDelta) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("seconds".to_string(), Value::Long(duration.num_seconds())),
        ("nanos".to_string(), Value::Int(duration.subsec_nanos())),
    ])
}

pub(crate) fn duration_from_record(data: &BTreeMap<String, Value>) -> Result<Value, DecodeError> {
    let seconds = get_i64(data, "seconds");
    let nanos = get_i64(data, "nanos");
    TimeDelta::try_seconds(seconds)
        .and_then(|duration| duration.checked_add(&TimeDelta::nanoseconds(nanos)))
        .map(Value::Duration)
        .ok_or_else(|| {
            DecodeError::message(format!(
                "Invalid duration: {seconds} seconds, {nanos} nanos"
            ))
        })
}

// --------------------------------- strings --------------------------------

pub(crate) fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339()
}

pub(crate) fn parse_instant(text: &str) -> Result<DateTime<Utc>, DecodeError> {
    DateTime::parse_from_rfc3339(text)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| DecodeError::message(err.to_string()))
}

pub(crate) fn format_local_date(date: &NaiveDate) -> String {
    date.format(LOCAL_DATE_FORMAT).to_string()
}

pub(crate) fn parse_local_date(text: &str) -> Result<NaiveDate, DecodeError> {
    NaiveDate::parse_from_str(text, LOCAL_DATE_FORMAT)
        .map_err(|err| DecodeError::message(err.to_string()))
}

pub(crate) fn format_local_time(time: &NaiveTime) -> String {
    time.format(LOCAL_TIME_FORMAT).to_string()
}

pub(crate) fn parse_local_time(text: &str) -> Result<NaiveTime, DecodeError> {
    NaiveTime::parse_from_str(text, LOCAL_TIME_FORMAT)
        .map_err(|err| DecodeError::message(err.to_string()))
}

pub(crate) fn format_local_date_time(date_time: &NaiveDateTime) -> String {
    date_time.format(LOCAL_DATE_TIME_FORMAT).to_string()
}

pub(crate) fn parse_local_date_time(text: &str) -> Result<NaiveDateTime, DecodeError> {
    NaiveDateTime::parse_from_str(text, LOCAL_DATE_TIME_FORMAT)
        .map_err(|err| DecodeError::message(err.to_string()))
}

pub(crate) fn format_offset_time(time: &NaiveTime, offset: &FixedOffset) -> String {
    format!("{}{}", time.format(LOCAL_TIME_FORMAT), offset)
}

pub(crate) fn parse_offset_time(text: &str) -> Result<(NaiveTime, FixedOffset), DecodeError> {
    let split = text
        .rfind(|c| c == '+' || c == '-' || c == 'Z')
        .filter(|&idx| idx > 0)
        .ok_or_else(|| DecodeError::message(format!("Invalid offset time: {text}")))?;
    let time = NaiveTime::parse_from_str(&text[..split], LOCAL_TIME_FORMAT)
        .map_err(|err| DecodeError::message(err.to_string()))?;
    let offset = parse_zone_offset(&text[split..])?;
    Ok((time, offset))
}

pub(crate) fn format_offset_date_time(date_time: &DateTime<FixedOffset>) -> String {
    date_time.to_rfc3339()
}

pub(crate) fn parse_offset_date_time(text: &str) -> Result<DateTime<FixedOffset>, DecodeError> {
    DateTime::parse_from_rfc3339(text).map_err(|err| DecodeError::message(err.to_string()))
}

pub(crate) fn format_zoned_date_time(date_time: &DateTime<Tz>) -> String {
    format!(
        "{}[{}]",
        date_time.fixed_offset().to_rfc3339(),
        date_time.timezone().name()
    )
}

pub(crate) fn parse_zoned_date_time(text: &str) -> Result<DateTime<Tz>, DecodeError> {
    let (front, zone) = match text.find('[') {
        Some(idx) if text.ends_with(']') => (&text[..idx], &text[idx + 1..text.len() - 1]),
        _ => {
            return Err(DecodeError::message(format!(
                "Invalid zoned date-time: {text}"
            )))
        }
    };
    let zone: Tz = zone
        .parse()
        .map_err(|_| DecodeError::message(format!("Invalid time zone: {zone}")))?;
    let date_time =
        DateTime::parse_from_rfc3339(front).map_err(|err| DecodeError::message(err.to_string()))?;
    Ok(date_time.with_timezone(&zone))
}

pub(crate) fn parse_zone_id(text: &str) -> Result<Tz, DecodeError> {
    text.parse::<Tz>()
        .map_err(|_| DecodeError::message(format!("Invalid time zone: {text}")))
}

/// Parses a `+HH:MM[:SS]` / `-HH:MM[:SS]` / `Z` offset suffix.
fn parse_zone_offset(text: &str) -> Result<FixedOffset, DecodeError> {
    let invalid = || DecodeError::message(format!("Invalid zone offset: {text}"));

    let (sign, rest) = match text.chars().next() {
        Some('Z') | Some('z') if text.len() == 1 => return Ok(Utc.fix()),
        Some('+') => (1i32, &text[1..]),
        Some('-') => (-1i32, &text[1..]),
        _ => return Err(invalid()),
    };

    let mut parts = rest.split(':');
    let hours: i32 = parts
        .next()
        .and_then(|part| part.parse().ok())
        .ok_or_else(invalid)?;
    let minutes: i32 = match parts.next() {
        Some(part) => part.parse().map_err(|_| invalid())?,
        None => 0,
    };
    let seconds: i32 = match parts.next() {
        Some(part) => part.parse().map_err(|_| invalid())?,
        None => 0,
    };

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60 + seconds)).ok_or_else(invalid)
}
