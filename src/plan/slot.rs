use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, SecondsFormat, Timelike,
    Utc,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const LEGACY_SLOT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Error, PartialEq)]
pub enum SlotError {
    #[error("Invalid slot identifier: {0}")]
    Unparseable(String),
    #[error("Slot {0} does not start at the top of an hour")]
    NotAligned(String),
    #[error("UTC offset of {0} hours is out of range")]
    InvalidOffset(i32),
}

/// One hour of availability, identified by its start instant in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(DateTime<Utc>);

impl TimeSlot {
    pub fn from_instant(instant: DateTime<Utc>) -> Result<Self, SlotError> {
        if instant.minute() != 0 || instant.second() != 0 || instant.nanosecond() != 0 {
            return Err(SlotError::NotAligned(instant.to_rfc3339()));
        }
        Ok(Self(instant))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.0 + Duration::hours(1)
    }

    pub fn next(&self) -> TimeSlot {
        TimeSlot(self.end())
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl FromStr for TimeSlot {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let instant = match DateTime::parse_from_rfc3339(trimmed) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(_) => NaiveDateTime::parse_from_str(trimmed, LEGACY_SLOT_FORMAT)
                .map_err(|_| SlotError::Unparseable(s.to_string()))?
                .and_utc(),
        };
        Self::from_instant(instant)
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Maps calendar (day, hour) pairs seen by participants onto absolute slots.
///
/// The offset is restricted to whole hours so flooring in local time and in
/// UTC agree and every slot stays hour-aligned in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotCodec {
    offset: FixedOffset,
}

impl SlotCodec {
    pub fn new(utc_offset_hours: i32) -> Result<Self, SlotError> {
        if !(-12..=14).contains(&utc_offset_hours) {
            return Err(SlotError::InvalidOffset(utc_offset_hours));
        }
        FixedOffset::east_opt(utc_offset_hours * 3600)
            .map(|offset| Self { offset })
            .ok_or(SlotError::InvalidOffset(utc_offset_hours))
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn slot_id(&self, day: NaiveDate, hour: u32) -> TimeSlot {
        let local = day.and_time(NaiveTime::MIN) + Duration::hours(i64::from(hour));
        let utc = local.and_utc() - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        TimeSlot(utc)
    }

    pub fn floor(&self, instant: DateTime<Utc>) -> TimeSlot {
        let excess = Duration::minutes(i64::from(instant.minute()))
            + Duration::seconds(i64::from(instant.second()))
            + Duration::nanoseconds(i64::from(instant.nanosecond()));
        TimeSlot(instant - excess)
    }

    /// Slots minimally covering `[start, end)`. Always yields the slot
    /// containing `start`, even for empty or inverted intervals.
    pub fn slots_covering(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<TimeSlot> {
        let first = self.floor(start);
        let mut slots = vec![first];
        let mut next = first.next();
        while next.start() < end {
            slots.push(next);
            next = next.next();
        }
        slots
    }

    /// Last element of `slots_covering(start, end)` without building the list.
    pub fn last_covering(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> TimeSlot {
        let first = self.floor(start);
        let mut last = self.floor(end);
        if last.start() >= end {
            last = TimeSlot(last.start() - Duration::hours(1));
        }
        last.max(first)
    }

    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    pub fn day_hour(&self, slot: TimeSlot) -> (NaiveDate, u32) {
        let local = slot.start().with_timezone(&self.offset);
        (local.date_naive(), local.hour())
    }
}

impl Default for SlotCodec {
    fn default() -> Self {
        Self::utc()
    }
}
