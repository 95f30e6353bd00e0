//! Wall-clock synchronisation over HTTP.
//!
//! [`TimeSync`] is a request producer for the HTTP session. It asks a world
//! clock service for the current time, parses the JSON answer and hands the
//! result to a [`TimeSink`], typically the RTC driver. The first sync should
//! be submitted at start-up and then every [`SYNC_PERIOD_MS`].
//!
//! Expected body, unknown fields ignored:
//!
//! ```json
//! {"currentDateTime":"2024-03-31T14:05+02:00","dayOfTheWeek":"Sunday","isDayLightSavingsTime":true}
//! ```

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use serde::Deserialize;

use crate::network::application::http::{
    Method, ParseError, RequestDescriptor, ResponseHandler, SubmitError, Submitter,
};
use crate::system::Mailbox;

/// Time service queried by default.
pub const DEFAULT_URL: &str = "http://worldclockapi.com/api/json/cet/now";
/// Port of the default time service.
pub const DEFAULT_PORT: u16 = 80;
/// Interval between two syncs.
pub const SYNC_PERIOD_MS: u32 = 3_600_000;
/// Failed syncs in a row after which the sink is told to fall back.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Day of the week as named by the time service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Parses an English day name.
    pub fn from_name(name: &str) -> Option<Self> {
        let day = match name {
            "Monday" => Weekday::Monday,
            "Tuesday" => Weekday::Tuesday,
            "Wednesday" => Weekday::Wednesday,
            "Thursday" => Weekday::Thursday,
            "Friday" => Weekday::Friday,
            "Saturday" => Weekday::Saturday,
            "Sunday" => Weekday::Sunday,
            _ => return None,
        };
        Some(day)
    }
}

/// Local date and time reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    /// Four-digit year.
    pub year: u16,
    /// Month, 1 to 12.
    pub month: u8,
    /// Day of the month, 1 to 31.
    pub day: u8,
    /// Hour, 0 to 23.
    pub hour: u8,
    /// Minute, 0 to 59.
    pub minute: u8,
    /// Offset from UTC, in minutes.
    pub utc_offset_minutes: i16,
    /// Day of the week.
    pub weekday: Weekday,
    /// Daylight saving time is in effect.
    pub dst: bool,
}

/// Why a response body was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BodyError {
    /// Not the expected JSON object.
    Json,
    /// `currentDateTime` is malformed.
    DateTime,
    /// `dayOfTheWeek` is not a day name.
    Weekday,
}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyError::Json => f.write_str("malformed JSON body"),
            BodyError::DateTime => f.write_str("malformed date and time"),
            BodyError::Weekday => f.write_str("unknown day of the week"),
        }
    }
}

/// Why a sync request was not submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The configured server URL does not parse.
    Url(ParseError),
    /// The session did not take the request.
    Submit(SubmitError),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Url(e) => write!(f, "invalid time server URL: {e}"),
            SyncError::Submit(e) => write!(f, "time sync not submitted: {e}"),
        }
    }
}

impl From<ParseError> for SyncError {
    fn from(e: ParseError) -> Self {
        SyncError::Url(e)
    }
}

impl From<SubmitError> for SyncError {
    fn from(e: SubmitError) -> Self {
        SyncError::Submit(e)
    }
}

/// Where synchronised time goes.
pub trait TimeSink: Sync {
    /// A fresh time was received.
    fn set_time(&self, now: &DateTime);

    /// Syncing failed [`MAX_CONSECUTIVE_FAILURES`] times in a row.
    fn fallback(&self);
}

#[derive(Deserialize)]
struct WorldClock<'a> {
    #[serde(rename = "currentDateTime")]
    current_date_time: &'a str,
    #[serde(rename = "dayOfTheWeek")]
    day_of_the_week: &'a str,
    #[serde(rename = "isDayLightSavingsTime")]
    is_daylight_savings_time: bool,
}

/// Parses a time service response body.
pub fn parse_body(body: &[u8]) -> Result<DateTime, BodyError> {
    let (clock, _) =
        serde_json_core::from_slice::<WorldClock<'_>>(body).map_err(|_| BodyError::Json)?;
    let weekday = Weekday::from_name(clock.day_of_the_week).ok_or(BodyError::Weekday)?;
    parse_date_time(clock.current_date_time, weekday, clock.is_daylight_savings_time)
}

/// Parses `YYYY-MM-DDTHH:MM` followed by `Z` or `±hh:mm`.
fn parse_date_time(text: &str, weekday: Weekday, dst: bool) -> Result<DateTime, BodyError> {
    let bytes = text.as_bytes();
    if bytes.len() < 17
        || bytes[4] != b'-'
        || bytes[7] != b'-'
        || bytes[10] != b'T'
        || bytes[13] != b':'
    {
        return Err(BodyError::DateTime);
    }

    let year = digits(&bytes[0..4])? as u16;
    let month = digits(&bytes[5..7])? as u8;
    let day = digits(&bytes[8..10])? as u8;
    let hour = digits(&bytes[11..13])? as u8;
    let minute = digits(&bytes[14..16])? as u8;

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) || hour > 23 || minute > 59 {
        return Err(BodyError::DateTime);
    }

    let utc_offset_minutes = match &bytes[16..] {
        b"Z" => 0,
        [sign @ (b'+' | b'-'), h1, h2, b':', m1, m2] => {
            let offset = (digits(&[*h1, *h2])? * 60 + digits(&[*m1, *m2])?) as i16;
            if *sign == b'-' { -offset } else { offset }
        }
        _ => return Err(BodyError::DateTime),
    };

    Ok(DateTime {
        year,
        month,
        day,
        hour,
        minute,
        utc_offset_minutes,
        weekday,
        dst,
    })
}

fn digits(bytes: &[u8]) -> Result<u32, BodyError> {
    bytes.iter().try_fold(0u32, |acc, b| match b {
        b'0'..=b'9' => Ok(acc * 10 + u32::from(b - b'0')),
        _ => Err(BodyError::DateTime),
    })
}

/// Periodic time synchronisation through the HTTP session.
pub struct TimeSync<S> {
    sink: S,
    url: &'static str,
    port: u16,
    failures: AtomicU32,
}

impl<S: TimeSink> TimeSync<S> {
    /// Syncs from [`DEFAULT_URL`].
    pub const fn new(sink: S) -> Self {
        Self::with_server(sink, DEFAULT_URL, DEFAULT_PORT)
    }

    /// Syncs from another server answering in the same format.
    pub const fn with_server(sink: S, url: &'static str, port: u16) -> Self {
        Self {
            sink,
            url,
            port,
            failures: AtomicU32::new(0),
        }
    }

    /// The sink receiving the time.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Failed syncs since the last successful one.
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::Relaxed)
    }

    /// A configured GET for the time server, reporting back to `self`.
    pub fn request(&self) -> Result<RequestDescriptor<'_>, ParseError> {
        let mut request = RequestDescriptor::new(self);
        request.configure(self.url, self.port, Method::Get)?;
        Ok(request)
    }

    /// Queues a sync request.
    pub fn sync<'h, Q>(&'h self, submitter: &Submitter<'_, Q>) -> Result<(), SyncError>
    where
        Q: Mailbox<RequestDescriptor<'h>>,
    {
        submitter.submit(self.request()?)?;
        Ok(())
    }

    fn record_failure(&self) {
        // Single writer: callbacks run on the session task only.
        let failures = self.failures.load(Ordering::Relaxed).saturating_add(1);
        self.failures.store(failures, Ordering::Relaxed);

        if failures == MAX_CONSECUTIVE_FAILURES {
            warn!("Time sync failed {} times in a row, falling back", failures);
            self.sink.fallback();
        }
    }
}

impl<S: TimeSink> ResponseHandler for TimeSync<S> {
    fn on_success(&self, body: &[u8]) {
        match parse_body(body) {
            Ok(now) => {
                info!(
                    "Time synced: {}-{}-{} {}:{}",
                    now.year, now.month, now.day, now.hour, now.minute
                );
                self.failures.store(0, Ordering::Relaxed);
                self.sink.set_time(&now);
            }
            Err(e) => {
                error!("Time sync response rejected: {}", e);
                self.record_failure();
            }
        }
    }

    fn on_error(&self, code: i32) {
        error!("Time sync request failed, error code: {}", code);
        self.record_failure();
    }
}

impl<S> fmt::Debug for TimeSync<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeSync")
            .field("url", &self.url)
            .field("port", &self.port)
            .field("failures", &self.failures.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
