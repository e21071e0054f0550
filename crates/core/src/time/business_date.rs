use crate::error::AdvisorError;
use crate::time::calendar::MarketCalendar;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Days of calendar fetched on either side of the instant being resolved.
pub const LOOKUP_PADDING_DAYS: i64 = 10;

/// Cap on how far `days_offset` may widen the look-back. The look-back is
/// then at most `LOOKUP_PADDING_DAYS + MAX_OFFSET_PADDING_DAYS` days; offsets
/// beyond that fall outside the fetched window and fail instead of being
/// clamped.
pub const MAX_OFFSET_PADDING_DAYS: i64 = 30;

/// Maps wall-clock instants onto exchange business dates.
#[derive(Debug, Clone)]
pub struct CalendarResolver<C> {
    calendar: C,
}

impl<C: MarketCalendar> CalendarResolver<C> {
    pub fn new(calendar: C) -> Self {
        Self { calendar }
    }

    /// The most recent session whose cutover instant (session date at
    /// `cutover_time` UTC) is strictly before `now - days_offset days`.
    ///
    /// e.g. with a 22:00 cutover and `days_offset = 0`:
    ///   2020-06-10 23:00 UTC -> 2020-06-10
    ///   2020-06-10 21:00 UTC -> 2020-06-09
    pub fn resolve_business_date(
        &self,
        now: DateTime<Utc>,
        days_offset: i64,
        cutover_time: NaiveTime,
    ) -> Result<NaiveDate, AdvisorError> {
        let lookback = LOOKUP_PADDING_DAYS
            + i64::try_from(days_offset.unsigned_abs())
                .unwrap_or(i64::MAX)
                .min(MAX_OFFSET_PADDING_DAYS);
        let window_start = (now - Duration::days(lookback)).date_naive();
        let window_end = (now + Duration::days(LOOKUP_PADDING_DAYS)).date_naive();

        let shifted = Duration::try_days(days_offset)
            .and_then(|offset| now.checked_sub_signed(offset))
            .filter(|t| (window_start..=window_end).contains(&t.date_naive()))
            .ok_or_else(|| {
                AdvisorError::not_found(format!(
                    "business date for offset {days_offset} days (lookup window {window_start}..={window_end})"
                ))
            })?;

        self.calendar
            .schedule(window_start, window_end)?
            .into_iter()
            .map(|session| session.date)
            .filter(|date| cutover_instant(*date, cutover_time) < shifted)
            .max()
            .ok_or_else(|| {
                AdvisorError::not_found(format!(
                    "business date before {shifted} (lookup window {window_start}..={window_end})"
                ))
            })
    }

    /// The window during which data priced on `reference_date` is current:
    /// from the session at or before `reference_date` to the first session
    /// after it, both stamped at `cutover_time` UTC.
    pub fn resolve_validity_window(
        &self,
        reference_date: NaiveDate,
        cutover_time: NaiveTime,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), AdvisorError> {
        let next_day = reference_date + Duration::days(1);
        let sessions = self.calendar.schedule(
            reference_date - Duration::days(LOOKUP_PADDING_DAYS),
            next_day + Duration::days(LOOKUP_PADDING_DAYS),
        )?;

        let valid_from = sessions
            .iter()
            .map(|s| s.date)
            .filter(|d| *d <= reference_date)
            .max()
            .ok_or_else(|| {
                AdvisorError::not_found(format!("trading session at or before {reference_date}"))
            })?;
        let valid_to = sessions
            .iter()
            .map(|s| s.date)
            .filter(|d| *d >= next_day)
            .min()
            .ok_or_else(|| {
                AdvisorError::not_found(format!("trading session at or after {next_day}"))
            })?;

        Ok((
            cutover_instant(valid_from, cutover_time),
            cutover_instant(valid_to, cutover_time),
        ))
    }
}

fn cutover_instant(date: NaiveDate, cutover_time: NaiveTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(cutover_time))
}

/// Parses an explicit `YYYY-MM-DD` business date supplied by an operator.
pub fn resolve_as_of_override(
    as_of_date_arg: Option<&str>,
) -> Result<Option<NaiveDate>, AdvisorError> {
    as_of_date_arg
        .map(|s| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| {
                AdvisorError::validation(format!("as-of date {s:?} is not YYYY-MM-DD: {e}"))
            })
        })
        .transpose()
}
