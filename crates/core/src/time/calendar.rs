use crate::error::AdvisorError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use std::collections::BTreeSet;

/// One regular trading session, bounded by UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingSession {
    pub date: NaiveDate,
    pub open: DateTime<Utc>,
    pub close: DateTime<Utc>,
}

pub trait MarketCalendar {
    /// Sessions whose date lies in `start..=end`, oldest first.
    fn schedule(&self, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<TradingSession>, AdvisorError>;
}

/// NYSE regular sessions: 09:30-16:00 New York time on weekdays that are not
/// exchange holidays. Early closes are not modelled; unscheduled closures can
/// be supplied explicitly.
#[derive(Debug, Default, Clone)]
pub struct NyseCalendar {
    extra_closures: BTreeSet<NaiveDate>,
}

impl NyseCalendar {
    pub fn with_closures(closures: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            extra_closures: closures.into_iter().collect(),
        }
    }

    /// Reads unscheduled closures from `NYSE_EXTRA_CLOSURES="YYYY-MM-DD,YYYY-MM-DD"`.
    pub fn from_env() -> Result<Self, AdvisorError> {
        match std::env::var("NYSE_EXTRA_CLOSURES") {
            Ok(s) => Self::parse_closures(&s).map(Self::with_closures),
            Err(_) => Ok(Self::default()),
        }
    }

    fn parse_closures(s: &str) -> Result<Vec<NaiveDate>, AdvisorError> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                NaiveDate::parse_from_str(part, "%Y-%m-%d").map_err(|e| {
                    AdvisorError::validation(format!("NYSE_EXTRA_CLOSURES entry {part:?}: {e}"))
                })
            })
            .collect()
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && !is_nyse_holiday(date) && !self.extra_closures.contains(&date)
    }

    pub fn session(&self, date: NaiveDate) -> Option<TradingSession> {
        if !self.is_trading_day(date) {
            return None;
        }
        let utc_shift = Duration::hours(if is_us_daylight_saving(date) { 4 } else { 5 });
        let open = Utc.from_utc_datetime(&date.and_hms_opt(9, 30, 0)?) + utc_shift;
        let close = Utc.from_utc_datetime(&date.and_hms_opt(16, 0, 0)?) + utc_shift;
        Some(TradingSession { date, open, close })
    }
}

impl MarketCalendar for NyseCalendar {
    fn schedule(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TradingSession>, AdvisorError> {
        if start > end {
            return Err(AdvisorError::validation(format!(
                "calendar range start {start} is after end {end}"
            )));
        }
        Ok(start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter_map(|d| self.session(d))
            .collect())
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

// US rules since 2007: second Sunday of March through first Sunday of November.
fn is_us_daylight_saving(date: NaiveDate) -> bool {
    let year = date.year();
    let start = NaiveDate::from_weekday_of_month_opt(year, 3, Weekday::Sun, 2);
    let end = NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Sun, 1);
    match (start, end) {
        (Some(start), Some(end)) => start <= date && date < end,
        _ => false,
    }
}

fn is_nyse_holiday(date: NaiveDate) -> bool {
    nyse_holidays(date.year()).contains(&date)
}

fn nyse_holidays(year: i32) -> Vec<NaiveDate> {
    let fixed = |month, day| NaiveDate::from_ymd_opt(year, month, day);
    let nth = |month, weekday, n| NaiveDate::from_weekday_of_month_opt(year, month, weekday, n);

    // A Saturday New Year's Day is not moved back into the previous year.
    let new_year = fixed(1, 1).map(|d| match d.weekday() {
        Weekday::Sun => d + Duration::days(1),
        _ => d,
    });

    let candidates = [
        new_year,
        if year >= 1998 { nth(1, Weekday::Mon, 3) } else { None },
        nth(2, Weekday::Mon, 3),
        easter_sunday(year).map(|d| d - Duration::days(2)),
        nth(5, Weekday::Mon, 5).or_else(|| nth(5, Weekday::Mon, 4)),
        if year >= 2022 { fixed(6, 19).map(observed) } else { None },
        fixed(7, 4).map(observed),
        nth(9, Weekday::Mon, 1),
        nth(11, Weekday::Thu, 4),
        fixed(12, 25).map(observed),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter(|d| !is_weekend(*d))
        .collect()
}

fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

// Anonymous Gregorian algorithm.
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}
