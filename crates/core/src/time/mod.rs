pub mod business_date;
pub mod calendar;

pub use business_date::{resolve_as_of_override, CalendarResolver};
pub use calendar::{MarketCalendar, NyseCalendar, TradingSession};
