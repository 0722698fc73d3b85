use crate::models::{TimetableError, TimetableEvent};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use log::info;

pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Accepts `0`-`6` (Sunday first), a full day name or its three-letter form.
pub fn parse_day(s: &str) -> Result<u8, TimetableError> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u8>() {
        return if n <= 6 { Ok(n) } else { Err(TimetableError::InvalidDay(n)) };
    }
    DAY_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(s) || name[..3].eq_ignore_ascii_case(s))
        .map(|i| i as u8)
        .ok_or_else(|| TimetableError::InvalidDayName(s.to_string()))
}

/// A reminder that an event is about to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub event_id: String,
    pub date: NaiveDate,
    pub title: String,
    pub body: String,
}

/// Where alerts go once they are due.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, alert: &Alert);
}

/// Writes alerts to the log.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(&self, alert: &Alert) {
        info!("{} - {}", alert.title, alert.body);
    }
}

/// Orders events by weekday, then start time.
pub fn sort_events(events: &mut [TimetableEvent]) {
    events.sort_by(|a, b| {
        a.day_of_week
            .cmp(&b.day_of_week)
            .then_with(|| a.start_time.cmp(&b.start_time))
    });
}

/// Minute of the day the alert for `event` fires, or `None` when the event has
/// no alert or the alert would fall on the previous day.
pub fn alert_minute(event: &TimetableEvent) -> Option<u32> {
    if event.alert_before == 0 {
        return None;
    }
    let start = event.start_time.hour() * 60 + event.start_time.minute();
    start.checked_sub(event.alert_before)
}

/// Alerts due at the minute containing `now`.
pub fn due_alerts(events: &[TimetableEvent], now: NaiveDateTime) -> Vec<Alert> {
    let today = now.weekday().num_days_from_sunday();
    let minute = now.hour() * 60 + now.minute();

    events
        .iter()
        .filter(|event| u32::from(event.day_of_week) == today)
        .filter(|event| alert_minute(event) == Some(minute))
        .map(|event| build_alert(event, now.date()))
        .collect()
}

fn build_alert(event: &TimetableEvent, date: NaiveDate) -> Alert {
    let mut body = format!("Starting in {} minutes", event.alert_before);
    if let Some(location) = &event.location {
        body.push_str(&format!(" at {}", location));
    }
    Alert {
        event_id: event.id.clone(),
        date,
        title: format!("Upcoming: {}", event.title),
        body,
    }
}
