use crate::models::TimetableEvent;
use crate::timetable::{due_alerts, NotificationSink};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::{oneshot, watch};
use tokio::time::{interval, MissedTickBehavior};

/// Checks `events` for due alerts on every tick until `shutdown` fires or its
/// sender is dropped. Each event alerts at most once per day.
pub async fn run_alert_scheduler<C>(
    events: watch::Receiver<Vec<TimetableEvent>>,
    sink: Arc<dyn NotificationSink>,
    clock: C,
    period: StdDuration,
    mut shutdown: oneshot::Receiver<()>,
) where
    C: Fn() -> NaiveDateTime + Send,
{
    info!("Starting timetable alert scheduler (every {:?})", period);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut fired: HashSet<(String, NaiveDate)> = HashSet::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        let now = clock();
        debug!("Checking timetable alerts at {}", now);
        fired.retain(|(_, date)| *date >= now.date());

        let due = due_alerts(&events.borrow(), now);
        for alert in due {
            if fired.insert((alert.event_id.clone(), alert.date)) {
                info!("Alert for event {}: {}", alert.event_id, alert.title);
                sink.notify(&alert).await;
            }
        }
    }

    info!("Timetable alert scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::tests::{event, monday_at};
    use crate::timetable::Alert;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        alerts: Mutex<Vec<Alert>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn notify(&self, alert: &Alert) {
            self.alerts.lock().unwrap().push(alert.clone());
        }
    }

    #[tokio::test]
    async fn fires_once_per_event_and_stops_on_shutdown() {
        let events = vec![event("Physics", 1, (9, 0), 15), event("Art", 1, (9, 0), 30)];
        let (_events_tx, events_rx) = watch::channel(events);
        let sink = Arc::new(RecordingSink::default());
        let (stop_tx, stop_rx) = oneshot::channel();

        let handle = tokio::spawn(run_alert_scheduler(
            events_rx,
            sink.clone(),
            || monday_at(8, 45),
            StdDuration::from_millis(5),
            stop_rx,
        ));

        tokio::time::sleep(StdDuration::from_millis(60)).await;
        stop_tx.send(()).unwrap();
        handle.await.unwrap();

        let alerts = sink.alerts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].title, "Upcoming: Physics");
    }

    #[tokio::test]
    async fn picks_up_replaced_event_list() {
        let (events_tx, events_rx) = watch::channel(Vec::new());
        let sink = Arc::new(RecordingSink::default());
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(run_alert_scheduler(
            events_rx,
            sink.clone(),
            || monday_at(8, 45),
            StdDuration::from_millis(5),
            stop_rx,
        ));

        tokio::time::sleep(StdDuration::from_millis(20)).await;
        assert!(sink.alerts.lock().unwrap().is_empty());

        events_tx.send(vec![event("Physics", 1, (9, 0), 15)]).unwrap();
        tokio::time::sleep(StdDuration::from_millis(40)).await;
        drop(stop_tx);
        handle.await.unwrap();

        assert_eq!(sink.alerts.lock().unwrap().len(), 1);
    }
}
