use crate::commands::CommandResult;
use crate::db::Database;
use crate::tasks::alert_scheduler::run_alert_scheduler;
use crate::timetable::{sort_events, LogSink};
use chrono::Local;
use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};

/// Watches a user's timetable and logs alerts until Ctrl-C.
pub async fn run(database: &Database, user_id: &str, check_interval: Duration) -> CommandResult {
    let mut events = database.list_events(user_id).await?;
    sort_events(&mut events);
    info!("Loaded {} timetable event(s) for {}", events.len(), user_id);

    let (_events_tx, events_rx) = watch::channel(events);
    let (stop_tx, stop_rx) = oneshot::channel();

    let scheduler = tokio::spawn(run_alert_scheduler(
        events_rx,
        Arc::new(LogSink),
        || Local::now().naive_local(),
        check_interval,
        stop_rx,
    ));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    let _ = stop_tx.send(());
    scheduler.await?;
    Ok(())
}
