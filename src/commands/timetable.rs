use crate::commands::{print_json, CommandResult};
use crate::db::Database;
use crate::handlers::timetable::{add_event, edit_event, remove_event};
use crate::models::{parse_time_of_day, EventColor, EventDraft};
use crate::timetable::{parse_day, DAY_NAMES};
use chrono::NaiveTime;
use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum TimetableCommand {
    /// Add a class to the timetable
    Add {
        #[arg(long)]
        user: String,
        #[command(flatten)]
        event: EventArgs,
    },
    /// Replace the details of an existing class
    Edit {
        #[arg(long)]
        user: String,
        event_id: String,
        #[command(flatten)]
        event: EventArgs,
    },
    /// List a user's classes, grouped by day
    List {
        #[arg(long)]
        user: String,
        #[arg(long)]
        json: bool,
    },
    /// Remove a class
    Remove {
        #[arg(long)]
        user: String,
        event_id: String,
    },
}

#[derive(Args)]
pub struct EventArgs {
    #[arg(long)]
    title: String,
    /// 0-6 (Sunday first) or a day name
    #[arg(long, value_parser = parse_day)]
    day: u8,
    /// Start time, HH:MM
    #[arg(long, value_parser = parse_time_of_day)]
    start: NaiveTime,
    /// End time, HH:MM
    #[arg(long, value_parser = parse_time_of_day)]
    end: NaiveTime,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, default_value = "blue")]
    color: EventColor,
    /// Minutes before the start to alert: 0, 5, 10, 15, 30 or 60
    #[arg(long, default_value_t = 15)]
    alert: u32,
}

impl From<EventArgs> for EventDraft {
    fn from(args: EventArgs) -> Self {
        EventDraft {
            title: args.title,
            description: args.description,
            day_of_week: args.day,
            start_time: args.start,
            end_time: args.end,
            location: args.location,
            color: args.color,
            alert_before: args.alert,
        }
    }
}

pub async fn run(database: &Database, command: TimetableCommand) -> CommandResult {
    match command {
        TimetableCommand::Add { user, event } => {
            let event = add_event(database, &user, event.into()).await?;
            println!("Added {} ({})", event.title, event.id);
        }
        TimetableCommand::Edit { user, event_id, event } => {
            let event = edit_event(database, &user, &event_id, event.into()).await?;
            println!("Updated {} ({})", event.title, event.id);
        }
        TimetableCommand::List { user, json } => {
            let events = database.list_events(&user).await?;
            if json {
                return print_json(&events);
            }
            if events.is_empty() {
                println!("No classes scheduled.");
            }
            let mut current_day = None;
            for event in &events {
                if current_day != Some(event.day_of_week) {
                    current_day = Some(event.day_of_week);
                    println!("{}", DAY_NAMES[usize::from(event.day_of_week)]);
                }
                let mut line = format!(
                    "  {}-{} {}",
                    event.start_time.format("%H:%M"),
                    event.end_time.format("%H:%M"),
                    event.title
                );
                if let Some(location) = &event.location {
                    line.push_str(&format!(" @ {}", location));
                }
                if event.alert_before > 0 {
                    line.push_str(&format!(" [alert {}m]", event.alert_before));
                }
                println!("{}  ({}, {})", line, event.color, event.id);
            }
        }
        TimetableCommand::Remove { user, event_id } => {
            remove_event(database, &user, &event_id).await?;
            println!("Removed {}", event_id);
        }
    }
    Ok(())
}
