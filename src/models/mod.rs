use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

mod group;
mod note;

pub use group::{Group, GroupError, GroupKind, GroupMember, GroupRole};
pub use note::{NoteColor, NoteError, PersonalNote, StickyNote, NOTE_TAGS};

pub const MIN_POLL_OPTIONS: usize = 2;
pub const MAX_POLL_OPTIONS: usize = 6;

/// Minutes-before values offered by the timetable form. 0 disables the alert.
pub const ALERT_CHOICES: [u32; 6] = [0, 5, 10, 15, 30, 60];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Poll {
    pub id: String,
    pub group_id: String,
    pub created_by: String,
    pub question: String,
    pub options: Vec<String>,
    pub is_anonymous: bool,
    pub closes_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vote {
    pub id: String,
    pub poll_id: String,
    pub user_id: String,
    pub option_index: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PollError {
    #[error("poll question must not be empty")]
    EmptyQuestion,
    #[error("a poll needs at least 2 options, got {0}")]
    TooFewOptions(usize),
    #[error("a poll allows at most 6 options, got {0}")]
    TooManyOptions(usize),
    #[error("poll duration must be a positive number of minutes, got {0}")]
    InvalidDuration(i64),
}

impl Poll {
    /// Builds a new poll from raw form input. Blank options are dropped before
    /// the option count is checked.
    pub fn new(
        group_id: String,
        created_by: String,
        question: &str,
        options: Vec<String>,
        is_anonymous: bool,
        duration_minutes: Option<i64>,
    ) -> Result<Self, PollError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PollError::EmptyQuestion);
        }

        let options: Vec<String> = options
            .iter()
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect();

        if options.len() < MIN_POLL_OPTIONS {
            return Err(PollError::TooFewOptions(options.len()));
        }
        if options.len() > MAX_POLL_OPTIONS {
            return Err(PollError::TooManyOptions(options.len()));
        }

        let now = Utc::now();
        let closes_at = duration_minutes
            .map(|mins| {
                if mins <= 0 {
                    return Err(PollError::InvalidDuration(mins));
                }
                chrono::Duration::try_minutes(mins)
                    .and_then(|duration| now.checked_add_signed(duration))
                    .ok_or(PollError::InvalidDuration(mins))
            })
            .transpose()?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            group_id,
            created_by,
            question: question.to_string(),
            options,
            is_anonymous,
            closes_at,
            created_at: now,
        })
    }

    pub fn is_closed_at(&self, now: DateTime<Utc>) -> bool {
        self.closes_at.is_some_and(|closes_at| closes_at <= now)
    }
}

impl Vote {
    pub fn new(poll_id: &str, user_id: &str, option_index: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            poll_id: poll_id.to_string(),
            user_id: user_id.to_string(),
            option_index,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventColor {
    Blue,
    Green,
    Purple,
    Orange,
    Pink,
    Red,
}

impl EventColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventColor::Blue => "blue",
            EventColor::Green => "green",
            EventColor::Purple => "purple",
            EventColor::Orange => "orange",
            EventColor::Pink => "pink",
            EventColor::Red => "red",
        }
    }
}

impl fmt::Display for EventColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventColor {
    type Err = TimetableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blue" => Ok(EventColor::Blue),
            "green" => Ok(EventColor::Green),
            "purple" => Ok(EventColor::Purple),
            "orange" => Ok(EventColor::Orange),
            "pink" => Ok(EventColor::Pink),
            "red" => Ok(EventColor::Red),
            other => Err(TimetableError::InvalidColor(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TimetableError {
    #[error("event title must not be empty")]
    EmptyTitle,
    #[error("day of week must be 0 (Sunday) to 6 (Saturday), got {0}")]
    InvalidDay(u8),
    #[error("unknown day of week: {0:?}")]
    InvalidDayName(String),
    #[error("invalid time of day: {0:?} (expected HH:MM)")]
    InvalidTime(String),
    #[error("event ends at {end} before it starts at {start}")]
    EndBeforeStart { start: NaiveTime, end: NaiveTime },
    #[error("alert must be 0, 5, 10, 15, 30 or 60 minutes, got {0}")]
    InvalidAlert(u32),
    #[error("unknown event color: {0:?}")]
    InvalidColor(String),
}

/// Editable fields of a timetable event, as submitted by the event form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: Option<String>,
    pub color: EventColor,
    pub alert_before: u32,
}

impl EventDraft {
    pub fn validate(&self) -> Result<(), TimetableError> {
        if self.title.trim().is_empty() {
            return Err(TimetableError::EmptyTitle);
        }
        if self.day_of_week > 6 {
            return Err(TimetableError::InvalidDay(self.day_of_week));
        }
        if self.end_time < self.start_time {
            return Err(TimetableError::EndBeforeStart {
                start: self.start_time,
                end: self.end_time,
            });
        }
        if !ALERT_CHOICES.contains(&self.alert_before) {
            return Err(TimetableError::InvalidAlert(self.alert_before));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimetableEvent {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: Option<String>,
    pub color: EventColor,
    pub alert_before: u32,
}

impl TimetableEvent {
    pub fn new(user_id: &str, draft: EventDraft) -> Result<Self, TimetableError> {
        draft.validate()?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: draft.title.trim().to_string(),
            description: non_blank(draft.description),
            day_of_week: draft.day_of_week,
            start_time: draft.start_time,
            end_time: draft.end_time,
            location: non_blank(draft.location),
            color: draft.color,
            alert_before: draft.alert_before,
        })
    }

    /// Replaces the editable fields, keeping id and owner.
    pub fn apply(&mut self, draft: EventDraft) -> Result<(), TimetableError> {
        draft.validate()?;
        self.title = draft.title.trim().to_string();
        self.description = non_blank(draft.description);
        self.day_of_week = draft.day_of_week;
        self.start_time = draft.start_time;
        self.end_time = draft.end_time;
        self.location = non_blank(draft.location);
        self.color = draft.color;
        self.alert_before = draft.alert_before;
        Ok(())
    }
}

/// Parses `HH:MM`, also accepting the `HH:MM:SS` form the store may hand back.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, TimetableError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| TimetableError::InvalidTime(s.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
