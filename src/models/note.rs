use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Tags offered by the sticky-note form.
pub const NOTE_TAGS: [&str; 7] = ["exam", "assignment", "deadline", "project", "lecture", "meeting", "important"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NoteError {
    #[error("note content must not be empty")]
    EmptyContent,
    #[error("note title must not be empty")]
    EmptyTitle,
    #[error("unknown tag {0:?}")]
    UnknownTag(String),
    #[error("unknown note color {0:?}")]
    InvalidColor(String),
}

/// A note posted to a group board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StickyNote {
    pub id: String,
    pub group_id: String,
    pub created_by: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl StickyNote {
    /// Tags are lowercased, de-duplicated and must come from [`NOTE_TAGS`].
    pub fn new(
        group_id: &str,
        created_by: &str,
        content: &str,
        tags: &[String],
        is_pinned: bool,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Self, NoteError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(NoteError::EmptyContent);
        }

        let mut checked: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            let tag = tag.trim().to_ascii_lowercase();
            if !NOTE_TAGS.contains(&tag.as_str()) {
                return Err(NoteError::UnknownTag(tag));
            }
            if !checked.contains(&tag) {
                checked.push(tag);
            }
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            created_by: created_by.to_string(),
            content: content.to_string(),
            tags: checked,
            is_pinned,
            deadline,
            created_at: Utc::now(),
        })
    }

    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| deadline < now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    Yellow,
    Blue,
    Green,
    Pink,
    Purple,
    Orange,
}

impl NoteColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteColor::Yellow => "yellow",
            NoteColor::Blue => "blue",
            NoteColor::Green => "green",
            NoteColor::Pink => "pink",
            NoteColor::Purple => "purple",
            NoteColor::Orange => "orange",
        }
    }
}

impl fmt::Display for NoteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteColor {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yellow" => Ok(NoteColor::Yellow),
            "blue" => Ok(NoteColor::Blue),
            "green" => Ok(NoteColor::Green),
            "pink" => Ok(NoteColor::Pink),
            "purple" => Ok(NoteColor::Purple),
            "orange" => Ok(NoteColor::Orange),
            other => Err(NoteError::InvalidColor(other.to_string())),
        }
    }
}

/// A note on a user's own pad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonalNote {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub color: NoteColor,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PersonalNote {
    pub fn new(user_id: &str, title: &str, content: &str, color: NoteColor) -> Result<Self, NoteError> {
        let (title, content) = personal_fields(title, content)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title,
            content,
            color,
            is_pinned: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces title, content and color. Pin state and id are kept.
    pub fn edit(&mut self, title: &str, content: &str, color: NoteColor) -> Result<(), NoteError> {
        let (title, content) = personal_fields(title, content)?;
        self.title = title;
        self.content = content;
        self.color = color;
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn personal_fields(title: &str, content: &str) -> Result<(String, String), NoteError> {
    let (title, content) = (title.trim(), content.trim());
    if title.is_empty() {
        return Err(NoteError::EmptyTitle);
    }
    if content.is_empty() {
        return Err(NoteError::EmptyContent);
    }
    Ok((title.to_string(), content.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sticky_note_tags_are_checked() {
        let note = StickyNote::new("g1", "u1", " Midterm room changed ", &tags(&["Exam", "exam", "lecture"]), true, None)
            .unwrap();
        assert_eq!(note.content, "Midterm room changed");
        assert_eq!(note.tags, tags(&["exam", "lecture"]));

        let err = StickyNote::new("g1", "u1", "x", &tags(&["gossip"]), false, None).unwrap_err();
        assert_eq!(err, NoteError::UnknownTag("gossip".to_string()));
        assert_eq!(
            StickyNote::new("g1", "u1", "  ", &[], false, None).unwrap_err(),
            NoteError::EmptyContent
        );
    }

    #[test]
    fn sticky_note_deadline() {
        let now = Utc::now();
        let note = StickyNote::new("g1", "u1", "Lab report", &[], false, Some(now)).unwrap();
        assert!(!note.is_overdue_at(now));
        assert!(note.is_overdue_at(now + chrono::Duration::seconds(1)));
    }

    #[test]
    fn personal_note_needs_title_and_content() {
        assert_eq!(
            PersonalNote::new("u1", " ", "body", NoteColor::Yellow).unwrap_err(),
            NoteError::EmptyTitle
        );
        let mut note = PersonalNote::new("u1", "Groceries", "milk", NoteColor::Yellow).unwrap();
        assert_eq!(note.edit("Groceries", "", NoteColor::Blue).unwrap_err(), NoteError::EmptyContent);
        note.edit(" Shopping ", "milk, eggs", NoteColor::Blue).unwrap();
        assert_eq!(note.title, "Shopping");
        assert_eq!(note.color, NoteColor::Blue);
    }
}
