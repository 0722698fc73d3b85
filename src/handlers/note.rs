use crate::db::{Database, DatabaseError};
use crate::handlers::group::membership;
use crate::models::{NoteColor, NoteError, PersonalNote, StickyNote};
use chrono::{DateTime, Utc};
use log::info;

#[derive(Debug, thiserror::Error)]
pub enum NoteActionError {
    #[error(transparent)]
    Invalid(#[from] NoteError),
    #[error("user {user_id} is not a member of group {group_id}")]
    NotMember { group_id: String, user_id: String },
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub struct NewStickyNote {
    pub group_id: String,
    pub author: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub deadline: Option<DateTime<Utc>>,
}

async fn require_member(database: &Database, group_id: &str, user_id: &str) -> Result<(), NoteActionError> {
    match membership(database, group_id, user_id).await? {
        Some(_) => Ok(()),
        None => Err(NoteActionError::NotMember {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
        }),
    }
}

pub async fn post_sticky_note(database: &Database, request: NewStickyNote) -> Result<StickyNote, NoteActionError> {
    require_member(database, &request.group_id, &request.author).await?;
    let note = StickyNote::new(
        &request.group_id,
        &request.author,
        &request.content,
        &request.tags,
        request.is_pinned,
        request.deadline,
    )?;
    database.create_sticky_note(&note).await?;
    info!("User {} posted note {} to group {}", note.created_by, note.id, note.group_id);
    Ok(note)
}

pub async fn group_notes(database: &Database, group_id: &str, user_id: &str) -> Result<Vec<StickyNote>, NoteActionError> {
    require_member(database, group_id, user_id).await?;
    Ok(database.list_sticky_notes(group_id).await?)
}

pub async fn pin_sticky_note(
    database: &Database,
    group_id: &str,
    note_id: &str,
    user_id: &str,
    pinned: bool,
) -> Result<(), NoteActionError> {
    require_member(database, group_id, user_id).await?;
    database.set_sticky_note_pinned(group_id, note_id, pinned).await?;
    Ok(())
}

pub async fn remove_sticky_note(
    database: &Database,
    group_id: &str,
    note_id: &str,
    user_id: &str,
) -> Result<(), NoteActionError> {
    require_member(database, group_id, user_id).await?;
    database.delete_sticky_note(group_id, note_id).await?;
    info!("User {} removed note {} from group {}", user_id, note_id, group_id);
    Ok(())
}

pub async fn add_personal_note(
    database: &Database,
    user_id: &str,
    title: &str,
    content: &str,
    color: NoteColor,
) -> Result<PersonalNote, NoteActionError> {
    let note = PersonalNote::new(user_id, title, content, color)?;
    database.create_personal_note(&note).await?;
    Ok(note)
}

pub async fn edit_personal_note(
    database: &Database,
    user_id: &str,
    note_id: &str,
    title: &str,
    content: &str,
    color: NoteColor,
) -> Result<PersonalNote, NoteActionError> {
    let mut note = database.get_personal_note(note_id, user_id).await?;
    note.edit(title, content, color)?;
    database.update_personal_note(&note).await?;
    Ok(note)
}

/// Flips the pin and returns the new state.
pub async fn toggle_personal_pin(database: &Database, user_id: &str, note_id: &str) -> Result<bool, NoteActionError> {
    let mut note = database.get_personal_note(note_id, user_id).await?;
    note.is_pinned = !note.is_pinned;
    database.update_personal_note(&note).await?;
    Ok(note.is_pinned)
}
