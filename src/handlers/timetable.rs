use crate::db::{self, Database};
use crate::models::{EventDraft, TimetableError, TimetableEvent};
use log::info;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error(transparent)]
    Invalid(#[from] TimetableError),
    #[error(transparent)]
    Database(#[from] db::DatabaseError),
}

pub async fn add_event(database: &Database, user_id: &str, draft: EventDraft) -> Result<TimetableEvent, EventError> {
    let event = TimetableEvent::new(user_id, draft)?;
    database.create_event(&event).await?;
    info!("Added timetable event {} for {}", event.id, user_id);
    Ok(event)
}

pub async fn edit_event(
    database: &Database,
    user_id: &str,
    event_id: &str,
    draft: EventDraft,
) -> Result<TimetableEvent, EventError> {
    let mut event = database.get_event(event_id, user_id).await?;
    event.apply(draft)?;
    database.update_event(&event).await?;
    info!("Updated timetable event {} for {}", event.id, user_id);
    Ok(event)
}

pub async fn remove_event(database: &Database, user_id: &str, event_id: &str) -> Result<(), EventError> {
    database.delete_event(event_id, user_id).await?;
    info!("Removed timetable event {} for {}", event_id, user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventColor;
    use chrono::NaiveTime;

    fn draft(title: &str) -> EventDraft {
        EventDraft {
            title: title.to_string(),
            description: None,
            day_of_week: 3,
            start_time: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            location: Some("Lab 2".to_string()),
            color: EventColor::Purple,
            alert_before: 10,
        }
    }

    #[tokio::test]
    async fn add_edit_remove() {
        let db = Database::in_memory().await.unwrap();
        let event = add_event(&db, "student", draft("Biology")).await.unwrap();

        let edited = edit_event(&db, "student", &event.id, draft("Biology lab")).await.unwrap();
        assert_eq!(edited.id, event.id);
        assert_eq!(db.list_events("student").await.unwrap()[0].title, "Biology lab");

        remove_event(&db, "student", &event.id).await.unwrap();
        assert!(db.list_events("student").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_edit_leaves_event_untouched() {
        let db = Database::in_memory().await.unwrap();
        let event = add_event(&db, "student", draft("Biology")).await.unwrap();
        let result = edit_event(&db, "student", &event.id, draft("   ")).await;
        assert!(matches!(result, Err(EventError::Invalid(TimetableError::EmptyTitle))));
        assert_eq!(db.get_event(&event.id, "student").await.unwrap().title, "Biology");
    }

    #[tokio::test]
    async fn other_users_cannot_edit() {
        let db = Database::in_memory().await.unwrap();
        let event = add_event(&db, "student", draft("Biology")).await.unwrap();
        let result = edit_event(&db, "intruder", &event.id, draft("Hacked")).await;
        assert!(matches!(result, Err(EventError::Database(db::DatabaseError::NotFound(_)))));
    }
}
