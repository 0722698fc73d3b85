use crate::models::{
    parse_time_of_day, Group, GroupMember, GroupRole, PersonalNote, Poll, StickyNote, TimetableEvent, Vote,
};
use chrono::{DateTime, Utc};
use log::{debug, info};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{migrate::MigrateDatabase, Row, Sqlite};

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("user {user_id} has already voted in poll {poll_id}")]
    DuplicateVote { poll_id: String, user_id: String },
    #[error("user {user_id} is already a member of group {group_id}")]
    DuplicateMember { group_id: String, user_id: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("Data integrity error: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str, max_connections: u32) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database {}", db_url);
            Sqlite::create_database(db_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(db_url)
            .await?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    /// Private in-memory database. A single connection that never expires, so
    /// the data lives as long as the pool.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS groups (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                kind TEXT NOT NULL,
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS group_members (
                id TEXT PRIMARY KEY,
                group_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                joined_at TEXT NOT NULL,
                UNIQUE (group_id, user_id),
                FOREIGN KEY (group_id) REFERENCES groups(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS polls (
                id TEXT PRIMARY KEY,
                group_id TEXT NOT NULL,
                created_by TEXT NOT NULL,
                question TEXT NOT NULL,
                options TEXT NOT NULL,
                is_anonymous BOOLEAN NOT NULL DEFAULT FALSE,
                closes_at TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (group_id) REFERENCES groups(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS poll_votes (
                id TEXT PRIMARY KEY,
                poll_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                option_index INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (poll_id, user_id),
                FOREIGN KEY (poll_id) REFERENCES polls(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS timetable_events (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                day_of_week INTEGER NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                location TEXT,
                color TEXT NOT NULL,
                alert_before INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sticky_notes (
                id TEXT PRIMARY KEY,
                group_id TEXT NOT NULL,
                created_by TEXT NOT NULL,
                content TEXT NOT NULL,
                tags TEXT NOT NULL,
                is_pinned BOOLEAN NOT NULL DEFAULT FALSE,
                deadline TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (group_id) REFERENCES groups(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS personal_notes (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                color TEXT NOT NULL,
                is_pinned BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        debug!("Database schema ready");
        Ok(())
    }

    pub async fn create_poll(&self, poll: &Poll) -> Result<()> {
        let options = serde_json::to_string(&poll.options)
            .map_err(|e| DatabaseError::Corrupt(format!("cannot encode poll options: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO polls (id, group_id, created_by, question, options, is_anonymous, closes_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&poll.id)
        .bind(&poll.group_id)
        .bind(&poll.created_by)
        .bind(&poll.question)
        .bind(options)
        .bind(poll.is_anonymous)
        .bind(poll.closes_at.map(|dt| dt.to_rfc3339()))
        .bind(poll.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_poll(&self, poll_id: &str) -> Result<Poll> {
        let row = sqlx::query(
            r#"
            SELECT id, group_id, created_by, question, options, is_anonymous, closes_at, created_at
            FROM polls
            WHERE id = ?
            "#,
        )
        .bind(poll_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("poll {}", poll_id)))?;

        poll_from_row(&row)
    }

    // A group's polls, newest first
    pub async fn list_group_polls(&self, group_id: &str) -> Result<Vec<Poll>> {
        sqlx::query(
            r#"
            SELECT id, group_id, created_by, question, options, is_anonymous, closes_at, created_at
            FROM polls
            WHERE group_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(poll_from_row)
        .collect()
    }

    // Get all votes for a poll, oldest first
    pub async fn get_poll_votes(&self, poll_id: &str) -> Result<Vec<Vote>> {
        sqlx::query(
            r#"
            SELECT id, poll_id, user_id, option_index, created_at
            FROM poll_votes
            WHERE poll_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(vote_from_row)
        .collect()
    }

    /// Inserts one vote. A second vote by the same user in the same poll is
    /// rejected by the table's uniqueness constraint.
    pub async fn insert_vote(&self, vote: &Vote) -> Result<()> {
        let option_index = i64::try_from(vote.option_index)
            .map_err(|_| DatabaseError::Corrupt(format!("option index {} out of range", vote.option_index)))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO poll_votes (id, poll_id, user_id, option_index, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&vote.id)
        .bind(&vote.poll_id)
        .bind(&vote.user_id)
        .bind(option_index)
        .bind(vote.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(DatabaseError::DuplicateVote {
                poll_id: vote.poll_id.clone(),
                user_id: vote.user_id.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn create_event(&self, event: &TimetableEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO timetable_events
                (id, user_id, title, description, day_of_week, start_time, end_time, location, color, alert_before, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.user_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(i64::from(event.day_of_week))
        .bind(event.start_time.format("%H:%M").to_string())
        .bind(event.end_time.format("%H:%M").to_string())
        .bind(&event.location)
        .bind(event.color.as_str())
        .bind(i64::from(event.alert_before))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_event(&self, event: &TimetableEvent) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE timetable_events
            SET title = ?, description = ?, day_of_week = ?, start_time = ?, end_time = ?,
                location = ?, color = ?, alert_before = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(i64::from(event.day_of_week))
        .bind(event.start_time.format("%H:%M").to_string())
        .bind(event.end_time.format("%H:%M").to_string())
        .bind(&event.location)
        .bind(event.color.as_str())
        .bind(i64::from(event.alert_before))
        .bind(Utc::now().to_rfc3339())
        .bind(&event.id)
        .bind(&event.user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("timetable event {}", event.id)));
        }
        Ok(())
    }

    pub async fn delete_event(&self, event_id: &str, user_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM timetable_events WHERE id = ? AND user_id = ?")
            .bind(event_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("timetable event {}", event_id)));
        }
        Ok(())
    }

    pub async fn get_event(&self, event_id: &str, user_id: &str) -> Result<TimetableEvent> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, title, description, day_of_week, start_time, end_time, location, color, alert_before
            FROM timetable_events
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("timetable event {}", event_id)))?;

        event_from_row(&row)
    }

    // A user's events in weekday and start-time order
    pub async fn list_events(&self, user_id: &str) -> Result<Vec<TimetableEvent>> {
        sqlx::query(
            r#"
            SELECT id, user_id, title, description, day_of_week, start_time, end_time, location, color, alert_before
            FROM timetable_events
            WHERE user_id = ?
            ORDER BY day_of_week, start_time
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(event_from_row)
        .collect()
    }

    /// Stores a new group together with its creator's admin membership.
    pub async fn create_group(&self, group: &Group) -> Result<GroupMember> {
        let creator = GroupMember::new(&group.id, &group.created_by, GroupRole::Admin);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO groups (id, name, description, kind, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&group.id)
        .bind(&group.name)
        .bind(&group.description)
        .bind(group.kind.as_str())
        .bind(&group.created_by)
        .bind(group.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO group_members (id, group_id, user_id, role, joined_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&creator.id)
        .bind(&creator.group_id)
        .bind(&creator.user_id)
        .bind(creator.role.as_str())
        .bind(creator.joined_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(creator)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Group> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, kind, created_by, created_at
            FROM groups
            WHERE id = ?
            "#,
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("group {}", group_id)))?;

        group_from_row(&row)
    }

    // Groups the user belongs to, newest first
    pub async fn list_user_groups(&self, user_id: &str) -> Result<Vec<Group>> {
        sqlx::query(
            r#"
            SELECT g.id, g.name, g.description, g.kind, g.created_by, g.created_at
            FROM groups g
            JOIN group_members m ON m.group_id = g.id
            WHERE m.user_id = ?
            ORDER BY g.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(group_from_row)
        .collect()
    }

    pub async fn add_member(&self, member: &GroupMember) -> Result<()> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO group_members (id, group_id, user_id, role, joined_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&member.id)
        .bind(&member.group_id)
        .bind(&member.user_id)
        .bind(member.role.as_str())
        .bind(member.joined_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(DatabaseError::DuplicateMember {
                group_id: member.group_id.clone(),
                user_id: member.user_id.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_membership(&self, group_id: &str, user_id: &str) -> Result<Option<GroupMember>> {
        sqlx::query(
            r#"
            SELECT id, group_id, user_id, role, joined_at
            FROM group_members
            WHERE group_id = ? AND user_id = ?
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(member_from_row)
        .transpose()
    }

    // Admins first, then by join time
    pub async fn list_members(&self, group_id: &str) -> Result<Vec<GroupMember>> {
        sqlx::query(
            r#"
            SELECT id, group_id, user_id, role, joined_at
            FROM group_members
            WHERE group_id = ?
            ORDER BY role, joined_at
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(member_from_row)
        .collect()
    }

    pub async fn create_sticky_note(&self, note: &StickyNote) -> Result<()> {
        let tags = serde_json::to_string(&note.tags)
            .map_err(|e| DatabaseError::Corrupt(format!("cannot encode note tags: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO sticky_notes (id, group_id, created_by, content, tags, is_pinned, deadline, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&note.id)
        .bind(&note.group_id)
        .bind(&note.created_by)
        .bind(&note.content)
        .bind(tags)
        .bind(note.is_pinned)
        .bind(note.deadline.map(|dt| dt.to_rfc3339()))
        .bind(note.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // Pinned notes first, then newest first
    pub async fn list_sticky_notes(&self, group_id: &str) -> Result<Vec<StickyNote>> {
        sqlx::query(
            r#"
            SELECT id, group_id, created_by, content, tags, is_pinned, deadline, created_at
            FROM sticky_notes
            WHERE group_id = ?
            ORDER BY is_pinned DESC, created_at DESC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(sticky_note_from_row)
        .collect()
    }

    pub async fn set_sticky_note_pinned(&self, group_id: &str, note_id: &str, pinned: bool) -> Result<()> {
        let result = sqlx::query("UPDATE sticky_notes SET is_pinned = ? WHERE id = ? AND group_id = ?")
            .bind(pinned)
            .bind(note_id)
            .bind(group_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("sticky note {}", note_id)));
        }
        Ok(())
    }

    pub async fn delete_sticky_note(&self, group_id: &str, note_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM sticky_notes WHERE id = ? AND group_id = ?")
            .bind(note_id)
            .bind(group_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("sticky note {}", note_id)));
        }
        Ok(())
    }

    pub async fn create_personal_note(&self, note: &PersonalNote) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO personal_notes (id, user_id, title, content, color, is_pinned, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&note.id)
        .bind(&note.user_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.color.as_str())
        .bind(note.is_pinned)
        .bind(note.created_at.to_rfc3339())
        .bind(note.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Writes back title, content, color and pin state of a user's own note.
    pub async fn update_personal_note(&self, note: &PersonalNote) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE personal_notes
            SET title = ?, content = ?, color = ?, is_pinned = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.color.as_str())
        .bind(note.is_pinned)
        .bind(note.updated_at.to_rfc3339())
        .bind(&note.id)
        .bind(&note.user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("personal note {}", note.id)));
        }
        Ok(())
    }

    pub async fn get_personal_note(&self, note_id: &str, user_id: &str) -> Result<PersonalNote> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, title, content, color, is_pinned, created_at, updated_at
            FROM personal_notes
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(note_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("personal note {}", note_id)))?;

        personal_note_from_row(&row)
    }

    // Pinned notes first, then newest first
    pub async fn list_personal_notes(&self, user_id: &str) -> Result<Vec<PersonalNote>> {
        sqlx::query(
            r#"
            SELECT id, user_id, title, content, color, is_pinned, created_at, updated_at
            FROM personal_notes
            WHERE user_id = ?
            ORDER BY is_pinned DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(personal_note_from_row)
        .collect()
    }

    pub async fn delete_personal_note(&self, note_id: &str, user_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM personal_notes WHERE id = ? AND user_id = ?")
            .bind(note_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("personal note {}", note_id)));
        }
        Ok(())
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Corrupt(format!("bad timestamp {:?}: {}", s, e)))
}

fn poll_from_row(row: &SqliteRow) -> Result<Poll> {
    let id: String = row.try_get("id")?;
    let options_json: String = row.try_get("options")?;
    let options: Vec<String> = serde_json::from_str(&options_json)
        .map_err(|e| DatabaseError::Corrupt(format!("poll {} options: {}", id, e)))?;

    let closes_at: Option<String> = row.try_get("closes_at")?;

    Ok(Poll {
        group_id: row.try_get("group_id")?,
        created_by: row.try_get("created_by")?,
        question: row.try_get("question")?,
        options,
        is_anonymous: row.try_get("is_anonymous")?,
        closes_at: closes_at.as_deref().map(parse_timestamp).transpose()?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        id,
    })
}

fn group_from_row(row: &SqliteRow) -> Result<Group> {
    let id: String = row.try_get("id")?;
    let kind: String = row.try_get("kind")?;
    Ok(Group {
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        kind: kind
            .parse()
            .map_err(|_| DatabaseError::Corrupt(format!("group {}: bad kind {:?}", id, kind)))?,
        created_by: row.try_get("created_by")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        id,
    })
}

fn member_from_row(row: &SqliteRow) -> Result<GroupMember> {
    let role: String = row.try_get("role")?;
    Ok(GroupMember {
        id: row.try_get("id")?,
        group_id: row.try_get("group_id")?,
        user_id: row.try_get("user_id")?,
        role: role
            .parse()
            .map_err(|_| DatabaseError::Corrupt(format!("bad member role {:?}", role)))?,
        joined_at: parse_timestamp(&row.try_get::<String, _>("joined_at")?)?,
    })
}

fn sticky_note_from_row(row: &SqliteRow) -> Result<StickyNote> {
    let id: String = row.try_get("id")?;
    let tags_json: String = row.try_get("tags")?;
    let tags: Vec<String> = serde_json::from_str(&tags_json)
        .map_err(|e| DatabaseError::Corrupt(format!("sticky note {} tags: {}", id, e)))?;
    let deadline: Option<String> = row.try_get("deadline")?;

    Ok(StickyNote {
        group_id: row.try_get("group_id")?,
        created_by: row.try_get("created_by")?,
        content: row.try_get("content")?,
        tags,
        is_pinned: row.try_get("is_pinned")?,
        deadline: deadline.as_deref().map(parse_timestamp).transpose()?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        id,
    })
}

fn personal_note_from_row(row: &SqliteRow) -> Result<PersonalNote> {
    let id: String = row.try_get("id")?;
    let color: String = row.try_get("color")?;
    Ok(PersonalNote {
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        color: color
            .parse()
            .map_err(|_| DatabaseError::Corrupt(format!("personal note {}: bad color {:?}", id, color)))?,
        is_pinned: row.try_get("is_pinned")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
        id,
    })
}

fn vote_from_row(row: &SqliteRow) -> Result<Vote> {
    let option_index: i64 = row.try_get("option_index")?;
    Ok(Vote {
        id: row.try_get("id")?,
        poll_id: row.try_get("poll_id")?,
        user_id: row.try_get("user_id")?,
        option_index: usize::try_from(option_index)
            .map_err(|_| DatabaseError::Corrupt(format!("negative option index {}", option_index)))?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
    })
}

fn event_from_row(row: &SqliteRow) -> Result<TimetableEvent> {
    let id: String = row.try_get("id")?;
    let corrupt = |what: &str| DatabaseError::Corrupt(format!("timetable event {}: bad {}", id, what));

    let day_of_week: i64 = row.try_get("day_of_week")?;
    let alert_before: i64 = row.try_get("alert_before")?;
    let start_time: String = row.try_get("start_time")?;
    let end_time: String = row.try_get("end_time")?;
    let color: String = row.try_get("color")?;

    Ok(TimetableEvent {
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        day_of_week: u8::try_from(day_of_week).map_err(|_| corrupt("day_of_week"))?,
        start_time: parse_time_of_day(&start_time).map_err(|_| corrupt("start_time"))?,
        end_time: parse_time_of_day(&end_time).map_err(|_| corrupt("end_time"))?,
        location: row.try_get("location")?,
        color: color.parse().map_err(|_| corrupt("color"))?,
        alert_before: u32::try_from(alert_before).map_err(|_| corrupt("alert_before"))?,
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventColor, EventDraft, GroupKind, NoteColor};
    use crate::timetable::tests::event;
    use chrono::NaiveTime;
    use pretty_assertions::assert_eq;

    async fn study_group(db: &Database) -> Group {
        let group = Group::new("Study crew", None, GroupKind::Class, "author").unwrap();
        db.create_group(&group).await.unwrap();
        group
    }

    fn sample_poll(group: &Group) -> Poll {
        Poll::new(
            group.id.clone(),
            "author".to_string(),
            "Study session day?",
            vec!["Monday".to_string(), "Thursday".to_string()],
            true,
            Some(60),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn poll_round_trip() {
        let db = Database::in_memory().await.unwrap();
        let poll = sample_poll(&study_group(&db).await);
        db.create_poll(&poll).await.unwrap();

        let loaded = db.get_poll(&poll.id).await.unwrap();
        assert_eq!(loaded.options, poll.options);
        assert_eq!(loaded.question, poll.question);
        assert!(loaded.is_anonymous);
        assert_eq!(
            loaded.closes_at.map(|t| t.timestamp_micros()),
            poll.closes_at.map(|t| t.timestamp_micros())
        );
    }

    #[tokio::test]
    async fn missing_poll_is_not_found() {
        let db = Database::in_memory().await.unwrap();
        assert!(matches!(db.get_poll("nope").await, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn duplicate_vote_is_rejected_by_store() {
        let db = Database::in_memory().await.unwrap();
        let poll = sample_poll(&study_group(&db).await);
        db.create_poll(&poll).await.unwrap();

        db.insert_vote(&Vote::new(&poll.id, "alice", 0)).await.unwrap();
        let err = db.insert_vote(&Vote::new(&poll.id, "alice", 1)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateVote { .. }));

        db.insert_vote(&Vote::new(&poll.id, "bob", 1)).await.unwrap();
        let votes = db.get_poll_votes(&poll.id).await.unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes.iter().filter(|v| v.user_id == "alice").count(), 1);
    }

    #[tokio::test]
    async fn timetable_crud() {
        let db = Database::in_memory().await.unwrap();
        let late = event("Seminar", 2, (14, 0), 30);
        let early = event("Lecture", 2, (9, 0), 15);
        db.create_event(&late).await.unwrap();
        db.create_event(&early).await.unwrap();

        let listed = db.list_events("student").await.unwrap();
        let titles: Vec<&str> = listed.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Lecture", "Seminar"]);
        assert_eq!(listed[0], early);

        let mut updated = early.clone();
        updated
            .apply(EventDraft {
                title: "Lecture (moved)".to_string(),
                description: Some("bring laptop".to_string()),
                day_of_week: 4,
                start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
                location: None,
                color: EventColor::Orange,
                alert_before: 60,
            })
            .unwrap();
        db.update_event(&updated).await.unwrap();
        assert_eq!(db.get_event(&early.id, "student").await.unwrap(), updated);

        assert!(matches!(
            db.delete_event(&early.id, "someone-else").await,
            Err(DatabaseError::NotFound(_))
        ));
        db.delete_event(&early.id, "student").await.unwrap();
        assert_eq!(db.list_events("student").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn poll_requires_existing_group() {
        let db = Database::in_memory().await.unwrap();
        let mut poll = sample_poll(&study_group(&db).await);
        poll.group_id = "no-such-group".to_string();
        assert!(matches!(db.create_poll(&poll).await, Err(DatabaseError::Sqlx(_))));
    }

    #[tokio::test]
    async fn group_creator_is_admin_member() {
        let db = Database::in_memory().await.unwrap();
        let group = study_group(&db).await;

        let members = db.list_members(&group.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, "author");
        assert_eq!(members[0].role, GroupRole::Admin);

        db.add_member(&GroupMember::new(&group.id, "bob", GroupRole::Member)).await.unwrap();
        let err = db
            .add_member(&GroupMember::new(&group.id, "bob", GroupRole::Member))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateMember { .. }));

        assert_eq!(db.get_group(&group.id).await.unwrap(), group);
        assert_eq!(db.list_user_groups("bob").await.unwrap(), vec![group.clone()]);
        assert!(db.list_user_groups("carol").await.unwrap().is_empty());
        assert!(db.get_membership(&group.id, "carol").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sticky_notes_list_pinned_first() {
        let db = Database::in_memory().await.unwrap();
        let group = study_group(&db).await;
        let plain = StickyNote::new(&group.id, "author", "Bring calculators", &[], false, None).unwrap();
        let tagged = StickyNote::new(
            &group.id,
            "author",
            "Essay due",
            &["assignment".to_string()],
            false,
            Some(Utc::now()),
        )
        .unwrap();
        db.create_sticky_note(&plain).await.unwrap();
        db.create_sticky_note(&tagged).await.unwrap();

        db.set_sticky_note_pinned(&group.id, &plain.id, true).await.unwrap();
        let notes = db.list_sticky_notes(&group.id).await.unwrap();
        assert_eq!(notes[0].id, plain.id);
        assert!(notes[0].is_pinned);
        assert_eq!(notes[1].tags, vec!["assignment".to_string()]);
        assert!(notes[1].deadline.is_some());

        assert!(matches!(
            db.delete_sticky_note("other-group", &plain.id).await,
            Err(DatabaseError::NotFound(_))
        ));
        db.delete_sticky_note(&group.id, &plain.id).await.unwrap();
        assert_eq!(db.list_sticky_notes(&group.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn personal_notes_are_scoped_to_owner() {
        let db = Database::in_memory().await.unwrap();
        let mut note = PersonalNote::new("student", "Reading list", "Knuth vol 1", NoteColor::Green).unwrap();
        db.create_personal_note(&note).await.unwrap();

        note.edit("Reading list", "Knuth vol 1 and 2", NoteColor::Pink).unwrap();
        note.is_pinned = true;
        db.update_personal_note(&note).await.unwrap();

        let loaded = db.get_personal_note(&note.id, "student").await.unwrap();
        assert_eq!(loaded.content, "Knuth vol 1 and 2");
        assert_eq!(loaded.color, NoteColor::Pink);
        assert!(loaded.is_pinned);

        assert!(db.list_personal_notes("intruder").await.unwrap().is_empty());
        assert!(matches!(
            db.delete_personal_note(&note.id, "intruder").await,
            Err(DatabaseError::NotFound(_))
        ));
        db.delete_personal_note(&note.id, "student").await.unwrap();
        assert!(db.list_personal_notes("student").await.unwrap().is_empty());
    }
}
