use crate::db::{self, Database};
use crate::handlers::group::membership;
use crate::models::{Poll, PollError};
use crate::voting::results::{calculate_results, PollResults};
use log::info;

#[derive(Debug, thiserror::Error)]
pub enum CreatePollError {
    #[error(transparent)]
    Invalid(#[from] PollError),
    #[error("user {user_id} is not a member of group {group_id}")]
    NotMember { group_id: String, user_id: String },
    #[error(transparent)]
    Database(#[from] db::DatabaseError),
}

pub struct NewPoll {
    pub group_id: String,
    pub created_by: String,
    pub question: String,
    pub options: Vec<String>,
    pub is_anonymous: bool,
    pub closes_in_minutes: Option<i64>,
}

/// Validates and stores a poll. Only members of the group may create one.
pub async fn create_poll(database: &Database, request: NewPoll) -> Result<Poll, CreatePollError> {
    if membership(database, &request.group_id, &request.created_by).await?.is_none() {
        return Err(CreatePollError::NotMember {
            group_id: request.group_id,
            user_id: request.created_by,
        });
    }
    let poll = Poll::new(
        request.group_id,
        request.created_by,
        &request.question,
        request.options,
        request.is_anonymous,
        request.closes_in_minutes,
    )?;
    database.create_poll(&poll).await?;
    info!("Created poll {} in group {} with {} options", poll.id, poll.group_id, poll.options.len());
    Ok(poll)
}

/// Loads a poll and its votes and tallies them for `viewer_id`.
pub async fn poll_results(
    database: &Database,
    poll_id: &str,
    viewer_id: Option<&str>,
) -> db::Result<(Poll, PollResults)> {
    let poll = database.get_poll(poll_id).await?;
    let votes = database.get_poll_votes(poll_id).await?;
    let results = calculate_results(&poll, &votes, viewer_id);
    Ok((poll, results))
}

/// Polls of a group, newest first, each tallied for `viewer_id`.
pub async fn group_polls(
    database: &Database,
    group_id: &str,
    viewer_id: &str,
) -> db::Result<Option<Vec<(Poll, PollResults)>>> {
    if membership(database, group_id, viewer_id).await?.is_none() {
        return Ok(None);
    }

    let mut listed = Vec::new();
    for poll in database.list_group_polls(group_id).await? {
        let votes = database.get_poll_votes(&poll.id).await?;
        let results = calculate_results(&poll, &votes, Some(viewer_id));
        listed.push((poll, results));
    }
    Ok(Some(listed))
}
