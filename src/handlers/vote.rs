use crate::db::{Database, DatabaseError};
use crate::handlers::group::membership;
use crate::models::Vote;
use crate::voting::{submit_vote, VoteRejected};
use chrono::{DateTime, Utc};
use log::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error(transparent)]
    Rejected(#[from] VoteRejected),
    #[error("poll {0} is closed")]
    PollClosed(String),
    #[error("user {user_id} is not a member of group {group_id}")]
    NotMember { group_id: String, user_id: String },
    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for VoteError {
    // The store is the final authority on one-vote-per-user.
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::DuplicateVote { .. } => VoteError::Rejected(VoteRejected::AlreadyVoted),
            other => VoteError::Database(other),
        }
    }
}

/// Records `viewer_id`'s vote for `option_index` in a poll.
pub async fn cast_vote(
    database: &Database,
    poll_id: &str,
    viewer_id: &str,
    option_index: usize,
    now: DateTime<Utc>,
) -> Result<Vote, VoteError> {
    let poll = database.get_poll(poll_id).await?;
    if membership(database, &poll.group_id, viewer_id).await?.is_none() {
        return Err(VoteError::NotMember {
            group_id: poll.group_id,
            user_id: viewer_id.to_string(),
        });
    }
    if poll.is_closed_at(now) {
        warn!("Vote by {} on closed poll {}", viewer_id, poll_id);
        return Err(VoteError::PollClosed(poll_id.to_string()));
    }

    let votes = database.get_poll_votes(poll_id).await?;
    let vote = match submit_vote(&poll, &votes, viewer_id, option_index) {
        Ok(vote) => vote,
        Err(rejected) => {
            warn!("Vote by {} on poll {} rejected: {}", viewer_id, poll_id, rejected);
            return Err(rejected.into());
        }
    };

    persist_vote(database, &vote).await?;
    info!("User {} voted for option {} in poll {}", viewer_id, option_index, poll_id);
    Ok(vote)
}

/// Writes a vote built by the engine. A uniqueness failure from a concurrent
/// submission surfaces as `AlreadyVoted`.
pub async fn persist_vote(database: &Database, vote: &Vote) -> Result<(), VoteError> {
    database.insert_vote(vote).await.map_err(|e| {
        let e = VoteError::from(e);
        if matches!(e, VoteError::Rejected(_)) {
            warn!("Store rejected duplicate vote by {} on poll {}", vote.user_id, vote.poll_id);
        }
        e
    })
}
