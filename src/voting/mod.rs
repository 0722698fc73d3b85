pub mod results;

use crate::models::{Poll, Vote};
use serde::Serialize;

/// Per-option vote counts for one poll, recomputed on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub counts: Vec<usize>,
    pub total: usize,
    /// Whole percentages, rounded half up. All zero when nobody voted.
    pub percentages: Vec<u8>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum VoteRejected {
    #[error("you have already voted in this poll")]
    AlreadyVoted,
    #[error("option {index} does not exist (poll has {option_count} options)")]
    InvalidOption { index: usize, option_count: usize },
}

pub fn tally(options: &[String], votes: &[Vote]) -> Tally {
    let mut counts = vec![0usize; options.len()];
    for vote in votes {
        if let Some(count) = counts.get_mut(vote.option_index) {
            *count += 1;
        }
    }

    let total = votes.len();
    let percentages = counts
        .iter()
        .map(|&count| percentage(count, total))
        .collect();

    Tally {
        counts,
        total,
        percentages,
    }
}

// Integer round-half-up of 100 * count / total.
fn percentage(count: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let rounded = (200 * count + total) / (2 * total);
    rounded.min(100) as u8
}

pub fn viewer_vote<'a>(votes: &'a [Vote], viewer_id: &str) -> Option<&'a Vote> {
    votes.iter().find(|vote| vote.user_id == viewer_id)
}

pub fn can_vote(votes: &[Vote], viewer_id: &str) -> bool {
    viewer_vote(votes, viewer_id).is_none()
}

/// Builds the viewer's vote for immediate display. This is an optimistic
/// check; the store's uniqueness constraint has the final word.
pub fn submit_vote(
    poll: &Poll,
    votes: &[Vote],
    viewer_id: &str,
    option_index: usize,
) -> Result<Vote, VoteRejected> {
    if !can_vote(votes, viewer_id) {
        return Err(VoteRejected::AlreadyVoted);
    }
    if option_index >= poll.options.len() {
        return Err(VoteRejected::InvalidOption {
            index: option_index,
            option_count: poll.options.len(),
        });
    }
    Ok(Vote::new(&poll.id, viewer_id, option_index))
}

/// Who picked `option_index`. Anonymous polls never reveal voters.
pub fn voters<'a>(poll: &Poll, votes: &'a [Vote], option_index: usize) -> Option<Vec<&'a str>> {
    if poll.is_anonymous {
        return None;
    }
    Some(
        votes
            .iter()
            .filter(|vote| vote.option_index == option_index)
            .map(|vote| vote.user_id.as_str())
            .collect(),
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    pub(crate) fn poll(options: &[&str]) -> Poll {
        Poll {
            id: "poll-1".to_string(),
            group_id: "group-1".to_string(),
            created_by: "author".to_string(),
            question: "Where do we meet?".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            is_anonymous: false,
            closes_at: None,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn vote(user_id: &str, option_index: usize) -> Vote {
        Vote::new("poll-1", user_id, option_index)
    }

    #[test]
    fn tally_rounds_half_up() {
        let poll = poll(&["A", "B"]);
        let votes = vec![vote("user1", 0), vote("user2", 0), vote("user3", 1)];
        let result = tally(&poll.options, &votes);
        assert_eq!(
            result,
            Tally {
                counts: vec![2, 1],
                total: 3,
                percentages: vec![67, 33],
            }
        );

        let votes: Vec<Vote> = (0..8).map(|i| vote(&format!("u{i}"), usize::from(i == 0))).collect();
        let result = tally(&["A".to_string(), "B".to_string()], &votes);
        assert_eq!(result.percentages, vec![88, 13]);
    }

    #[test]
    fn tally_without_votes_is_all_zero() {
        let poll = poll(&["A", "B", "C"]);
        let result = tally(&poll.options, &[]);
        assert_eq!(result.counts, vec![0, 0, 0]);
        assert_eq!(result.total, 0);
        assert_eq!(result.percentages, vec![0, 0, 0]);
    }

    #[test]
    fn tally_is_pure() {
        let poll = poll(&["A", "B", "C"]);
        let votes = vec![vote("a", 2), vote("b", 1), vote("c", 2)];
        assert_eq!(tally(&poll.options, &votes), tally(&poll.options, &votes));
    }

    #[test]
    fn viewer_vote_lookup() {
        let votes = vec![vote("alice", 1), vote("bob", 0)];
        assert_eq!(viewer_vote(&votes, "bob").map(|v| v.option_index), Some(0));
        assert!(viewer_vote(&votes, "carol").is_none());
        assert!(!can_vote(&votes, "alice"));
        assert!(can_vote(&votes, "carol"));
    }

    #[test]
    fn second_vote_is_rejected_without_mutation() {
        let poll = poll(&["A", "B", "C"]);
        let votes = vec![vote("alice", 1)];
        let before = votes.clone();
        for option in 0..=3 {
            assert_eq!(
                submit_vote(&poll, &votes, "alice", option),
                Err(VoteRejected::AlreadyVoted)
            );
        }
        assert_eq!(votes, before);
    }

    #[test]
    fn option_one_past_the_end_is_invalid() {
        for count in 2..=6 {
            let labels: Vec<String> = (0..count).map(|i| format!("option {i}")).collect();
            let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
            let poll = poll(&labels);
            assert_eq!(
                submit_vote(&poll, &[], "alice", count),
                Err(VoteRejected::InvalidOption {
                    index: count,
                    option_count: count,
                })
            );
        }
    }

    #[test]
    fn accepted_vote_belongs_to_viewer() {
        let poll = poll(&["A", "B"]);
        let votes = vec![vote("bob", 0)];
        let new_vote = submit_vote(&poll, &votes, "alice", 1).unwrap();
        assert_eq!(new_vote.poll_id, "poll-1");
        assert_eq!(new_vote.user_id, "alice");
        assert_eq!(new_vote.option_index, 1);
        assert_eq!(votes.len(), 1);
    }

    #[test]
    fn anonymous_polls_hide_voters() {
        let mut poll = poll(&["A", "B"]);
        let votes = vec![vote("alice", 1), vote("bob", 1), vote("carol", 0)];
        assert_eq!(voters(&poll, &votes, 1), Some(vec!["alice", "bob"]));
        poll.is_anonymous = true;
        assert_eq!(voters(&poll, &votes, 1), None);
    }
}
