use crate::models::{Poll, Vote};
use crate::voting::{tally, viewer_vote, voters, Tally};
use serde::Serialize;

// Generic structure for poll results
#[derive(Debug, Serialize)]
pub struct PollResults {
    pub tally: Tally,
    pub rows: Vec<VoteCount>, // One row per option, in poll order
    pub summary: String,      // Detailed results as formatted text
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteCount {
    pub option_index: usize,
    pub option_text: String,
    pub count: usize,
    pub percentage: u8,
    pub is_viewer_choice: bool,
    pub voters: Option<Vec<String>>, // None for anonymous polls
}

pub fn calculate_results(poll: &Poll, votes: &[Vote], viewer_id: Option<&str>) -> PollResults {
    let tally = tally(&poll.options, votes);
    let viewer_choice = viewer_id
        .and_then(|viewer| viewer_vote(votes, viewer))
        .map(|vote| vote.option_index);

    let rows: Vec<VoteCount> = poll
        .options
        .iter()
        .enumerate()
        .map(|(i, text)| VoteCount {
            option_index: i,
            option_text: text.clone(),
            count: tally.counts[i],
            percentage: tally.percentages[i],
            is_viewer_choice: viewer_choice == Some(i),
            voters: voters(poll, votes, i).map(|ids| ids.into_iter().map(str::to_string).collect()),
        })
        .collect();

    let mut summary = format!("{}\n", poll.question);
    if poll.is_anonymous {
        summary.push_str("(anonymous)\n");
    }
    summary.push('\n');

    for row in &rows {
        let marker = if row.is_viewer_choice { " ✓" } else { "" };
        summary.push_str(&format!(
            "{}: {} ({}%){}\n",
            row.option_text,
            plural_votes(row.count),
            row.percentage,
            marker
        ));
    }

    summary.push_str(&format!("\n{} total", plural_votes(tally.total)));

    PollResults {
        tally,
        rows,
        summary,
    }
}

fn plural_votes(count: usize) -> String {
    if count == 1 {
        "1 vote".to_string()
    } else {
        format!("{} votes", count)
    }
}
