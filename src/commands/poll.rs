use crate::commands::{print_json, CommandResult};
use crate::db::Database;
use crate::handlers::poll::{create_poll, group_polls, poll_results, NewPoll};
use crate::handlers::vote::cast_vote;
use chrono::Utc;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum PollCommand {
    /// Create a poll in a group
    Create {
        /// Group the poll belongs to
        #[arg(long)]
        group: String,
        /// User creating the poll
        #[arg(long)]
        author: String,
        /// The poll question
        #[arg(long)]
        question: String,
        /// An answer option; repeat 2 to 6 times
        #[arg(long = "option", required = true)]
        options: Vec<String>,
        /// Hide who voted for what
        #[arg(long)]
        anonymous: bool,
        /// Close the poll after this many minutes
        #[arg(long)]
        closes_in: Option<i64>,
    },
    /// Vote in a poll
    Vote {
        poll_id: String,
        /// User casting the vote
        #[arg(long)]
        viewer: String,
        /// Zero-based option index
        #[arg(long)]
        option: usize,
    },
    /// Show a poll's results
    Results {
        poll_id: String,
        /// Mark this user's choice
        #[arg(long)]
        viewer: Option<String>,
        /// List who voted for each option (not for anonymous polls)
        #[arg(long)]
        show_voters: bool,
        /// Print the poll and its results as JSON
        #[arg(long)]
        json: bool,
    },
    /// List a group's polls, newest first
    List {
        #[arg(long)]
        group: String,
        /// Member viewing the polls
        #[arg(long)]
        viewer: String,
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(database: &Database, command: PollCommand) -> CommandResult {
    match command {
        PollCommand::Create {
            group,
            author,
            question,
            options,
            anonymous,
            closes_in,
        } => {
            let poll = create_poll(
                database,
                NewPoll {
                    group_id: group,
                    created_by: author,
                    question,
                    options,
                    is_anonymous: anonymous,
                    closes_in_minutes: closes_in,
                },
            )
            .await?;
            println!("Created poll {}", poll.id);
            for (i, option) in poll.options.iter().enumerate() {
                println!("  [{}] {}", i, option);
            }
        }
        PollCommand::Vote { poll_id, viewer, option } => {
            cast_vote(database, &poll_id, &viewer, option, Utc::now()).await?;
            let (_, results) = poll_results(database, &poll_id, Some(&viewer)).await?;
            println!("{}", results.summary);
        }
        PollCommand::Results {
            poll_id,
            viewer,
            show_voters,
            json,
        } => {
            let (poll, results) = poll_results(database, &poll_id, viewer.as_deref()).await?;
            if json {
                return print_json(&serde_json::json!({ "poll": poll, "results": results }));
            }
            println!("{}", results.summary);
            if show_voters {
                println!();
                for row in &results.rows {
                    match &row.voters {
                        Some(voters) => println!("{}: {}", row.option_text, voters.join(", ")),
                        None => println!("{}: (anonymous)", row.option_text),
                    }
                }
            }
            if poll.is_closed_at(Utc::now()) {
                println!("(closed)");
            }
        }
        PollCommand::List { group, viewer, json } => {
            let Some(polls) = group_polls(database, &group, &viewer).await? else {
                return Err(format!("{} is not a member of group {}", viewer, group).into());
            };
            if json {
                let listed: Vec<_> = polls
                    .iter()
                    .map(|(poll, results)| serde_json::json!({ "poll": poll, "results": results }))
                    .collect();
                return print_json(&listed);
            }
            if polls.is_empty() {
                println!("No polls yet.");
            }
            let now = Utc::now();
            for (poll, results) in &polls {
                let status = if poll.is_closed_at(now) { " (closed)" } else { "" };
                println!("[{}]{}\n{}\n", poll.id, status, results.summary);
            }
        }
    }
    Ok(())
}
