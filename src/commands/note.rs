use crate::commands::{print_json, CommandResult};
use crate::db::Database;
use crate::handlers::note::{
    add_personal_note, edit_personal_note, group_notes, pin_sticky_note, post_sticky_note, remove_sticky_note,
    toggle_personal_pin, NewStickyNote,
};
use crate::models::NoteColor;
use chrono::{DateTime, Utc};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum NoteCommand {
    /// Post a sticky note to a group board
    Post {
        #[arg(long)]
        group: String,
        #[arg(long)]
        user: String,
        content: String,
        /// exam, assignment, deadline, project, lecture, meeting or important
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        pinned: bool,
        /// RFC 3339 timestamp, e.g. 2024-05-01T17:00:00Z
        #[arg(long)]
        deadline: Option<DateTime<Utc>>,
    },
    /// Show a group board, pinned notes first
    Board {
        #[arg(long)]
        group: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        json: bool,
    },
    /// Pin or unpin a sticky note
    Pin {
        note_id: String,
        #[arg(long)]
        group: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        off: bool,
    },
    /// Delete a sticky note
    Remove {
        note_id: String,
        #[arg(long)]
        group: String,
        #[arg(long)]
        user: String,
    },
    /// Add a note to your personal pad
    Add {
        #[arg(long)]
        user: String,
        #[arg(long)]
        title: String,
        content: String,
        #[arg(long, default_value = "yellow")]
        color: NoteColor,
    },
    /// Rewrite a personal note
    Edit {
        note_id: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        title: String,
        content: String,
        #[arg(long, default_value = "yellow")]
        color: NoteColor,
    },
    /// Pin or unpin a personal note
    Toggle {
        note_id: String,
        #[arg(long)]
        user: String,
    },
    /// Delete a personal note
    Delete {
        note_id: String,
        #[arg(long)]
        user: String,
    },
    /// List your personal notes, pinned first
    Mine {
        #[arg(long)]
        user: String,
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(database: &Database, command: NoteCommand) -> CommandResult {
    match command {
        NoteCommand::Post {
            group,
            user,
            content,
            tags,
            pinned,
            deadline,
        } => {
            let note = post_sticky_note(
                database,
                NewStickyNote {
                    group_id: group,
                    author: user,
                    content,
                    tags,
                    is_pinned: pinned,
                    deadline,
                },
            )
            .await?;
            println!("Posted note {}", note.id);
        }
        NoteCommand::Board { group, user, json } => {
            let notes = group_notes(database, &group, &user).await?;
            if json {
                return print_json(&notes);
            }
            let now = Utc::now();
            for note in &notes {
                let pin = if note.is_pinned { "* " } else { "  " };
                let mut line = format!("{}{} ({})", pin, note.content, note.created_by);
                if !note.tags.is_empty() {
                    line.push_str(&format!(" #{}", note.tags.join(" #")));
                }
                if let Some(deadline) = note.deadline {
                    let overdue = if note.is_overdue_at(now) { ", overdue" } else { "" };
                    line.push_str(&format!(" [due {}{}]", deadline.format("%b %-d, %H:%M"), overdue));
                }
                println!("{}  {}", line, note.id);
            }
        }
        NoteCommand::Pin {
            note_id,
            group,
            user,
            off,
        } => {
            pin_sticky_note(database, &group, &note_id, &user, !off).await?;
            println!("{} {}", if off { "Unpinned" } else { "Pinned" }, note_id);
        }
        NoteCommand::Remove { note_id, group, user } => {
            remove_sticky_note(database, &group, &note_id, &user).await?;
            println!("Removed {}", note_id);
        }
        NoteCommand::Add {
            user,
            title,
            content,
            color,
        } => {
            let note = add_personal_note(database, &user, &title, &content, color).await?;
            println!("Added {} ({})", note.title, note.id);
        }
        NoteCommand::Edit {
            note_id,
            user,
            title,
            content,
            color,
        } => {
            let note = edit_personal_note(database, &user, &note_id, &title, &content, color).await?;
            println!("Updated {} ({})", note.title, note.id);
        }
        NoteCommand::Toggle { note_id, user } => {
            let pinned = toggle_personal_pin(database, &user, &note_id).await?;
            println!("{} {}", if pinned { "Pinned" } else { "Unpinned" }, note_id);
        }
        NoteCommand::Delete { note_id, user } => {
            database.delete_personal_note(&note_id, &user).await?;
            println!("Deleted {}", note_id);
        }
        NoteCommand::Mine { user, json } => {
            let notes = database.list_personal_notes(&user).await?;
            if json {
                return print_json(&notes);
            }
            if notes.is_empty() {
                println!("No notes yet.");
            }
            for note in &notes {
                let pin = if note.is_pinned { "* " } else { "  " };
                println!("{}{} [{}]  {}\n    {}", pin, note.title, note.color, note.id, note.content);
            }
        }
    }
    Ok(())
}
