use crate::commands::{print_json, CommandResult};
use crate::db::Database;
use crate::handlers::group::{create_group, join_group, membership};
use crate::models::GroupKind;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum GroupCommand {
    /// Create a group; the creator becomes its admin
    Create {
        #[arg(long)]
        user: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// class, club, lab or other
        #[arg(long, default_value = "class")]
        kind: GroupKind,
    },
    /// Join a group
    Join {
        group_id: String,
        #[arg(long)]
        user: String,
    },
    /// List the groups a user belongs to
    List {
        #[arg(long)]
        user: String,
        #[arg(long)]
        json: bool,
    },
    /// Show a group's members
    Members {
        group_id: String,
        /// Member asking
        #[arg(long)]
        user: String,
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(database: &Database, command: GroupCommand) -> CommandResult {
    match command {
        GroupCommand::Create {
            user,
            name,
            description,
            kind,
        } => {
            let group = create_group(database, &name, description.as_deref(), kind, &user).await?;
            println!("Created group {} ({})", group.name, group.id);
        }
        GroupCommand::Join { group_id, user } => {
            let member = join_group(database, &group_id, &user).await?;
            println!("{} is a {} of {}", member.user_id, member.role, member.group_id);
        }
        GroupCommand::List { user, json } => {
            let groups = database.list_user_groups(&user).await?;
            if json {
                return print_json(&groups);
            }
            if groups.is_empty() {
                println!("Create or join a group to get started.");
            }
            for group in &groups {
                match &group.description {
                    Some(description) => println!("{} [{}] {}: {}", group.id, group.kind, group.name, description),
                    None => println!("{} [{}] {}", group.id, group.kind, group.name),
                }
            }
        }
        GroupCommand::Members { group_id, user, json } => {
            if membership(database, &group_id, &user).await?.is_none() {
                return Err(format!("{} is not a member of group {}", user, group_id).into());
            }
            let members = database.list_members(&group_id).await?;
            if json {
                return print_json(&members);
            }
            for member in &members {
                println!("{} ({}), joined {}", member.user_id, member.role, member.joined_at.format("%Y-%m-%d"));
            }
        }
    }
    Ok(())
}
