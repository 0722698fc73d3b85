use clap::{Parser, Subcommand};
use log::error;
use std::process::ExitCode;
use studysync::commands::{
    self, group::GroupCommand, note::NoteCommand, poll::PollCommand, timetable::TimetableCommand, CommandResult,
};
use studysync::config::Config;
use studysync::db::Database;

#[derive(Parser)]
#[command(name = "studysync", about = "Study group polls, timetable and calculator")]
struct Opts {
    /// Overrides DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Press calculator keys in order, e.g. `calc 7 + 3 =`
    Calc {
        #[arg(required = true, allow_hyphen_values = true)]
        keys: Vec<String>,
    },
    /// Create and join study groups
    Group {
        #[command(subcommand)]
        command: GroupCommand,
    },
    /// Group sticky notes and your personal notes
    Note {
        #[command(subcommand)]
        command: NoteCommand,
    },
    /// Create polls, vote and show results
    Poll {
        #[command(subcommand)]
        command: PollCommand,
    },
    /// Manage a class timetable
    Timetable {
        #[command(subcommand)]
        command: TimetableCommand,
    },
    /// Run timetable alerts until Ctrl-C
    Alerts {
        #[arg(long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let opts = Opts::parse();
    match run(opts).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(opts: Opts) -> CommandResult {
    let url = opts.database_url;
    match opts.command {
        Command::Calc { keys } => commands::calc::run(&keys),
        Command::Group { command } => commands::group::run(&connect(url).await?.0, command).await,
        Command::Note { command } => commands::note::run(&connect(url).await?.0, command).await,
        Command::Poll { command } => commands::poll::run(&connect(url).await?.0, command).await,
        Command::Timetable { command } => commands::timetable::run(&connect(url).await?.0, command).await,
        Command::Alerts { user } => {
            let (database, config) = connect(url).await?;
            commands::alerts::run(&database, &user, config.alert_check_interval).await
        }
    }
}

/// Reads the environment and opens the store. `--database-url` wins over DATABASE_URL.
async fn connect(url_override: Option<String>) -> Result<(Database, Config), Box<dyn std::error::Error + Send + Sync>> {
    let mut config = Config::from_env()?;
    if let Some(url) = url_override {
        config.database_url = url;
    }
    let database = Database::new(&config.database_url, config.max_connections).await?;
    Ok((database, config))
}
