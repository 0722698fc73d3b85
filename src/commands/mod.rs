use serde::Serialize;

pub mod alerts;
pub mod calc;
pub mod group;
pub mod note;
pub mod poll;
pub mod timetable;

pub type CommandResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Prints `value` as pretty JSON for `--json` output.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
