use crate::calculator::{Calculator, Key};
use crate::commands::CommandResult;

/// Presses `keys` in order on a fresh calculator and prints what it shows.
pub fn run(keys: &[String]) -> CommandResult {
    let keys = keys
        .iter()
        .map(|token| token.parse::<Key>())
        .collect::<Result<Vec<_>, _>>()?;

    let mut calculator = Calculator::new();
    for key in keys {
        calculator.press(key);
    }

    if let Some(pending) = calculator.pending_expression() {
        println!("{}", pending);
    }
    println!("{}", calculator.display());

    let history: Vec<&str> = calculator.history().collect();
    if !history.is_empty() {
        println!("\nHistory:");
        for entry in history {
            println!("  {}", entry);
        }
    }
    if calculator.memory() != 0.0 {
        println!("\nM = {}", calculator.memory());
    }

    Ok(())
}
