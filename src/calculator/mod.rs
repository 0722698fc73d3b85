pub mod ops;

pub use ops::{BinaryOp, CalcError, ScientificOp};

use log::debug;
use ops::{format_number, parse_display};
use std::collections::VecDeque;
use std::str::FromStr;

pub const HISTORY_LIMIT: usize = 10;

/// Shown in place of a number when a result is not finite.
pub const ERROR_TOKEN: &str = "Error";

/// Where the calculator is in an expression. A pending operation always
/// carries its left operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum State {
    /// Typing a number, nothing pending.
    Entering,
    /// A result or recalled value is shown; the next digit starts a new number.
    Settled,
    /// An operation was chosen and the right operand has not been started.
    OperationPending { accumulator: f64, op: BinaryOp },
    /// Typing the right operand of a pending operation.
    OperandEntered { accumulator: f64, op: BinaryOp },
}

impl State {
    pub fn pending(&self) -> Option<(f64, BinaryOp)> {
        match *self {
            State::OperationPending { accumulator, op } | State::OperandEntered { accumulator, op } => {
                Some((accumulator, op))
            }
            State::Entering | State::Settled => None,
        }
    }

    pub fn awaiting_new_operand(&self) -> bool {
        matches!(self, State::Settled | State::OperationPending { .. })
    }

    fn settled(self) -> Self {
        match self {
            State::Entering | State::Settled => State::Settled,
            State::OperationPending { accumulator, op } | State::OperandEntered { accumulator, op } => {
                State::OperationPending { accumulator, op }
            }
        }
    }

    fn entering(self) -> Self {
        match self {
            State::Entering | State::Settled => State::Entering,
            State::OperationPending { accumulator, op } | State::OperandEntered { accumulator, op } => {
                State::OperandEntered { accumulator, op }
            }
        }
    }
}

/// One calculator keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    DoubleZero,
    Decimal,
    Binary(BinaryOp),
    Equals,
    Scientific(ScientificOp),
    ClearAll,
    ClearEntry,
    Backspace,
    ToggleSign,
    MemoryAdd,
    MemorySubtract,
    MemoryRecall,
    MemoryClear,
    ClearHistory,
}

impl FromStr for Key {
    type Err = CalcError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if let Some(op) = BinaryOp::from_symbol(token) {
            return Ok(Key::Binary(op));
        }
        let key = match token {
            "00" => Key::DoubleZero,
            "." => Key::Decimal,
            "=" => Key::Equals,
            "AC" | "ac" => Key::ClearAll,
            "CE" | "ce" => Key::ClearEntry,
            "DEL" | "del" => Key::Backspace,
            "+/-" => Key::ToggleSign,
            "M+" => Key::MemoryAdd,
            "M-" => Key::MemorySubtract,
            "MR" => Key::MemoryRecall,
            "MC" => Key::MemoryClear,
            "HC" => Key::ClearHistory,
            "sqrt" => Key::Scientific(ScientificOp::Sqrt),
            "x2" => Key::Scientific(ScientificOp::Square),
            "sin" => Key::Scientific(ScientificOp::Sin),
            "cos" => Key::Scientific(ScientificOp::Cos),
            "tan" => Key::Scientific(ScientificOp::Tan),
            "log" => Key::Scientific(ScientificOp::Log10),
            "ln" => Key::Scientific(ScientificOp::Ln),
            "exp" => Key::Scientific(ScientificOp::Exp),
            "1/x" => Key::Scientific(ScientificOp::Reciprocal),
            "pi" => Key::Scientific(ScientificOp::Pi),
            "e" => Key::Scientific(ScientificOp::E),
            "n!" => Key::Scientific(ScientificOp::Factorial),
            _ => match token.as_bytes() {
                [d @ b'0'..=b'9'] => Key::Digit(d - b'0'),
                _ => return Err(CalcError::UnknownKey(token.to_string())),
            },
        };
        Ok(key)
    }
}

/// Keystroke calculator with a single accumulator. Operations apply
/// immediately in the order they are pressed; there is no precedence.
#[derive(Debug, Clone)]
pub struct Calculator {
    display: String,
    state: State,
    memory: f64,
    history: VecDeque<String>,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator {
    pub fn new() -> Self {
        Self {
            display: "0".to_string(),
            state: State::Entering,
            memory: 0.0,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn memory(&self) -> f64 {
        self.memory
    }

    /// History entries, most recent first.
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    /// The `"<accumulator> <op>"` line shown above the display while an
    /// operation is pending.
    pub fn pending_expression(&self) -> Option<String> {
        self.state
            .pending()
            .map(|(accumulator, op)| format!("{} {}", format_number(accumulator), op))
    }

    pub fn press(&mut self, key: Key) {
        debug!("calculator key {:?} in state {:?}", key, self.state);
        match key {
            Key::Digit(d) => self.input_digit(d),
            Key::DoubleZero => {
                self.input_digit(0);
                self.input_digit(0);
            }
            Key::Decimal => self.input_decimal(),
            Key::Binary(op) => self.select_operation(op),
            Key::Equals => self.equals(),
            Key::Scientific(op) => self.scientific(op),
            Key::ClearAll => self.clear_all(),
            Key::ClearEntry => self.clear_entry(),
            Key::Backspace => self.backspace(),
            Key::ToggleSign => self.toggle_sign(),
            Key::MemoryAdd => self.memory_add(),
            Key::MemorySubtract => self.memory_subtract(),
            Key::MemoryRecall => self.memory_recall(),
            Key::MemoryClear => self.memory_clear(),
            Key::ClearHistory => self.clear_history(),
        }
    }

    /// Digits above 9 are ignored.
    pub fn input_digit(&mut self, digit: u8) {
        if digit > 9 {
            return;
        }
        let digit = char::from(b'0' + digit);
        if self.state.awaiting_new_operand() {
            self.display = digit.to_string();
            self.state = self.state.entering();
        } else if self.display == "0" {
            self.display = digit.to_string();
        } else {
            let mut entry = self.display.clone();
            entry.push(digit);
            if entry.parse::<f64>().is_ok_and(f64::is_finite) {
                self.display = entry;
            }
        }
    }

    pub fn input_decimal(&mut self) {
        if self.state.awaiting_new_operand() {
            self.display = "0.".to_string();
            self.state = self.state.entering();
        } else if !self.display.contains('.') {
            self.display.push('.');
        }
    }

    pub fn select_operation(&mut self, next: BinaryOp) {
        let input = self.value();
        let accumulator = match self.state.pending() {
            None => input,
            Some((accumulator, op)) => match self.commit(accumulator, op, input) {
                Some(result) => result,
                None => return,
            },
        };
        self.state = State::OperationPending { accumulator, op: next };
    }

    pub fn equals(&mut self) {
        let Some((accumulator, op)) = self.state.pending() else {
            return;
        };
        let input = self.value();
        self.commit(accumulator, op, input);
        self.state = State::Settled;
    }

    pub fn scientific(&mut self, op: ScientificOp) {
        let value = self.value();
        let entry = format!("{}({})", op.label(), format_number(value));
        match op.evaluate(value) {
            Ok(result) => {
                self.record(format!("{} = {}", entry, format_number(result)));
                self.show(result);
            }
            Err(e) => {
                debug!("{}", e);
                self.record(format!("{} = {}", entry, ERROR_TOKEN));
                self.display = ERROR_TOKEN.to_string();
            }
        }
        self.state = self.state.settled();
    }

    /// Resets the expression. Memory and history are kept.
    pub fn clear_all(&mut self) {
        self.display = "0".to_string();
        self.state = State::Entering;
    }

    pub fn clear_entry(&mut self) {
        self.display = "0".to_string();
    }

    pub fn backspace(&mut self) {
        if self.display == ERROR_TOKEN {
            self.display = "0".to_string();
            return;
        }
        self.display.pop();
        if self.display.is_empty() || self.display == "-" {
            self.display = "0".to_string();
        }
    }

    pub fn toggle_sign(&mut self) {
        self.display = format_number(-self.value());
    }

    pub fn memory_add(&mut self) {
        self.memory += self.value();
    }

    pub fn memory_subtract(&mut self) {
        self.memory -= self.value();
    }

    pub fn memory_recall(&mut self) {
        self.show(self.memory);
        self.state = self.state.settled();
    }

    pub fn memory_clear(&mut self) {
        self.memory = 0.0;
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn value(&self) -> f64 {
        parse_display(&self.display)
    }

    /// Applies `op`, logs it to history and shows the result. A non-finite
    /// result shows the error token, drops the pending chain and yields `None`.
    fn commit(&mut self, accumulator: f64, op: BinaryOp, input: f64) -> Option<f64> {
        let result = op.apply(accumulator, input);
        self.record(format!(
            "{} {} {} = {}",
            format_number(accumulator),
            op,
            format_number(input),
            format_number(result)
        ));
        if result.is_finite() {
            self.display = format_number(result);
            Some(result)
        } else {
            self.display = ERROR_TOKEN.to_string();
            self.state = State::Settled;
            None
        }
    }

    fn show(&mut self, result: f64) {
        self.display = if result.is_finite() {
            format_number(result)
        } else {
            ERROR_TOKEN.to_string()
        };
    }

    fn record(&mut self, entry: String) {
        self.history.push_front(entry);
        self.history.truncate(HISTORY_LIMIT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(keys: &str) -> Calculator {
        let mut calc = Calculator::new();
        for token in keys.split_whitespace() {
            calc.press(token.parse().unwrap());
        }
        calc
    }

    fn history(calc: &Calculator) -> Vec<&str> {
        calc.history().collect()
    }

    #[test]
    fn simple_addition() {
        let calc = run("7 + 3 =");
        assert_eq!(calc.display(), "10");
        assert_eq!(history(&calc), vec!["7 + 3 = 10"]);
        assert_eq!(calc.state(), State::Settled);
    }

    #[test]
    fn overflowed_memory_recalls_as_error() {
        let mut calc = run("1 7 0 n!");
        for _ in 0..30 {
            calc.press(Key::MemoryAdd);
        }
        calc.press(Key::MemoryRecall);
        assert!(calc.memory().is_infinite());
        assert_eq!(calc.display(), ERROR_TOKEN);
    }

    #[test]
    fn digits_stop_once_entry_leaves_f64_range() {
        let mut calc = Calculator::new();
        for _ in 0..400 {
            calc.press(Key::Digit(9));
        }
        assert_eq!(calc.display().len(), 308);
        assert!(calc.display().parse::<f64>().unwrap().is_finite());
    }

    #[test]
    fn no_operator_precedence() {
        let calc = run("2 + 3 * 4 =");
        assert_eq!(calc.display(), "20");
        assert_eq!(history(&calc), vec!["5 * 4 = 20", "2 + 3 = 5"]);
    }

    #[test]
    fn division_by_zero_shows_zero() {
        let calc = run("5 / 0 =");
        assert_eq!(calc.display(), "0");
        assert_eq!(history(&calc), vec!["5 / 0 = 0"]);
    }

    #[test]
    fn backspace_bottoms_out_at_zero() {
        let mut calc = run("5");
        calc.backspace();
        assert_eq!(calc.display(), "0");
        calc.backspace();
        assert_eq!(calc.display(), "0");

        let mut calc = run("1 2 +/-");
        assert_eq!(calc.display(), "-12");
        calc.backspace();
        assert_eq!(calc.display(), "-1");
        calc.backspace();
        assert_eq!(calc.display(), "0");
    }

    #[test]
    fn digit_entry_replaces_lone_zero() {
        assert_eq!(run("0 5").display(), "5");
        assert_eq!(run("5 5").display(), "55");
        assert_eq!(run("0 0").display(), "0");
        assert_eq!(run("1 00").display(), "100");
    }

    #[test]
    fn decimal_point_once() {
        assert_eq!(run(". 5 . 2").display(), "0.52");
        assert_eq!(run("7 + .").display(), "0.");
        assert_eq!(run("1 . . 5").display(), "1.5");
    }

    #[test]
    fn pending_state_carries_accumulator() {
        let calc = run("1 2 +");
        assert_eq!(
            calc.state(),
            State::OperationPending { accumulator: 12.0, op: BinaryOp::Add }
        );
        assert_eq!(calc.pending_expression().as_deref(), Some("12 +"));
        assert_eq!(calc.display(), "12");

        let calc = run("1 2 + 3");
        assert_eq!(
            calc.state(),
            State::OperandEntered { accumulator: 12.0, op: BinaryOp::Add }
        );
    }

    #[test]
    fn repeated_operator_reuses_display() {
        let calc = run("5 + + =");
        assert_eq!(calc.display(), "20");
        assert_eq!(history(&calc), vec!["10 + 10 = 20", "5 + 5 = 10"]);
    }

    #[test]
    fn equals_without_pending_is_noop() {
        let calc = run("4 2 =");
        assert_eq!(calc.display(), "42");
        assert!(history(&calc).is_empty());
        assert_eq!(calc.state(), State::Entering);
    }

    #[test]
    fn result_starts_new_number() {
        let calc = run("7 + 3 = 4");
        assert_eq!(calc.display(), "4");
        assert_eq!(calc.state(), State::Entering);
    }

    #[test]
    fn scientific_keeps_pending_operation() {
        let calc = run("1 0 + 9 sqrt");
        assert_eq!(calc.display(), "3");
        assert_eq!(
            calc.state(),
            State::OperationPending { accumulator: 10.0, op: BinaryOp::Add }
        );
        let mut calc = calc;
        calc.equals();
        assert_eq!(calc.display(), "13");
        assert_eq!(history(&calc), vec!["10 + 3 = 13", "sqrt(9) = 3"]);
    }

    #[test]
    fn factorial_key() {
        assert_eq!(run("5 n!").display(), "120");
        assert_eq!(run("0 n!").display(), "1");
        let calc = run("3 +/- n!");
        assert_eq!(calc.display(), ERROR_TOKEN);
        assert_eq!(history(&calc), vec!["fact(-3) = Error"]);
    }

    #[test]
    fn non_finite_results_show_error() {
        let calc = run("4 +/- sqrt");
        assert_eq!(calc.display(), ERROR_TOKEN);
        assert_eq!(history(&calc), vec!["sqrt(-4) = NaN"]);

        let calc = run("0 log");
        assert_eq!(calc.display(), ERROR_TOKEN);
        assert_eq!(history(&calc), vec!["log(0) = -inf"]);

        let mut calc = run("5 % 0 =");
        assert_eq!(calc.display(), ERROR_TOKEN);
        assert_eq!(calc.state(), State::Settled);
        calc.press(Key::Digit(8));
        assert_eq!(calc.display(), "8");
    }

    #[test]
    fn non_finite_chain_drops_pending() {
        let calc = run("4 +/- ^ . 5 +");
        assert_eq!(calc.display(), ERROR_TOKEN);
        assert_eq!(calc.state(), State::Settled);
        assert_eq!(calc.pending_expression(), None);
    }

    #[test]
    fn clear_all_keeps_memory_and_history() {
        let mut calc = run("9 M+ AC 7 + 3 = 2 +");
        calc.clear_all();
        assert_eq!(calc.display(), "0");
        assert_eq!(calc.state(), State::Entering);
        assert_eq!(calc.memory(), 9.0);
        assert_eq!(history(&calc).len(), 1);
    }

    #[test]
    fn clear_entry_only_resets_display() {
        let calc = run("8 * 3 CE 4 =");
        assert_eq!(calc.display(), "32");
    }

    #[test]
    fn memory_keys() {
        let mut calc = run("1 0 M+ CE 3 M- MR");
        assert_eq!(calc.memory(), 7.0);
        assert_eq!(calc.display(), "7");
        assert!(calc.state().awaiting_new_operand());
        calc.press(Key::Digit(2));
        assert_eq!(calc.display(), "2");
        calc.press(Key::MemoryClear);
        assert_eq!(calc.memory(), 0.0);
    }

    #[test]
    fn history_is_bounded_most_recent_first() {
        let mut calc = Calculator::new();
        for i in 1..=12u8 {
            calc.press(Key::Digit(i % 10));
            calc.press(Key::Binary(BinaryOp::Add));
            calc.press(Key::Digit(1));
            calc.press(Key::Equals);
        }
        let entries = history(&calc);
        assert_eq!(entries.len(), HISTORY_LIMIT);
        assert_eq!(entries[0], "2 + 1 = 3");

        calc.press(Key::ClearHistory);
        assert!(history(&calc).is_empty());
        assert_eq!(calc.display(), "3");
    }

    #[test]
    fn sign_toggle() {
        assert_eq!(run("5 +/-").display(), "-5");
        assert_eq!(run("5 +/- +/-").display(), "5");
        assert_eq!(run("+/-").display(), "0");
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert_eq!("x".parse::<Key>(), Err(CalcError::UnknownKey("x".to_string())));
        assert_eq!("7".parse::<Key>(), Ok(Key::Digit(7)));
        assert_eq!("^".parse::<Key>(), Ok(Key::Binary(BinaryOp::Power)));
    }
}
