use std::f64::consts;
use std::fmt;

/// Largest n whose factorial is finite in an f64.
const MAX_FINITE_FACTORIAL: u64 = 170;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CalcError {
    #[error("factorial is undefined for negative input {0}")]
    DomainError(String),
    #[error("unknown calculator key: {0:?}")]
    UnknownKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "^",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(BinaryOp::Add),
            "-" => Some(BinaryOp::Subtract),
            "*" => Some(BinaryOp::Multiply),
            "/" => Some(BinaryOp::Divide),
            "%" => Some(BinaryOp::Modulo),
            "^" => Some(BinaryOp::Power),
            _ => None,
        }
    }

    /// Division by zero yields 0 instead of an error.
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Subtract => a - b,
            BinaryOp::Multiply => a * b,
            BinaryOp::Divide => {
                if b != 0.0 {
                    a / b
                } else {
                    0.0
                }
            }
            BinaryOp::Modulo => a % b,
            BinaryOp::Power => a.powf(b),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScientificOp {
    Sqrt,
    Square,
    Sin,
    Cos,
    Tan,
    Log10,
    Ln,
    Exp,
    Reciprocal,
    Pi,
    E,
    Factorial,
}

impl ScientificOp {
    /// Name used in history entries, e.g. `sqrt(16) = 4`.
    pub fn label(&self) -> &'static str {
        match self {
            ScientificOp::Sqrt => "sqrt",
            ScientificOp::Square => "square",
            ScientificOp::Sin => "sin",
            ScientificOp::Cos => "cos",
            ScientificOp::Tan => "tan",
            ScientificOp::Log10 => "log",
            ScientificOp::Ln => "ln",
            ScientificOp::Exp => "exp",
            ScientificOp::Reciprocal => "1/x",
            ScientificOp::Pi => "pi",
            ScientificOp::E => "e",
            ScientificOp::Factorial => "fact",
        }
    }

    /// Trigonometric inputs are degrees. Results may be non-finite; only a
    /// negative factorial is reported as an error.
    pub fn evaluate(&self, value: f64) -> Result<f64, CalcError> {
        let result = match self {
            ScientificOp::Sqrt => value.sqrt(),
            ScientificOp::Square => value * value,
            ScientificOp::Sin => value.to_radians().sin(),
            ScientificOp::Cos => value.to_radians().cos(),
            ScientificOp::Tan => value.to_radians().tan(),
            ScientificOp::Log10 => value.log10(),
            ScientificOp::Ln => value.ln(),
            ScientificOp::Exp => value.exp(),
            ScientificOp::Reciprocal => 1.0 / value,
            ScientificOp::Pi => consts::PI,
            ScientificOp::E => consts::E,
            ScientificOp::Factorial => factorial(value)?,
        };
        Ok(result)
    }
}

/// Factorial of `value` truncated toward zero. `0! = 1! = 1`; anything past
/// 170! overflows to infinity.
pub fn factorial(value: f64) -> Result<f64, CalcError> {
    let n = value.trunc();
    if n < 0.0 {
        return Err(CalcError::DomainError(format_number(value)));
    }
    if n > MAX_FINITE_FACTORIAL as f64 {
        return Ok(f64::INFINITY);
    }
    Ok((2..=n as u64).fold(1.0, |acc, k| acc * k as f64))
}

/// Shortest text that parses back to the same f64. Negative zero prints as `0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

/// Reads the display as a number; anything that is not a finite number reads as 0.
pub fn parse_display(display: &str) -> f64 {
    display
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_ops() {
        assert_eq!(BinaryOp::Add.apply(7.0, 3.0), 10.0);
        assert_eq!(BinaryOp::Subtract.apply(7.0, 3.0), 4.0);
        assert_eq!(BinaryOp::Multiply.apply(7.0, 3.0), 21.0);
        assert_eq!(BinaryOp::Divide.apply(9.0, 3.0), 3.0);
        assert_eq!(BinaryOp::Modulo.apply(-7.0, 3.0), -1.0);
        assert_eq!(BinaryOp::Power.apply(2.0, -1.0), 0.5);
        assert_eq!(BinaryOp::Power.apply(9.0, 0.5), 3.0);
    }

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(BinaryOp::Divide.apply(5.0, 0.0), 0.0);
        assert_eq!(BinaryOp::Divide.apply(-5.0, -0.0), 0.0);
    }

    #[test]
    fn factorial_base_cases() {
        assert_eq!(factorial(0.0), Ok(1.0));
        assert_eq!(factorial(1.0), Ok(1.0));
        assert_eq!(factorial(5.0), Ok(120.0));
        assert_eq!(factorial(5.9), Ok(120.0));
        assert_eq!(factorial(-0.5), Ok(1.0));
        assert!(matches!(factorial(-3.0), Err(CalcError::DomainError(_))));
        assert_eq!(factorial(171.0), Ok(f64::INFINITY));
    }

    #[test]
    fn trig_uses_degrees() {
        let sin30 = ScientificOp::Sin.evaluate(30.0).unwrap();
        assert!((sin30 - 0.5).abs() < 1e-12);
        let cos60 = ScientificOp::Cos.evaluate(60.0).unwrap();
        assert!((cos60 - 0.5).abs() < 1e-12);
        let tan45 = ScientificOp::Tan.evaluate(45.0).unwrap();
        assert!((tan45 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constants_ignore_input() {
        assert_eq!(ScientificOp::Pi.evaluate(42.0), Ok(consts::PI));
        assert_eq!(ScientificOp::E.evaluate(-1.0), Ok(consts::E));
    }

    #[test]
    fn number_formatting_round_trips() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        for value in [consts::PI, 1e21, -2.5e-7, 120.0] {
            assert_eq!(format_number(value).parse::<f64>().unwrap(), value);
        }
    }

    #[test]
    fn display_parsing() {
        assert_eq!(parse_display("0."), 0.0);
        assert_eq!(parse_display("-12.5"), -12.5);
        assert_eq!(parse_display("Error"), 0.0);
        assert_eq!(parse_display("inf"), 0.0);
    }
}
