//! Arithmetic-only expression evaluator.
//!
//! Supports numbers, parentheses, `+ - * / // ** %`. `%` stands for `/100`,
//! so `50%` is `0.5` and `10%3` is `10/1003`. Nothing else is reachable:
//! there are no names, functions or assignments.

use std::iter::Peekable;
use std::str::Chars;

const ALLOWED: &str = "0123456789+-*/().% ";

/// Deepest nesting of parentheses, signs and powers accepted.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("trailing input at {0:?}")]
    Trailing(char),
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NotFinite,
    #[error("expression nested too deeply")]
    TooDeep,
}

/// Whether the trimmed query consists only of calculator characters.
pub fn is_calculator_query(query: &str) -> bool {
    let query = query.trim();
    !query.is_empty() && query.chars().all(|c| ALLOWED.contains(c))
}

pub fn evaluate(expr: &str) -> Result<f64, CalcError> {
    let mut parser = Parser {
        chars: expr.chars().peekable(),
        depth: 0,
    };
    let value = parser.expr()?;
    parser.skip_ws();
    if let Some(&c) = parser.chars.peek() {
        return Err(CalcError::Trailing(c));
    }
    if !value.is_finite() {
        return Err(CalcError::NotFinite);
    }
    Ok(value)
}

/// Integral values print without a fractional part, everything else as the
/// shortest decimal that round-trips.
///
/// Evaluation happens in `f64`, so integers beyond 2^53 are rounded.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn skip_ws(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.chars.peek().copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    // term := factor (('*' | '/' | '//') factor | '%' digits?)*
    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.factor()?;
        loop {
            match self.peek() {
                Some('*') => {
                    self.chars.next();
                    value *= self.factor()?;
                }
                Some('/') => {
                    self.chars.next();
                    let floor = self.chars.next_if_eq(&'/').is_some();
                    let rhs = self.factor()?;
                    if rhs == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    value = if floor { (value / rhs).floor() } else { value / rhs };
                }
                Some('%') => {
                    self.chars.next();
                    value /= self.percent_divisor()?;
                }
                _ => return Ok(value),
            }
        }
    }

    // factor := ('+' | '-') factor | power
    fn factor(&mut self) -> Result<f64, CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        let value = if self.eat('-') {
            self.factor().map(|v| -v)
        } else if self.eat('+') {
            self.factor()
        } else {
            self.power()
        };
        self.depth -= 1;
        value
    }

    // power := primary ('**' factor)?
    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.primary()?;
        if self.peek() == Some('*') {
            let mut ahead = self.chars.clone();
            ahead.next();
            if ahead.peek() == Some(&'*') {
                self.chars.next();
                self.chars.next();
                let exp = self.factor()?;
                return Ok(base.powf(exp));
            }
        }
        Ok(base)
    }

    // Digits glued to `%` extend the divisor: `%3` divides by 1003.
    fn percent_divisor(&mut self) -> Result<f64, CalcError> {
        let mut literal = String::from("100");
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_digit() || *c == '.') {
            literal.push(c);
        }
        literal
            .parse::<f64>()
            .map_err(|_| CalcError::InvalidNumber(literal))
    }

    // primary := number | '(' expr ')'
    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some('(') => {
                self.chars.next();
                let value = self.expr()?;
                if self.eat(')') {
                    Ok(value)
                } else {
                    Err(self.peek().map_or(CalcError::UnexpectedEnd, CalcError::UnexpectedChar))
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(CalcError::UnexpectedChar(c)),
            None => Err(CalcError::UnexpectedEnd),
        }
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        let mut literal = String::new();
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_digit() || *c == '.') {
            literal.push(c);
        }
        literal
            .parse::<f64>()
            .map_err(|_| CalcError::InvalidNumber(literal))
    }
}
