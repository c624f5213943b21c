//! Instruction parser.
//!
//! Each instruction line has the form `<expr> -> <wire>`, where `<expr>` is
//! a literal or wire (`123`, `x`), a complement (`NOT x`) or a binary gate
//! (`x AND y`, `x OR y`, `x LSHIFT 2`, `y RSHIFT 2`).

use thiserror::Error;

use crate::wire::{is_literal_token, is_wire_name, literal_value, BinaryOp, Expression, Operand, WireProgram};

const ARROW: &str = "->";

/// Errors that can occur when parsing instructions
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Line does not match `<expr> -> <wire>`
    #[error("malformed instruction: {line:?}")]
    MalformedInstruction { line: String },
    /// Middle token of a binary gate is not AND/OR/LSHIFT/RSHIFT
    #[error("unknown operator {operator:?} in instruction: {line:?}")]
    UnknownOperator { operator: String, line: String },
    /// Numeric token that does not fit in 16 bits
    #[error("literal {token} out of 16-bit range in instruction: {line:?}")]
    InvalidLiteral { token: String, line: String },
}

impl ParseError {
    fn malformed(line: &str) -> Self {
        ParseError::MalformedInstruction {
            line: line.to_string(),
        }
    }
}

/// Parse a single instruction line into the wire it drives and its expression
pub fn parse_instruction(line: &str) -> Result<(String, Expression), ParseError> {
    let line = line.trim();

    let mut parts = line.split(ARROW);
    let (expr_text, target) = match (parts.next(), parts.next(), parts.next()) {
        (Some(expr), Some(target), None) => (expr, target.trim()),
        _ => return Err(ParseError::malformed(line)),
    };

    if !is_wire_name(target) {
        return Err(ParseError::malformed(line));
    }

    let tokens: Vec<&str> = expr_text.split_whitespace().collect();
    let expression = match tokens.as_slice() {
        [source] => Expression::Assign {
            source: parse_operand(source, line)?,
        },
        ["NOT", operand] => Expression::Not {
            operand: parse_operand(operand, line)?,
        },
        [left, keyword, right] => {
            let op = BinaryOp::from_keyword(keyword).ok_or_else(|| ParseError::UnknownOperator {
                operator: keyword.to_string(),
                line: line.to_string(),
            })?;
            Expression::Binary {
                op,
                left: parse_operand(left, line)?,
                right: parse_operand(right, line)?,
            }
        }
        _ => return Err(ParseError::malformed(line)),
    };

    Ok((target.to_string(), expression))
}

/// Parse an operand token: digits are a literal, anything alphanumeric is a wire
fn parse_operand(token: &str, line: &str) -> Result<Operand, ParseError> {
    if is_literal_token(token) {
        return literal_value(token)
            .map(Operand::Literal)
            .ok_or_else(|| ParseError::InvalidLiteral {
                token: token.to_string(),
                line: line.to_string(),
            });
    }
    if is_wire_name(token) {
        Ok(Operand::wire(token))
    } else {
        Err(ParseError::malformed(line))
    }
}

impl WireProgram {
    /// Build a program from already-split instruction lines.
    ///
    /// Blank lines are skipped. When a wire is defined more than once the
    /// last definition wins.
    pub fn from_lines<I, S>(lines: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut program = WireProgram::new();
        for line in lines {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }
            let (wire, expression) = parse_instruction(line)?;
            if let Some(previous) = program.define(wire.as_str(), expression) {
                log::warn!("wire {} redefined, dropping earlier definition `{}`", wire, previous);
            }
        }
        log::debug!("parsed {} wire definitions", program.len());
        Ok(program)
    }

    /// Build a program from newline-separated instruction text
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Self::from_lines(text.lines())
    }
}
