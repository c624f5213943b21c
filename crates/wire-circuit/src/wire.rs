//! Circuit representation types.
//!
//! A wire program maps each wire name to the single-step expression that
//! drives it. Operands are either 16-bit constants or other wires; nested
//! expressions are expressed through intermediate named wires.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Check whether a token is a valid wire name.
///
/// Names are ASCII alphanumeric and not all digits, since an all-digit
/// token always reads as a literal.
pub fn is_wire_name(token: &str) -> bool {
    !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_alphanumeric())
        && !is_literal_token(token)
}

/// Check whether a token is written as a literal (digits only)
pub fn is_literal_token(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a literal token, returning `None` for non-literals and values wider than 16 bits
pub fn literal_value(token: &str) -> Option<u16> {
    if is_literal_token(token) {
        token.parse().ok()
    } else {
        None
    }
}

/// A signal source: a constant or another wire
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operand {
    Literal(u16),
    Wire(String),
}

impl Operand {
    pub fn wire(name: impl Into<String>) -> Self {
        Operand::Wire(name.into())
    }

    /// Get the wire name if this operand references a wire
    pub fn as_wire(&self) -> Option<&str> {
        match self {
            Operand::Wire(name) => Some(name),
            Operand::Literal(_) => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => write!(f, "{}", value),
            Operand::Wire(name) => f.write_str(name),
        }
    }
}

/// Two-operand gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BinaryOp {
    And,
    Or,
    LShift,
    RShift,
}

impl BinaryOp {
    /// Look up an operator by its instruction keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "AND" => Some(BinaryOp::And),
            "OR" => Some(BinaryOp::Or),
            "LSHIFT" => Some(BinaryOp::LShift),
            "RSHIFT" => Some(BinaryOp::RShift),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::LShift => "LSHIFT",
            BinaryOp::RShift => "RSHIFT",
        }
    }

    /// Apply the gate to two 16-bit signals.
    ///
    /// Shifts discard bits moved past the 16-bit boundary; a shift by 16 or
    /// more yields 0.
    pub fn apply(self, left: u16, right: u16) -> u16 {
        match self {
            BinaryOp::And => left & right,
            BinaryOp::Or => left | right,
            BinaryOp::LShift => left.checked_shl(u32::from(right)).unwrap_or(0),
            BinaryOp::RShift => left.checked_shr(u32::from(right)).unwrap_or(0),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The single operation that drives a wire
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    /// Direct assignment from a literal or another wire (`123 -> x`, `y -> x`)
    Assign { source: Operand },
    /// 16-bit complement (`NOT y -> x`)
    Not { operand: Operand },
    /// Binary gate (`y AND z -> x`)
    Binary {
        op: BinaryOp,
        left: Operand,
        right: Operand,
    },
}

impl Expression {
    pub fn literal(value: u16) -> Self {
        Expression::Assign {
            source: Operand::Literal(value),
        }
    }

    pub fn wire_ref(name: impl Into<String>) -> Self {
        Expression::Assign {
            source: Operand::wire(name),
        }
    }

    pub fn not(operand: Operand) -> Self {
        Expression::Not { operand }
    }

    pub fn binary(op: BinaryOp, left: Operand, right: Operand) -> Self {
        Expression::Binary { op, left, right }
    }

    /// Operands in evaluation order (left before right)
    pub fn operands(&self) -> impl Iterator<Item = &Operand> {
        let (first, second) = match self {
            Expression::Assign { source } => (source, None),
            Expression::Not { operand } => (operand, None),
            Expression::Binary { left, right, .. } => (left, Some(right)),
        };
        std::iter::once(first).chain(second)
    }

    /// Wires this expression reads from
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.operands().filter_map(Operand::as_wire)
    }

    /// Compute the expression given a way to read operand signals.
    ///
    /// Stops at the first operand whose signal is unavailable and returns
    /// that error.
    pub fn evaluate<'a, E, F>(&'a self, mut signal: F) -> Result<u16, E>
    where
        F: FnMut(&'a Operand) -> Result<u16, E>,
    {
        match self {
            Expression::Assign { source } => signal(source),
            Expression::Not { operand } => signal(operand).map(|v| !v),
            Expression::Binary { op, left, right } => {
                let left = signal(left)?;
                let right = signal(right)?;
                Ok(op.apply(left, right))
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Assign { source } => write!(f, "{}", source),
            Expression::Not { operand } => write!(f, "NOT {}", operand),
            Expression::Binary { op, left, right } => write!(f, "{} {} {}", left, op, right),
        }
    }
}

/// The full set of wire definitions, ordered by wire name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireProgram {
    definitions: BTreeMap<String, Expression>,
}

impl WireProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) a wire, returning the replaced expression if any
    pub fn define(&mut self, wire: impl Into<String>, expression: Expression) -> Option<Expression> {
        self.definitions.insert(wire.into(), expression)
    }

    pub fn get(&self, wire: &str) -> Option<&Expression> {
        self.definitions.get(wire)
    }

    pub fn contains(&self, wire: &str) -> bool {
        self.definitions.contains_key(wire)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expression)> {
        self.definitions.iter().map(|(wire, expr)| (wire.as_str(), expr))
    }

    /// Wires that are read somewhere but never defined
    pub fn undefined_references(&self) -> Vec<&str> {
        let mut missing = BTreeSet::new();
        for (_, expr) in self.iter() {
            for dep in expr.dependencies() {
                if !self.definitions.contains_key(dep) {
                    missing.insert(dep);
                }
            }
        }
        missing.into_iter().collect()
    }
}

impl fmt::Display for WireProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (wire, expr) in self.iter() {
            writeln!(f, "{} -> {}", expr, wire)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_op_semantics() {
        assert_eq!(BinaryOp::And.apply(123, 456), 72);
        assert_eq!(BinaryOp::Or.apply(123, 456), 507);
        assert_eq!(BinaryOp::LShift.apply(123, 2), 492);
        assert_eq!(BinaryOp::RShift.apply(456, 2), 114);

        // Bits shifted past 16 are dropped
        assert_eq!(BinaryOp::LShift.apply(0x8001, 1), 0x0002);
        assert_eq!(BinaryOp::LShift.apply(1, 16), 0);
        assert_eq!(BinaryOp::RShift.apply(0xFFFF, 16), 0);
        assert_eq!(BinaryOp::RShift.apply(0xFFFF, 15), 1);
    }

    #[test]
    fn test_keywords() {
        for op in [BinaryOp::And, BinaryOp::Or, BinaryOp::LShift, BinaryOp::RShift] {
            assert_eq!(BinaryOp::from_keyword(op.keyword()), Some(op));
        }
        assert_eq!(BinaryOp::from_keyword("XOR"), None);
        assert_eq!(BinaryOp::from_keyword("and"), None);
    }

    #[test]
    fn test_literal_tokens() {
        assert_eq!(literal_value("0"), Some(0));
        assert_eq!(literal_value("65535"), Some(65535));
        assert_eq!(literal_value("65536"), None);
        assert_eq!(literal_value("+5"), None);
        assert_eq!(literal_value("x1"), None);
        assert!(is_literal_token("99999"));
        assert!(is_wire_name("ab1"));
        assert!(!is_wire_name("a-b"));
        assert!(!is_wire_name(""));
        assert!(!is_wire_name("5"));
        assert!(is_wire_name("5a"));
    }

    #[test]
    fn test_expression_evaluate() {
        let not_x = Expression::not(Operand::wire("x"));
        assert_eq!(not_x.evaluate(|_| Ok::<_, ()>(123)), Ok(65412));

        let shifted = Expression::binary(BinaryOp::LShift, Operand::wire("x"), Operand::Literal(2));
        let value = shifted.evaluate(|op| match op {
            Operand::Literal(v) => Ok::<_, ()>(*v),
            Operand::Wire(_) => Ok(123),
        });
        assert_eq!(value, Ok(492));

        // The first missing wire is reported
        let and = Expression::binary(BinaryOp::And, Operand::wire("p"), Operand::wire("q"));
        let missing = and.evaluate(|op| match op {
            Operand::Wire(name) if name == "p" => Ok(1),
            Operand::Wire(name) => Err(name.as_str()),
            Operand::Literal(v) => Ok(*v),
        });
        assert_eq!(missing, Err("q"));
    }

    #[test]
    fn test_dependencies_skip_literals() {
        let expr = Expression::binary(BinaryOp::And, Operand::Literal(1), Operand::wire("cx"));
        assert_eq!(expr.dependencies().collect::<Vec<_>>(), vec!["cx"]);
        assert_eq!(Expression::literal(7).dependencies().count(), 0);
    }

    #[test]
    fn test_display_matches_instruction_syntax() {
        let mut program = WireProgram::new();
        program.define("x", Expression::literal(123));
        program.define("h", Expression::not(Operand::wire("x")));
        program.define(
            "f",
            Expression::binary(BinaryOp::LShift, Operand::wire("x"), Operand::Literal(2)),
        );

        assert_eq!(program.to_string(), "x LSHIFT 2 -> f\nNOT x -> h\n123 -> x\n");
    }

    #[test]
    fn test_undefined_references() {
        let mut program = WireProgram::new();
        program.define("a", Expression::binary(BinaryOp::Or, Operand::wire("b"), Operand::wire("c")));
        program.define("b", Expression::wire_ref("zz"));
        program.define("c", Expression::literal(1));

        assert_eq!(program.undefined_references(), vec!["zz"]);
        assert_eq!(
            program.iter().map(|(wire, _)| wire).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_redefine_replaces() {
        let mut program = WireProgram::new();
        assert_eq!(program.define("a", Expression::literal(1)), None);
        assert_eq!(program.define("a", Expression::literal(2)), Some(Expression::literal(1)));
        assert_eq!(program.len(), 1);
        assert_eq!(program.get("a"), Some(&Expression::literal(2)));
    }

    #[test]
    fn test_serde_shape() {
        let expr = Expression::binary(BinaryOp::RShift, Operand::wire("y"), Operand::Literal(2));
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "binary",
                "op": "RSHIFT",
                "left": { "wire": "y" },
                "right": { "literal": 2 },
            })
        );
        let back: Expression = serde_json::from_value(json).unwrap();
        assert_eq!(back, expr);
    }
}
