//! Logic circuit evaluator for wire-assembly puzzles.
//!
//! This crate parses `<expr> -> <wire>` instructions into a wire program
//! and resolves 16-bit wire signals lazily, caching each wire's value and
//! supporting overrides with explicit cache reset.

pub mod evaluator;
pub mod parser;
pub mod solver;
pub mod wire;

// Re-export main types
pub use evaluator::{Circuit, EvalError, EvaluationMetrics};
pub use parser::{parse_instruction, ParseError};
pub use solver::{solve, solve_part1, solve_part2, CircuitError, Part, SolveConfig, SolveResult};
pub use wire::{BinaryOp, Expression, Operand, WireProgram};
