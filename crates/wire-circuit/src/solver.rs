//! Two-phase puzzle workflow.
//!
//! Part 1 reads the signal on the target wire. Part 2 takes that signal,
//! clamps the override wire to it, resets the circuit and reads the target
//! again.

use std::time::Instant;

use thiserror::Error;

use crate::evaluator::{Circuit, EvalError, EvaluationMetrics};
use crate::parser::ParseError;
use crate::wire::WireProgram;

/// Any failure between raw instruction text and a final signal
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CircuitError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Which half of the puzzle to solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    One,
    Two,
}

impl Part {
    pub fn number(self) -> u8 {
        match self {
            Part::One => 1,
            Part::Two => 2,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Part::One),
            2 => Some(Part::Two),
            _ => None,
        }
    }
}

/// Configuration for the solver
#[derive(Debug, Clone)]
pub struct SolveConfig {
    /// Wire whose signal is the answer
    pub target: String,
    /// Wire clamped to the part 1 answer in part 2
    pub override_wire: String,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            target: "a".to_string(),
            override_wire: "b".to_string(),
        }
    }
}

/// Result of solving one part
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub part: Part,
    pub target: String,
    /// Final signal on the target wire
    pub value: u16,
    /// Part 1 signal that was fed into the override wire (part 2 only)
    pub baseline: Option<u16>,
    /// Number of wire definitions in the program
    pub wires: usize,
    pub metrics: EvaluationMetrics,
    pub time_elapsed_ms: u64,
}

/// Part 1: the signal on the target wire
pub fn solve_part1(circuit: &mut Circuit, config: &SolveConfig) -> Result<u16, EvalError> {
    circuit.resolve(&config.target)
}

/// Part 2: feed the part 1 signal into the override wire and re-run.
///
/// Returns `(baseline, value)`.
pub fn solve_part2(circuit: &mut Circuit, config: &SolveConfig) -> Result<(u16, u16), EvalError> {
    let baseline = circuit.resolve(&config.target)?;

    circuit.reset();
    circuit.override_wire(&config.override_wire, baseline);

    let value = circuit.resolve(&config.target)?;
    Ok((baseline, value))
}

/// Parse instruction text and solve the requested part
pub fn solve(text: &str, part: Part, config: &SolveConfig) -> Result<SolveResult, CircuitError> {
    let start_time = Instant::now();

    let program = WireProgram::parse(text)?;
    let wires = program.len();
    let mut circuit = Circuit::new(program);

    let (baseline, value) = match part {
        Part::One => (None, solve_part1(&mut circuit, config)?),
        Part::Two => {
            let (baseline, value) = solve_part2(&mut circuit, config)?;
            (Some(baseline), value)
        }
    };

    log::debug!(
        "part {} solved: {} = {} ({} evaluations)",
        part.number(),
        config.target,
        value,
        circuit.metrics().evaluations
    );

    Ok(SolveResult {
        part,
        target: config.target.clone(),
        value,
        baseline,
        wires,
        metrics: *circuit.metrics(),
        time_elapsed_ms: start_time.elapsed().as_millis() as u64,
    })
}
