//! CLI entry point for the wire circuit evaluator.
//!
//! Usage:
//!   wire-circuit solve <instructions.txt> [--part 1|2] [--target a] [--override-wire b]
//!   wire-circuit eval <instructions.txt> --wire <name>... [--set <name>=<value>]...
//!   wire-circuit dump <instructions.txt> [--canonical]
//!
//! Every command also accepts `--stdin` in place of a file path. Results are
//! printed as JSON on stdout; set `RUST_LOG=debug` for evaluation logs.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use wire_circuit::{solve, Circuit, EvaluationMetrics, Part, SolveConfig, SolveResult, WireProgram};

#[derive(Parser)]
#[command(name = "wire-circuit")]
#[command(about = "Lazy 16-bit logic circuit evaluator for wire-assembly puzzles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Path to the instruction file (use --stdin to read from stdin)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Read instructions from stdin instead of a file
    #[arg(long)]
    stdin: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve part 1 or part 2 of the puzzle
    Solve {
        #[command(flatten)]
        input: InputArgs,

        /// Which part of the puzzle to solve
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u8).range(1..=2))]
        part: u8,

        /// Wire whose signal is the answer
        #[arg(long, default_value = "a")]
        target: String,

        /// Wire clamped to the part 1 answer in part 2
        #[arg(long, default_value = "b")]
        override_wire: String,
    },

    /// Resolve the signal on one or more wires
    Eval {
        #[command(flatten)]
        input: InputArgs,

        /// Wire to resolve (repeatable)
        #[arg(long = "wire", value_name = "NAME", required = true)]
        wires: Vec<String>,

        /// Pin a wire before resolving, as NAME=VALUE (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        overrides: Vec<(String, u16)>,
    },

    /// Print the parsed wire program
    Dump {
        #[command(flatten)]
        input: InputArgs,

        /// Print canonical instruction text instead of JSON
        #[arg(long)]
        canonical: bool,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveOutput {
    part: u8,
    target: String,
    value: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    baseline: Option<u16>,
    wires: usize,
    time_elapsed_ms: u64,
    metrics: MetricsOutput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EvalOutput {
    wires: usize,
    values: BTreeMap<String, u16>,
    metrics: MetricsOutput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DumpOutput<'a> {
    wires: usize,
    undefined_references: Vec<&'a str>,
    definitions: &'a WireProgram,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetricsOutput {
    evaluations: usize,
    cache_hits: usize,
    max_stack_depth: usize,
}

impl From<&EvaluationMetrics> for MetricsOutput {
    fn from(metrics: &EvaluationMetrics) -> Self {
        Self {
            evaluations: metrics.evaluations,
            cache_hits: metrics.cache_hits,
            max_stack_depth: metrics.max_stack_depth,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env().init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            input,
            part,
            target,
            override_wire,
        } => {
            let text = read_input(&input)?;
            let part = Part::from_number(part).ok_or_else(|| anyhow!("invalid part: {}", part))?;
            let config = SolveConfig {
                target,
                override_wire,
            };

            let result = solve(&text, part, &config)
                .with_context(|| format!("failed to solve part {}", part.number()))?;

            print_json(&format_solve(&result))?;
        }

        Commands::Eval {
            input,
            wires,
            overrides,
        } => {
            let text = read_input(&input)?;
            let program = WireProgram::parse(&text).context("failed to parse instructions")?;
            let mut circuit = Circuit::new(program);

            for (wire, value) in &overrides {
                circuit.override_wire(wire, *value);
            }

            let mut values = BTreeMap::new();
            for wire in wires {
                let value = circuit
                    .resolve(&wire)
                    .with_context(|| format!("failed to resolve wire {}", wire))?;
                values.insert(wire, value);
            }

            print_json(&EvalOutput {
                wires: circuit.program().len(),
                values,
                metrics: circuit.metrics().into(),
            })?;
        }

        Commands::Dump { input, canonical } => {
            let text = read_input(&input)?;
            let program = WireProgram::parse(&text).context("failed to parse instructions")?;

            if canonical {
                print!("{}", program);
            } else {
                print_json(&DumpOutput {
                    wires: program.len(),
                    undefined_references: program.undefined_references(),
                    definitions: &program,
                })?;
            }
        }
    }

    Ok(())
}

/// Read instruction text from the file argument or stdin
fn read_input(input: &InputArgs) -> Result<String> {
    if input.stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read from stdin")?;
        Ok(buffer)
    } else if let Some(path) = &input.file {
        fs::read_to_string(path).with_context(|| format!("failed to read file {:?}", path))
    } else {
        bail!("must provide either a file path or --stdin")
    }
}

/// Parse a `NAME=VALUE` override
fn parse_assignment(arg: &str) -> std::result::Result<(String, u16), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {:?}", arg))?;
    let value = value
        .trim()
        .parse::<u16>()
        .map_err(|e| format!("invalid value for {}: {}", name, e))?;
    Ok((name.trim().to_string(), value))
}

fn print_json<T: Serialize>(output: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

fn format_solve(result: &SolveResult) -> SolveOutput {
    SolveOutput {
        part: result.part.number(),
        target: result.target.clone(),
        value: result.value,
        baseline: result.baseline,
        wires: result.wires,
        time_elapsed_ms: result.time_elapsed_ms,
        metrics: (&result.metrics).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("b=956"), Ok(("b".to_string(), 956)));
        assert_eq!(parse_assignment(" b = 0 "), Ok(("b".to_string(), 0)));
        assert!(parse_assignment("b").is_err());
        assert!(parse_assignment("b=70000").is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_solve_output_shape() {
        let result = solve("7 -> b\nb -> a", Part::Two, &SolveConfig::default()).unwrap();
        let json = serde_json::to_value(format_solve(&result)).unwrap();

        assert_eq!(json["part"], 2);
        assert_eq!(json["value"], 7);
        assert_eq!(json["baseline"], 7);
        assert_eq!(json["wires"], 2);
        assert!(json["metrics"]["evaluations"].as_u64().unwrap() > 0);
        assert!(json.get("timeElapsedMs").is_some());
    }
}
