//! Lazy circuit evaluation with memoization and explicit invalidation.
//!
//! A wire is resolved by walking its dependencies depth-first on an explicit
//! work stack. Every computed signal is cached, so each wire is evaluated at
//! most once per cache lifetime no matter how many wires read it.

use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;
use thiserror::Error;

use crate::wire::{literal_value, Operand, WireProgram};

/// Errors raised while resolving a wire
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// A wire is read but has no definition and no override
    #[error("undefined wire: {wire}")]
    UndefinedWire { wire: String },
    /// The wire depends on itself, directly or through other wires
    #[error("cyclic dependency through wire: {wire}")]
    CyclicDependency { wire: String },
}

/// Counters collected across resolutions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationMetrics {
    /// Wire expressions actually computed
    pub evaluations: usize,
    /// Queries answered from the cache or an override without evaluating
    pub cache_hits: usize,
    /// Deepest work stack seen (longest dependency chain walked)
    pub max_stack_depth: usize,
}

/// A wire program together with its evaluation state.
///
/// The cache is the only state mutated by resolution. Overrides are kept
/// apart from it so they outlive [`Circuit::reset`].
#[derive(Debug, Clone)]
pub struct Circuit {
    program: WireProgram,
    cache: HashMap<String, u16>,
    overrides: HashMap<String, u16>,
    metrics: EvaluationMetrics,
}

impl Circuit {
    pub fn new(program: WireProgram) -> Self {
        Self {
            program,
            cache: HashMap::new(),
            overrides: HashMap::new(),
            metrics: EvaluationMetrics::default(),
        }
    }

    pub fn program(&self) -> &WireProgram {
        &self.program
    }

    pub fn metrics(&self) -> &EvaluationMetrics {
        &self.metrics
    }

    pub fn reset_metrics(&mut self) {
        self.metrics = EvaluationMetrics::default();
    }

    /// Cached signal of a wire, without evaluating anything
    pub fn value_of(&self, wire: &str) -> Option<u16> {
        self.cache.get(wire).copied()
    }

    /// Number of wires currently cached
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Resolve a wire (or literal token) to its 16-bit signal.
    ///
    /// Literal tokens are returned as-is. Anything else is looked up in the
    /// cache, then the overrides, and finally computed from the program.
    pub fn resolve(&mut self, name: &str) -> Result<u16, EvalError> {
        if let Some(value) = literal_value(name) {
            return Ok(value);
        }

        if let Some(&value) = self.cache.get(name) {
            self.metrics.cache_hits += 1;
            return Ok(value);
        }

        if let Some(&value) = self.overrides.get(name) {
            self.metrics.cache_hits += 1;
            self.cache.insert(name.to_string(), value);
            return Ok(value);
        }

        self.evaluate(name)
    }

    /// Pin a wire to `value`, ignoring its definition until overrides are cleared.
    ///
    /// Wires already cached are not recomputed; call [`Circuit::reset`] so
    /// dependents pick up the new signal.
    pub fn override_wire(&mut self, wire: &str, value: u16) {
        log::debug!("override {} = {}", wire, value);
        self.overrides.insert(wire.to_string(), value);
        self.cache.insert(wire.to_string(), value);
    }

    /// Drop every cached signal
    pub fn reset(&mut self) {
        log::debug!("reset: dropping {} cached wires", self.cache.len());
        self.cache.clear();
    }

    /// Drop every override, and the cache with it
    pub fn clear_overrides(&mut self) {
        self.overrides.clear();
        self.reset();
    }

    /// Compute an uncached wire and everything it transitively needs
    fn evaluate(&mut self, wire: &str) -> Result<u16, EvalError> {
        // Wires whose expression is waiting on a dependency
        let mut stack: SmallVec<[String; 32]> = SmallVec::new();
        let mut on_stack: HashSet<String> = HashSet::new();

        stack.push(wire.to_string());
        on_stack.insert(wire.to_string());

        let mut resolved = 0;

        while let Some(current) = stack.last() {
            self.metrics.max_stack_depth = self.metrics.max_stack_depth.max(stack.len());

            let step = match self.overrides.get(current.as_str()) {
                Some(&pinned) => Ok(pinned),
                None => {
                    let expression =
                        self.program
                            .get(current)
                            .ok_or_else(|| EvalError::UndefinedWire {
                                wire: current.clone(),
                            })?;
                    let cache = &self.cache;
                    let step = expression.evaluate(|operand| match operand {
                        Operand::Literal(value) => Ok(*value),
                        Operand::Wire(name) => cache.get(name.as_str()).copied().ok_or(name.as_str()),
                    });
                    if step.is_ok() {
                        self.metrics.evaluations += 1;
                    }
                    step
                }
            };

            match step {
                Ok(value) => {
                    if let Some(done) = stack.pop() {
                        log::trace!("{} = {}", done, value);
                        on_stack.remove(&done);
                        self.cache.insert(done, value);
                    }
                    resolved = value;
                }
                Err(pending) => {
                    if !on_stack.insert(pending.to_string()) {
                        return Err(EvalError::CyclicDependency {
                            wire: pending.to_string(),
                        });
                    }
                    stack.push(pending.to_string());
                }
            }
        }

        // The requested wire is the first pushed, so it is the last popped
        Ok(resolved)
    }
}
