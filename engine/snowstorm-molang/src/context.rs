//! Evaluation context: variable storage and the random source.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::names;

/// Name of the identifier that draws a fresh random value when read.
pub const RANDOM_VARIABLE: &str = "math.random";

/// Mutable state an expression is evaluated against.
///
/// Every emitter and every particle owns one. Lookups of names that were
/// never set return zero, which is what Molang authors rely on for optional
/// inputs.
#[derive(Debug, Clone)]
pub struct Context {
    variables: HashMap<String, f32>,
    rng: StdRng,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates an empty context seeded from the operating system.
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates an empty context with a deterministic random source.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            variables: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates an empty context whose random source is seeded from this one.
    ///
    /// Used to give particles their own stream while keeping a seeded emitter
    /// reproducible.
    pub fn spawn_child(&mut self) -> Self {
        Self::with_seed(self.rng.random())
    }

    /// Sets a variable, expanding namespace shorthands.
    pub fn set(&mut self, name: &str, value: f32) {
        let name = names::normalize(name);
        // Hot path: particle variables are rewritten every tick.
        if let Some(slot) = self.variables.get_mut(&*name) {
            *slot = value;
        } else {
            self.variables.insert(name.into_owned(), value);
        }
    }

    /// Reads a variable. Unknown names read as zero.
    pub fn get(&self, name: &str) -> f32 {
        self.variables
            .get(&*names::normalize(name))
            .copied()
            .unwrap_or(0.0)
    }

    /// Returns true if `name` has been set.
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(&*names::normalize(name))
    }

    /// Removes a variable, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<f32> {
        self.variables.remove(&*names::normalize(name))
    }

    /// Resolves an identifier at evaluation time.
    ///
    /// `math.random` draws a new value in `[0, 1)` on every read; anything
    /// else is a plain variable lookup.
    pub fn resolve(&mut self, name: &str) -> f32 {
        if name.eq_ignore_ascii_case(RANDOM_VARIABLE) {
            return self.random_f32();
        }
        self.get(name)
    }

    /// Iterates over all variables currently set.
    pub fn variables(&self) -> impl Iterator<Item = (&str, f32)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of variables currently set.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Uniform draw in `[0, 1)`.
    pub fn random_f32(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// Uniform draw between `lo` and `hi`. The bounds may be given in either
    /// order.
    pub fn random_range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.random_f32() * (hi - lo)
    }

    /// Uniform integer draw in the inclusive range spanned by `lo` and `hi`.
    pub fn random_integer(&mut self, lo: f32, hi: f32) -> f32 {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let lo = lo.round() as i64;
        let hi = hi.round() as i64;
        self.rng.random_range(lo..=hi) as f32
    }

    /// Direct access to the random source for callers that sample vectors.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
