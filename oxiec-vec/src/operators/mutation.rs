use super::setting;
use crate::genomics::{Gene, GeneBounds, VectorIndividual};
use crate::P_VECTOR;
use oxiec::breeding::pipeline::Mutation;
use oxiec::rng::ThreadRandom;
use oxiec::{EcError, ParameterDatabase, ParameterPath, Result};

use std::str::FromStr;

use log::debug;

/// Identifier the vector mutation pipeline is registered under.
pub const IDENTIFIER: &str = "vector.mutate";

pub const P_MUTATION_PROB: &str = "mutation-prob";
pub const P_MUTATION_TYPE: &str = "mutation-type";
pub const P_RANDOM_WALK_PROB: &str = "random-walk-probability";

/// How a selected integer gene changes. Bits always flip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationType {
    /// A fresh uniform value within the bounds.
    Reset,
    /// ±1 steps within the bounds.
    RandomWalk,
}

impl FromStr for MutationType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "reset" => Ok(MutationType::Reset),
            "random-walk" => Ok(MutationType::RandomWalk),
            _ => Err(()),
        }
    }
}

/// Per-gene mutation of vector genomes.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorMutation {
    probability: f64,
    kind: MutationType,
    walk_probability: f64,
    bounds: GeneBounds,
}

impl VectorMutation {
    pub fn new(probability: f64, kind: MutationType, bounds: GeneBounds) -> VectorMutation {
        VectorMutation {
            probability,
            kind,
            walk_probability: 0.0,
            bounds,
        }
    }

    /// Sets how likely a random walk is to continue after each step.
    pub fn with_walk_probability(self, walk_probability: f64) -> VectorMutation {
        VectorMutation {
            walk_probability,
            ..self
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn kind(&self) -> MutationType {
        self.kind
    }

    pub fn bounds(&self) -> &GeneBounds {
        &self.bounds
    }
}

impl Default for VectorMutation {
    fn default() -> Self {
        VectorMutation::new(0.0, MutationType::Reset, GeneBounds::default())
    }
}

impl<G: Gene> Mutation<VectorIndividual<G>> for VectorMutation {
    fn name(&self) -> &'static str {
        IDENTIFIER
    }

    /// Reads `mutation-prob` (required, in `[0, 1]`), `mutation-type`
    /// (`reset` or `random-walk`, default `reset`),
    /// `random-walk-probability` (required for random walks, in
    /// `[0, 1)`) and the gene bounds.
    fn setup(
        &mut self,
        params: &ParameterDatabase,
        base: &ParameterPath,
        default_base: &ParameterPath,
    ) -> Result<()> {
        let (path, def) = setting(params, base, default_base, P_MUTATION_PROB);
        self.probability = params.get_double_with_max(&path, Some(&def), 0.0, 1.0);
        if self.probability < 0.0 {
            return Err(EcError::range(&path, "mutation-prob must be between 0.0 and 1.0"));
        }

        let (path, def) = setting(params, base, default_base, P_MUTATION_TYPE);
        let kind = params.get_string_with_default(&path, Some(&def), "reset");
        self.kind = kind.parse().map_err(|_| EcError::BadFormat {
            kind: "mutation type",
            value: kind,
            path,
        })?;

        if self.kind == MutationType::RandomWalk {
            let (path, def) = setting(params, base, default_base, P_RANDOM_WALK_PROB);
            self.walk_probability = params.get_double_with_max(&path, Some(&def), 0.0, 1.0);
            if !(0.0..1.0).contains(&self.walk_probability) {
                return Err(EcError::range(
                    &path,
                    "random-walk-probability must be at least 0.0 and below 1.0",
                ));
            }
        }

        self.bounds = GeneBounds::setup(params, base, &ParameterPath::new(P_VECTOR))?;
        debug!(
            "{}: {:?} mutation at {} within [{}, {}]",
            base, self.kind, self.probability, self.bounds.min, self.bounds.max
        );
        Ok(())
    }

    fn mutate(
        &self,
        individual: &mut VectorIndividual<G>,
        random: &mut ThreadRandom,
    ) -> Result<()> {
        for gene in individual.genome_mut() {
            if random.next_bool(self.probability) {
                *gene = match self.kind {
                    MutationType::Reset => gene.reset(&self.bounds, random),
                    MutationType::RandomWalk => {
                        gene.walk(&self.bounds, self.walk_probability, random)
                    }
                };
            }
        }
        Ok(())
    }
}
