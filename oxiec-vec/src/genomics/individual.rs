use crate::genomics::{Gene, GeneBounds};
use oxiec::rng::ThreadRandom;
use oxiec::Individual;

use std::fmt;

use serde::{Deserialize, Serialize};

/// A fixed-length vector of genes with a scalar fitness.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorIndividual<G> {
    genome: Vec<G>,
    fitness: f64,
    evaluated: bool,
}

impl<G: Gene> VectorIndividual<G> {
    /// Returns an unevaluated individual with the given genome.
    ///
    /// # Examples
    /// ```
    /// use oxiec::Individual;
    /// use oxiec_vec::genomics::VectorIndividual;
    ///
    /// let individual = VectorIndividual::new(vec![true, false, true]);
    /// assert_eq!(individual.len(), 3);
    /// assert!(!individual.is_evaluated());
    /// ```
    pub fn new(genome: Vec<G>) -> VectorIndividual<G> {
        VectorIndividual {
            genome,
            fitness: 0.0,
            evaluated: false,
        }
    }

    /// Returns an unevaluated individual of `len` random genes.
    pub fn random(
        len: usize,
        bounds: &GeneBounds,
        random: &mut ThreadRandom,
    ) -> VectorIndividual<G> {
        Self::new((0..len).map(|_| G::random(bounds, random)).collect())
    }

    pub fn genome(&self) -> &[G] {
        &self.genome
    }

    pub fn genome_mut(&mut self) -> &mut [G] {
        &mut self.genome
    }

    pub fn len(&self) -> usize {
        self.genome.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genome.is_empty()
    }

    /// Sum of the gene values.
    pub fn gene_sum(&self) -> f64 {
        self.genome.iter().map(|g| g.value()).sum()
    }

    /// Sets the fitness and marks the individual evaluated.
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
        self.evaluated = true;
    }
}

impl<G: Gene> Individual for VectorIndividual<G> {
    fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    fn set_evaluated(&mut self, evaluated: bool) {
        self.evaluated = evaluated;
    }

    fn fitness(&self) -> f64 {
        self.fitness
    }
}

impl<G: Gene> fmt::Display for VectorIndividual<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, gene) in self.genome.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", gene.value())?;
        }
        write!(f, "] fitness {}", self.fitness)
    }
}
