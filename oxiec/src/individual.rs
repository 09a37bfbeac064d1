//! Individuals, as seen by the breeding machinery.
//!
//! The framework never looks inside an individual: it only reads
//! its fitness, flips its evaluated flag, aliases it or clones it.
//! Population slots hold `Arc`s so selection can hand out the very
//! individual stored in the population, while anything that mutates
//! goes through [`Arc::make_mut`] and so works on its own copy.
use crate::{EcError, Result};

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// An interface for individuals that can be bred.
pub trait Individual: Clone + Send + Sync + fmt::Debug + 'static {
    /// Whether the current fitness value is up to date.
    fn is_evaluated(&self) -> bool;

    fn set_evaluated(&mut self, evaluated: bool);

    /// Returns the individual's fitness. Higher is better.
    fn fitness(&self) -> f64;
}

/// Compares two individuals by fitness, with NaN treated as worst.
pub fn by_fitness<I: Individual>(a: &I, b: &I) -> Ordering {
    let (a, b) = (a.fitness(), b.fitness());
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.total_cmp(&b),
    }
}

/// An independently bred group of individuals.
#[derive(Clone, Debug)]
pub struct Subpopulation<I> {
    individuals: Vec<Arc<I>>,
}

impl<I: Individual> Subpopulation<I> {
    /// Wraps freshly created individuals.
    pub fn new(individuals: Vec<I>) -> Subpopulation<I> {
        Subpopulation {
            individuals: individuals.into_iter().map(Arc::new).collect(),
        }
    }

    /// Builds a subpopulation from already shared individuals,
    /// e.g. the output of a breeding tree.
    pub fn from_shared(individuals: Vec<Arc<I>>) -> Subpopulation<I> {
        Subpopulation { individuals }
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// The population slots themselves. Cloning one of these `Arc`s
    /// aliases the stored individual.
    pub fn individuals(&self) -> &[Arc<I>] {
        &self.individuals
    }

    /// Mutable access to the slots, for evaluation. Use
    /// [`Arc::make_mut`] to reach the individual.
    pub fn individuals_mut(&mut self) -> &mut [Arc<I>] {
        &mut self.individuals
    }

    pub fn iter(&self) -> impl Iterator<Item = &I> {
        self.individuals.iter().map(|i| &**i)
    }

    /// Returns the fittest individual, if any.
    pub fn champion(&self) -> Option<&Arc<I>> {
        self.individuals.iter().max_by(|a, b| by_fitness::<I>(a, b))
    }

    /// Returns the indices of the `count` fittest individuals, best first.
    pub fn best_indices(&self, count: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.individuals.len()).collect();
        indices.sort_by(|&a, &b| by_fitness::<I>(&self.individuals[b], &self.individuals[a]));
        indices.truncate(count);
        indices
    }
}

/// A collection of subpopulations at a given generation.
#[derive(Clone, Debug)]
pub struct Population<I> {
    subpops: Vec<Subpopulation<I>>,
    generation: usize,
}

impl<I: Individual> Population<I> {
    /// Creates a generation-zero population.
    ///
    /// # Examples
    /// ```
    /// use oxiec::individual::{Individual, Population, Subpopulation};
    ///
    /// #[derive(Clone, Debug)]
    /// struct Score(f64);
    ///
    /// impl Individual for Score {
    ///     fn is_evaluated(&self) -> bool { true }
    ///     fn set_evaluated(&mut self, _: bool) {}
    ///     fn fitness(&self) -> f64 { self.0 }
    /// }
    ///
    /// let population = Population::new(vec![Subpopulation::new(vec![Score(1.0), Score(3.0)])]);
    /// assert_eq!(population.generation(), 0);
    /// assert_eq!(population.champion().unwrap().fitness(), 3.0);
    /// ```
    pub fn new(subpops: Vec<Subpopulation<I>>) -> Population<I> {
        Population {
            subpops,
            generation: 0,
        }
    }

    /// Creates the population that follows `self`.
    pub fn next_generation(&self, subpops: Vec<Subpopulation<I>>) -> Population<I> {
        Population {
            subpops,
            generation: self.generation + 1,
        }
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn subpops(&self) -> &[Subpopulation<I>] {
        &self.subpops
    }

    pub fn subpops_mut(&mut self) -> &mut [Subpopulation<I>] {
        &mut self.subpops
    }

    /// Returns subpopulation `index`.
    ///
    /// # Errors
    /// A contract violation if the population has no such subpopulation.
    pub fn subpop(&self, index: usize) -> Result<&Subpopulation<I>> {
        self.subpops.get(index).ok_or_else(|| EcError::ContractViolation {
            operator: "population",
            message: format!(
                "subpopulation {} requested from a population of {}",
                index,
                self.subpops.len()
            ),
        })
    }

    /// Returns the fittest individual across all subpopulations.
    pub fn champion(&self) -> Option<&Arc<I>> {
        self.subpops
            .iter()
            .filter_map(Subpopulation::champion)
            .max_by(|a, b| by_fitness::<I>(a, b))
    }

    /// Total number of individuals.
    pub fn len(&self) -> usize {
        self.subpops.iter().map(Subpopulation::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
