//! Breeding sources: the operator trees that produce each
//! generation's individuals.
//!
//! A tree is made of [`BreedingSource`] nodes. Leaves are selection
//! methods, which hand out the individuals already stored in the
//! population (aliased `Arc`s). Internal nodes are pipelines, which
//! pull individuals from their children and hand out new, uniquely
//! owned ones.
//!
//! Every `produce(min, max, ..)` call appends between `min` and `max`
//! individuals to the caller's output and returns how many it added.
//! Calls happen inside a per-(subpopulation, thread) bracket, driven
//! through a [`Production`]:
//!
//! ```text
//! Idle -> prepare_to_produce -> produce* -> finish_producing -> Idle
//! ```
pub mod pipeline;
pub mod selection;

use crate::individual::{Individual, Population, Subpopulation};
use crate::params::ParameterPath;
use crate::prototype::{Registry, SetupContext};
use crate::rng::ThreadRandom;
use crate::{EcError, Result};

use std::fmt;
use std::sync::Arc;

/// Per-thread context handed to every `produce` call.
#[derive(Debug)]
pub struct BreedingState<'a, I> {
    /// The population being bred from.
    pub population: &'a Population<I>,
    /// Index of the breeding thread.
    pub thread: usize,
    /// The thread's own random generator.
    pub random: &'a mut ThreadRandom,
}

impl<'a, I: Individual> BreedingState<'a, I> {
    pub fn new(
        population: &'a Population<I>,
        thread: usize,
        random: &'a mut ThreadRandom,
    ) -> BreedingState<'a, I> {
        BreedingState {
            population,
            thread,
            random,
        }
    }

    /// Shorthand for `self.population.subpop(index)`.
    pub fn subpop(&self, index: usize) -> Result<&'a Subpopulation<I>> {
        self.population.subpop(index)
    }
}

/// Parent bookkeeping: for each output position, the subpopulation
/// indices of the individuals it descends from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Parentage {
    parents: Vec<Vec<usize>>,
}

impl Parentage {
    pub fn new() -> Parentage {
        Parentage::default()
    }

    /// Records the parents of the individual at output `position`.
    pub fn record(&mut self, position: usize, parents: Vec<usize>) {
        if self.parents.len() <= position {
            self.parents.resize(position + 1, vec![]);
        }
        self.parents[position] = parents;
    }

    /// Parents of the individual at `position`; empty if none were recorded.
    pub fn parents_of(&self, position: usize) -> &[usize] {
        self.parents.get(position).map_or(&[], Vec::as_slice)
    }

    /// Sorted union of the parents of several positions.
    pub fn union_of(&self, positions: impl IntoIterator<Item = usize>) -> Vec<usize> {
        let mut union: Vec<usize> = positions
            .into_iter()
            .flat_map(|p| self.parents_of(p).iter().copied())
            .collect();
        union.sort_unstable();
        union.dedup();
        union
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn clear(&mut self) {
        self.parents.clear()
    }
}

/// A node of a breeding tree.
///
/// Instances are created blank by a [`Registry`] factory, configured
/// once with [`setup`](BreedingSource::setup) and from then on only
/// cloned (see [`Template`](crate::prototype::Template)).
pub trait BreedingSource<I: Individual>: SourceClone<I> + Send + Sync + fmt::Debug {
    /// The identifier the operator is registered under.
    fn name(&self) -> &'static str;

    /// Number of children: 0 for selection methods.
    fn num_sources(&self) -> usize;

    /// Parameter base consulted when a key is absent under the
    /// node's own base.
    fn default_base(&self) -> ParameterPath {
        ParameterPath::new(self.name())
    }

    /// Reads the node's parameters under `base`, and sets up its
    /// children.
    fn setup(&mut self, ctx: &SetupContext<'_, I>, base: &ParameterPath) -> Result<()>;

    /// How many individuals a `produce` call typically yields.
    fn typical_inds_produced(&self) -> usize;

    fn prepare_to_produce(
        &mut self,
        _subpop: usize,
        _state: &mut BreedingState<'_, I>,
    ) -> Result<()> {
        Ok(())
    }

    /// Appends between `min` and `max` individuals to `output`,
    /// returning how many were appended. When `parentage` is given,
    /// the parents of every appended individual are recorded at its
    /// position in `output`.
    fn produce(
        &mut self,
        min: usize,
        max: usize,
        subpop: usize,
        output: &mut Vec<Arc<I>>,
        state: &mut BreedingState<'_, I>,
        parentage: Option<&mut Parentage>,
    ) -> Result<usize>;

    fn finish_producing(
        &mut self,
        _subpop: usize,
        _state: &mut BreedingState<'_, I>,
    ) -> Result<()> {
        Ok(())
    }

    /// Whether the node hands out aliased population members.
    fn is_selection(&self) -> bool {
        false
    }
}

/// Deep copy of a boxed breeding source.
pub trait SourceClone<I> {
    fn box_clone(&self) -> Box<dyn BreedingSource<I>>;
}

impl<I, T> SourceClone<I> for T
where
    I: Individual,
    T: BreedingSource<I> + Clone + 'static,
{
    fn box_clone(&self) -> Box<dyn BreedingSource<I>> {
        Box::new(self.clone())
    }
}

impl<I: Individual> Clone for Box<dyn BreedingSource<I>> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Calls `source.produce`, checking the production contract.
///
/// # Errors
/// Whatever `produce` returns, or a contract violation if `min > max`,
/// or if the count returned is outside `[min, max]` or differs from
/// the number of individuals actually appended.
pub fn checked_produce<I: Individual>(
    source: &mut dyn BreedingSource<I>,
    min: usize,
    max: usize,
    subpop: usize,
    output: &mut Vec<Arc<I>>,
    state: &mut BreedingState<'_, I>,
    parentage: Option<&mut Parentage>,
) -> Result<usize> {
    let violation = |message| EcError::ContractViolation {
        operator: source.name(),
        message,
    };
    if min > max {
        return Err(violation(format!("asked for between {} and {} individuals", min, max)));
    }
    let before = output.len();
    let n = source.produce(min, max, subpop, output, state, parentage)?;
    let appended = output.len() - before;
    if n < min || n > max || n != appended {
        return Err(EcError::ContractViolation {
            operator: source.name(),
            message: format!(
                "asked for {}..={} individuals, returned {} and appended {}",
                min, max, n, appended
            ),
        });
    }
    Ok(n)
}

/// A production bracket for one (subpopulation, thread) pair.
///
/// Beginning one prepares the tree; `produce` is only reachable
/// while it is open; finishing it consumes the bracket.
///
/// # Examples
/// ```
/// # use oxiec::individual::{Individual, Population, Subpopulation};
/// # #[derive(Clone, Debug)]
/// # struct Score(f64);
/// # impl Individual for Score {
/// #     fn is_evaluated(&self) -> bool { true }
/// #     fn set_evaluated(&mut self, _: bool) {}
/// #     fn fitness(&self) -> f64 { self.0 }
/// # }
/// use oxiec::breeding::{BreedingState, Production};
/// use oxiec::params::{ParameterDatabase, ParameterPath};
/// use oxiec::prototype::{Registry, SetupContext, Template};
/// use oxiec::rng::ThreadRandom;
///
/// let params =
///     ParameterDatabase::from_source("pipe = select.tournament\nselect.tournament.size = 2\n");
/// let registry = Registry::<Score>::with_core_operators();
/// let ctx = SetupContext::new(&params, &registry);
/// let template = Template::from_config(&ctx, &ParameterPath::new("pipe"), None).unwrap();
///
/// let population = Population::new(vec![Subpopulation::new(vec![Score(1.0), Score(2.0)])]);
/// let mut random = ThreadRandom::seeded(0, 0);
/// let mut state = BreedingState::new(&population, 0, &mut random);
/// let mut source = template.instantiate();
///
/// let mut output = vec![];
/// let mut production = Production::begin(source.as_mut(), 0, &mut state).unwrap();
/// while output.len() < 5 {
///     let remaining = 5 - output.len();
///     production.produce(1, remaining, &mut output, None).unwrap();
/// }
/// production.finish().unwrap();
/// assert_eq!(output.len(), 5);
/// ```
pub struct Production<'s, 'a, I: Individual> {
    source: &'s mut dyn BreedingSource<I>,
    state: &'s mut BreedingState<'a, I>,
    subpop: usize,
}

impl<'s, 'a, I: Individual> Production<'s, 'a, I> {
    /// Calls `prepare_to_produce` and opens the bracket.
    pub fn begin(
        source: &'s mut dyn BreedingSource<I>,
        subpop: usize,
        state: &'s mut BreedingState<'a, I>,
    ) -> Result<Production<'s, 'a, I>> {
        source.prepare_to_produce(subpop, state)?;
        Ok(Production {
            source,
            state,
            subpop,
        })
    }

    /// A contract-checked `produce` on the bracket's tree.
    pub fn produce(
        &mut self,
        min: usize,
        max: usize,
        output: &mut Vec<Arc<I>>,
        parentage: Option<&mut Parentage>,
    ) -> Result<usize> {
        checked_produce(
            &mut *self.source,
            min,
            max,
            self.subpop,
            output,
            &mut *self.state,
            parentage,
        )
    }

    /// Calls `finish_producing` and closes the bracket.
    pub fn finish(self) -> Result<()> {
        self.source.finish_producing(self.subpop, self.state)
    }
}

/// Registers the selection methods and pipelines that work on
/// any individual.
pub fn register_core_operators<I: Individual>(registry: &mut Registry<I>) {
    selection::register_operators(registry);
    pipeline::register_operators(registry);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parentage_grows_and_unions() {
        let mut p = Parentage::new();
        p.record(2, vec![4, 1]);
        p.record(0, vec![1, 3]);
        assert_eq!(p.len(), 3);
        assert!(p.parents_of(1).is_empty());
        assert!(p.parents_of(9).is_empty());
        assert_eq!(p.union_of([0, 1, 2]), vec![1, 3, 4]);
        p.clear();
        assert!(p.is_empty());
    }
}
