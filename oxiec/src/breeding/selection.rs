//! Selection methods: breeding sources without children that
//! hand out individuals already in the population.
mod proportional;
mod random;
mod tournament;

pub use proportional::FitProportionateSelection;
pub use random::{FirstSelection, RandomSelection};
pub use tournament::TournamentSelection;

use super::{BreedingSource, BreedingState, Parentage};
use crate::individual::{Individual, Subpopulation};
use crate::params::ParameterPath;
use crate::prototype::{Registry, SetupContext};
use crate::rng::ThreadRandom;
use crate::{EcError, Result};

use std::fmt;
use std::sync::Arc;

/// A way of choosing one member of a subpopulation.
pub trait SelectionMethod<I: Individual>: Clone + Send + Sync + fmt::Debug + 'static {
    /// The identifier the method is registered under.
    fn name(&self) -> &'static str;

    fn default_base(&self) -> ParameterPath {
        ParameterPath::new(self.name())
    }

    fn setup(&mut self, _ctx: &SetupContext<'_, I>, _base: &ParameterPath) -> Result<()> {
        Ok(())
    }

    /// Called once per production bracket, before any selection.
    fn prepare_to_produce(&mut self, _subpop: &Subpopulation<I>) -> Result<()> {
        Ok(())
    }

    /// Returns the position of the chosen individual in `subpop`.
    /// `subpop` is never empty.
    fn select_index(
        &mut self,
        subpop: &Subpopulation<I>,
        random: &mut ThreadRandom,
    ) -> Result<usize>;

    fn finish_producing(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Adapts a [`SelectionMethod`] into a breeding source.
///
/// Each `produce` call yields `clamp(1, min, max)` individuals, each
/// an alias of the chosen population slot.
#[derive(Clone, Debug, Default)]
pub struct Selector<S> {
    method: S,
}

impl<S> Selector<S> {
    pub fn new(method: S) -> Selector<S> {
        Selector { method }
    }

    pub fn method(&self) -> &S {
        &self.method
    }
}

impl<I, S> BreedingSource<I> for Selector<S>
where
    I: Individual,
    S: SelectionMethod<I>,
{
    fn name(&self) -> &'static str {
        self.method.name()
    }

    fn num_sources(&self) -> usize {
        0
    }

    fn default_base(&self) -> ParameterPath {
        self.method.default_base()
    }

    fn setup(&mut self, ctx: &SetupContext<'_, I>, base: &ParameterPath) -> Result<()> {
        self.method.setup(ctx, base)
    }

    fn typical_inds_produced(&self) -> usize {
        1
    }

    fn prepare_to_produce(
        &mut self,
        subpop: usize,
        state: &mut BreedingState<'_, I>,
    ) -> Result<()> {
        self.method.prepare_to_produce(state.subpop(subpop)?)
    }

    fn produce(
        &mut self,
        min: usize,
        max: usize,
        subpop: usize,
        output: &mut Vec<Arc<I>>,
        state: &mut BreedingState<'_, I>,
        mut parentage: Option<&mut Parentage>,
    ) -> Result<usize> {
        let n = 1.max(min).min(max);
        let individuals = state.subpop(subpop)?;
        if individuals.is_empty() && n > 0 {
            return Err(EcError::ContractViolation {
                operator: self.method.name(),
                message: format!("cannot select from empty subpopulation {}", subpop),
            });
        }
        for _ in 0..n {
            let index = self.method.select_index(individuals, state.random)?;
            let chosen = individuals.individuals().get(index).ok_or_else(|| {
                EcError::ContractViolation {
                    operator: self.method.name(),
                    message: format!(
                        "selected index {} of a subpopulation of {}",
                        index,
                        individuals.len()
                    ),
                }
            })?;
            if let Some(parentage) = parentage.as_deref_mut() {
                parentage.record(output.len(), vec![index]);
            }
            output.push(Arc::clone(chosen));
        }
        Ok(n)
    }

    fn finish_producing(
        &mut self,
        _subpop: usize,
        _state: &mut BreedingState<'_, I>,
    ) -> Result<()> {
        self.method.finish_producing()
    }

    fn is_selection(&self) -> bool {
        true
    }
}

pub(super) fn register_operators<I: Individual>(registry: &mut Registry<I>) {
    registry.register(TournamentSelection::NAME, || {
        Box::new(Selector::new(TournamentSelection::default()))
    });
    registry.register(RandomSelection::NAME, || Box::new(Selector::new(RandomSelection)));
    registry.register(FirstSelection::NAME, || Box::new(Selector::new(FirstSelection)));
    registry.register(FitProportionateSelection::NAME, || {
        Box::new(Selector::new(FitProportionateSelection::default()))
    });
}
