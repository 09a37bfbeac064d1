use super::PipelineSources;
use crate::breeding::{BreedingSource, BreedingState, Parentage};
use crate::individual::Individual;
use crate::params::{ParameterDatabase, ParameterPath};
use crate::prototype::SetupContext;
use crate::rng::ThreadRandom;
use crate::Result;

use std::fmt;
use std::sync::Arc;

/// A single-parent variation operator for some representation.
pub trait Mutation<I>: Clone + Send + Sync + fmt::Debug + 'static {
    /// The identifier the pipeline is registered under. Also its
    /// default parameter base.
    fn name(&self) -> &'static str;

    fn setup(
        &mut self,
        _params: &ParameterDatabase,
        _base: &ParameterPath,
        _default_base: &ParameterPath,
    ) -> Result<()> {
        Ok(())
    }

    /// Mutates an exclusively owned individual in place.
    fn mutate(&self, individual: &mut I, random: &mut ThreadRandom) -> Result<()>;
}

/// Mutates copies of what its single source produces.
#[derive(Clone, Debug)]
pub struct MutationPipeline<I: Individual, M> {
    sources: PipelineSources<I>,
    mutation: M,
}

impl<I: Individual, M: Mutation<I>> MutationPipeline<I, M> {
    pub fn new(mutation: M) -> MutationPipeline<I, M> {
        MutationPipeline {
            sources: PipelineSources::default(),
            mutation,
        }
    }

    pub fn mutation(&self) -> &M {
        &self.mutation
    }
}

impl<I: Individual, M: Mutation<I>> BreedingSource<I> for MutationPipeline<I, M> {
    fn name(&self) -> &'static str {
        self.mutation.name()
    }

    fn num_sources(&self) -> usize {
        1
    }

    fn setup(&mut self, ctx: &SetupContext<'_, I>, base: &ParameterPath) -> Result<()> {
        let def = self.default_base();
        self.sources = PipelineSources::setup(ctx, base, &def, self.num_sources())?;
        self.mutation.setup(ctx.params, base, &def)
    }

    fn typical_inds_produced(&self) -> usize {
        self.sources.typical_inds_produced()
    }

    fn prepare_to_produce(
        &mut self,
        subpop: usize,
        state: &mut BreedingState<'_, I>,
    ) -> Result<()> {
        self.sources.prepare_to_produce(subpop, state)
    }

    fn produce(
        &mut self,
        min: usize,
        max: usize,
        subpop: usize,
        output: &mut Vec<Arc<I>>,
        state: &mut BreedingState<'_, I>,
        parentage: Option<&mut Parentage>,
    ) -> Result<usize> {
        let start = output.len();
        let n = self
            .sources
            .produce_owned(0, min, max, subpop, output, state, parentage)?;
        if self.sources.bypass(state.random) {
            return Ok(n);
        }
        for individual in &mut output[start..] {
            let individual = Arc::make_mut(individual);
            self.mutation.mutate(individual, state.random)?;
            individual.set_evaluated(false);
        }
        Ok(n)
    }

    fn finish_producing(&mut self, subpop: usize, state: &mut BreedingState<'_, I>) -> Result<()> {
        self.sources.finish_producing(subpop, state)
    }
}
