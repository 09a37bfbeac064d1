use super::PipelineSources;
use crate::breeding::{BreedingSource, BreedingState, Parentage};
use crate::individual::Individual;
use crate::params::ParameterPath;
use crate::prototype::SetupContext;
use crate::Result;

use std::sync::Arc;

/// Passes on copies of what its single source produces.
///
/// Copies keep their evaluated flag and fitness.
#[derive(Clone, Debug)]
pub struct ReproductionPipeline<I: Individual> {
    sources: PipelineSources<I>,
}

impl<I: Individual> ReproductionPipeline<I> {
    pub const NAME: &'static str = "breed.reproduction";
}

impl<I: Individual> Default for ReproductionPipeline<I> {
    fn default() -> Self {
        ReproductionPipeline {
            sources: PipelineSources::default(),
        }
    }
}

impl<I: Individual> BreedingSource<I> for ReproductionPipeline<I> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn num_sources(&self) -> usize {
        1
    }

    fn setup(&mut self, ctx: &SetupContext<'_, I>, base: &ParameterPath) -> Result<()> {
        self.sources = PipelineSources::setup(ctx, base, &self.default_base(), self.num_sources())?;
        Ok(())
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
        self.sources
            .produce_owned(0, min, max, subpop, output, state, parentage)
    }

    fn finish_producing(&mut self, subpop: usize, state: &mut BreedingState<'_, I>) -> Result<()> {
        self.sources.finish_producing(subpop, state)
    }
}
