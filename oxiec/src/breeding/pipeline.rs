//! Breeding pipelines: internal tree nodes that transform what
//! their children produce.
mod crossover;
mod mutation;
mod reproduction;

pub use crossover::{CrossoverPipeline, Recombination};
pub use mutation::{Mutation, MutationPipeline};
pub use reproduction::ReproductionPipeline;

use super::{checked_produce, BreedingSource, BreedingState, Parentage};
use crate::individual::Individual;
use crate::params::ParameterPath;
use crate::prototype::{Registry, SetupContext};
use crate::rng::ThreadRandom;
use crate::{EcError, Result};

use log::debug;
use std::sync::Arc;

pub const P_SOURCE: &str = "source";
pub const P_LIKELIHOOD: &str = "likelihood";
/// Slot value that reuses the previous slot's child.
pub const V_SAME: &str = "same";

/// The children of a pipeline.
///
/// Once set up there is one slot per declared source. A slot
/// configured as `same` shares the previous slot's child, so asking
/// either slot for individuals advances the same node.
#[derive(Clone, Debug)]
pub struct PipelineSources<I: Individual> {
    sources: Vec<Box<dyn BreedingSource<I>>>,
    slots: Vec<usize>,
    likelihood: f64,
}

impl<I: Individual> PipelineSources<I> {
    /// Reads `count` children from `base.source.N` (falling back to
    /// `default_base.source.N`) and sets each one up under its own
    /// path, then reads `likelihood`.
    ///
    /// # Errors
    /// Any error from instantiating or setting up a child, or a range
    /// violation if `likelihood` lies outside `[0, 1]`.
    pub fn setup(
        ctx: &SetupContext<'_, I>,
        base: &ParameterPath,
        default_base: &ParameterPath,
        count: usize,
    ) -> Result<PipelineSources<I>> {
        let mut sources: Vec<Box<dyn BreedingSource<I>>> = Vec::with_capacity(count);
        let mut slots = Vec::with_capacity(count);
        for n in 0..count {
            let path = base.push(P_SOURCE).push_index(n);
            let def = default_base.push(P_SOURCE).push_index(n);
            if n > 0 && ctx.params.get_string(&path, Some(&def)).as_deref() == Some(V_SAME) {
                slots.push(slots[n - 1]);
                continue;
            }
            let mut source = ctx.registry.instance_for(ctx.params, &path, Some(&def))?;
            source.setup(ctx, &path)?;
            debug!("{} source {} is {}", base, n, source.name());
            slots.push(sources.len());
            sources.push(source);
        }

        let path = base.push(P_LIKELIHOOD);
        let likelihood =
            ctx.params
                .get_double_with_default(&path, Some(&default_base.push(P_LIKELIHOOD)), 1.0);
        if !(0.0..=1.0).contains(&likelihood) {
            return Err(EcError::range(&path, "likelihood must be between 0.0 and 1.0 inclusive"));
        }

        Ok(PipelineSources {
            sources,
            slots,
            likelihood,
        })
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether two slots share one child.
    pub fn same(&self, a: usize, b: usize) -> bool {
        self.slots[a] == self.slots[b]
    }

    pub fn source(&self, slot: usize) -> &dyn BreedingSource<I> {
        self.sources[self.slots[slot]].as_ref()
    }

    pub fn likelihood(&self) -> f64 {
        self.likelihood
    }

    /// Draws once against `likelihood`: true if the pipeline should
    /// skip its transformation this time.
    pub fn bypass(&self, random: &mut ThreadRandom) -> bool {
        !random.next_bool(self.likelihood)
    }

    /// The smallest typical yield among the children.
    pub fn typical_inds_produced(&self) -> usize {
        self.sources
            .iter()
            .map(|s| s.typical_inds_produced())
            .min()
            .unwrap_or(1)
    }

    pub fn prepare_to_produce(
        &mut self,
        subpop: usize,
        state: &mut BreedingState<'_, I>,
    ) -> Result<()> {
        for source in &mut self.sources {
            source.prepare_to_produce(subpop, state)?;
        }
        Ok(())
    }

    pub fn finish_producing(
        &mut self,
        subpop: usize,
        state: &mut BreedingState<'_, I>,
    ) -> Result<()> {
        for source in &mut self.sources {
            source.finish_producing(subpop, state)?;
        }
        Ok(())
    }

    /// Asks the child in `slot` for individuals, checking its contract.
    #[allow(clippy::too_many_arguments)]
    pub fn produce_from(
        &mut self,
        slot: usize,
        min: usize,
        max: usize,
        subpop: usize,
        output: &mut Vec<Arc<I>>,
        state: &mut BreedingState<'_, I>,
        parentage: Option<&mut Parentage>,
    ) -> Result<usize> {
        let source = self.sources[self.slots[slot]].as_mut();
        checked_produce(source, min, max, subpop, output, state, parentage)
    }

    /// Like [`produce_from`](Self::produce_from), but makes every
    /// appended individual exclusively owned, copying any that is
    /// shared with the population.
    #[allow(clippy::too_many_arguments)]
    pub fn produce_owned(
        &mut self,
        slot: usize,
        min: usize,
        max: usize,
        subpop: usize,
        output: &mut Vec<Arc<I>>,
        state: &mut BreedingState<'_, I>,
        parentage: Option<&mut Parentage>,
    ) -> Result<usize> {
        let start = output.len();
        let n = self.produce_from(slot, min, max, subpop, output, state, parentage)?;
        for individual in &mut output[start..] {
            Arc::make_mut(individual);
        }
        Ok(n)
    }
}

impl<I: Individual> Default for PipelineSources<I> {
    fn default() -> Self {
        PipelineSources {
            sources: vec![],
            slots: vec![],
            likelihood: 1.0,
        }
    }
}

pub(super) fn register_operators<I: Individual>(registry: &mut Registry<I>) {
    registry.register(ReproductionPipeline::<I>::NAME, || {
        Box::new(ReproductionPipeline::<I>::default())
    });
}
