use super::PipelineSources;
use crate::breeding::{BreedingSource, BreedingState, Parentage};
use crate::individual::Individual;
use crate::params::{ParameterDatabase, ParameterPath};
use crate::prototype::SetupContext;
use crate::rng::ThreadRandom;
use crate::{EcError, Result};

use std::fmt;
use std::sync::Arc;

const P_TOSS: &str = "toss";

/// A two-parent recombination operator for some representation.
pub trait Recombination<I>: Clone + Send + Sync + fmt::Debug + 'static {
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

    /// Recombines two exclusively owned parents in place.
    ///
    /// # Errors
    /// [`EcError::StructuralMismatch`] if the parents cannot be
    /// combined.
    fn recombine(&self, first: &mut I, second: &mut I, random: &mut ThreadRandom) -> Result<()>;
}

/// Pulls parents in pairs from two sources and recombines them.
///
/// Parameters, besides those of the recombination:
/// `source.0`, `source.1` (the second may be `same`), `likelihood`
/// and `toss`. With `toss` set only the first child of each pair is
/// kept. Pairs are always produced whole: when the requested count is
/// odd the unused half of the last pair is discarded.
#[derive(Clone, Debug)]
pub struct CrossoverPipeline<I: Individual, X> {
    sources: PipelineSources<I>,
    recombination: X,
    toss: bool,
}

impl<I: Individual, X: Recombination<I>> CrossoverPipeline<I, X> {
    pub fn new(recombination: X) -> CrossoverPipeline<I, X> {
        CrossoverPipeline {
            sources: PipelineSources::default(),
            recombination,
            toss: false,
        }
    }

    pub fn recombination(&self) -> &X {
        &self.recombination
    }

    pub fn tosses(&self) -> bool {
        self.toss
    }
}

impl<I: Individual, X: Recombination<I>> BreedingSource<I> for CrossoverPipeline<I, X> {
    fn name(&self) -> &'static str {
        self.recombination.name()
    }

    fn num_sources(&self) -> usize {
        2
    }

    fn setup(&mut self, ctx: &SetupContext<'_, I>, base: &ParameterPath) -> Result<()> {
        let def = self.default_base();
        self.sources = PipelineSources::setup(ctx, base, &def, self.num_sources())?;
        self.toss = ctx
            .params
            .get_boolean(&base.push(P_TOSS), Some(&def.push(P_TOSS)), false);
        self.recombination.setup(ctx.params, base, &def)
    }

    fn typical_inds_produced(&self) -> usize {
        if self.toss {
            1
        } else {
            2
        }
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
        mut parentage: Option<&mut Parentage>,
    ) -> Result<usize> {
        let n = self.typical_inds_produced().max(min).min(max);

        if self.sources.bypass(state.random) {
            return self
                .sources
                .produce_owned(0, n, n, subpop, output, state, parentage);
        }

        let mut parents = Vec::with_capacity(2);
        let mut parents_parentage = parentage.is_some().then(Parentage::new);
        let mut produced = 0;
        while produced < n {
            parents.clear();
            if let Some(bag) = parents_parentage.as_mut() {
                bag.clear();
            }
            if self.sources.same(0, 1) {
                self.sources.produce_owned(
                    0, 2, 2,
                    subpop,
                    &mut parents,
                    state,
                    parents_parentage.as_mut(),
                )?;
            } else {
                self.sources.produce_owned(
                    0, 1, 1,
                    subpop,
                    &mut parents,
                    state,
                    parents_parentage.as_mut(),
                )?;
                self.sources.produce_owned(
                    1, 1, 1,
                    subpop,
                    &mut parents,
                    state,
                    parents_parentage.as_mut(),
                )?;
            }

            let second = parents.pop();
            let first = parents.pop();
            let (mut first, mut second) = match (first, second) {
                (Some(first), Some(second)) => (first, second),
                _ => {
                    return Err(EcError::ContractViolation {
                        operator: self.name(),
                        message: "sources did not yield two parents".to_string(),
                    })
                }
            };
            self.recombination.recombine(
                Arc::make_mut(&mut first),
                Arc::make_mut(&mut second),
                state.random,
            )?;
            let lineage = parents_parentage.as_ref().map(|bag| bag.union_of(0..2));

            for (child, keep) in [(first, true), (second, !self.toss)] {
                if !keep || produced == n {
                    continue;
                }
                let mut child = child;
                Arc::make_mut(&mut child).set_evaluated(false);
                if let (Some(bag), Some(lineage)) = (parentage.as_deref_mut(), &lineage) {
                    bag.record(output.len(), lineage.clone());
                }
                output.push(child);
                produced += 1;
            }
        }
        Ok(n)
    }

    fn finish_producing(&mut self, subpop: usize, state: &mut BreedingState<'_, I>) -> Result<()> {
        self.sources.finish_producing(subpop, state)
    }
}
