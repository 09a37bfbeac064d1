use super::SelectionMethod;
use crate::individual::{Individual, Subpopulation};
use crate::rng::ThreadRandom;
use crate::Result;

/// Picks uniformly at random.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomSelection;

impl RandomSelection {
    pub const NAME: &'static str = "select.random";
}

impl<I: Individual> SelectionMethod<I> for RandomSelection {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn select_index(
        &mut self,
        subpop: &Subpopulation<I>,
        random: &mut ThreadRandom,
    ) -> Result<usize> {
        Ok(random.next_index(subpop.len()))
    }
}

/// Always picks the first individual. Mostly useful in tests
/// and for deterministic setups.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstSelection;

impl FirstSelection {
    pub const NAME: &'static str = "select.first";
}

impl<I: Individual> SelectionMethod<I> for FirstSelection {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn select_index(
        &mut self,
        _subpop: &Subpopulation<I>,
        _random: &mut ThreadRandom,
    ) -> Result<usize> {
        Ok(0)
    }
}
