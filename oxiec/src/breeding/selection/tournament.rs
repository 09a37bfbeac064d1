use super::SelectionMethod;
use crate::individual::{by_fitness, Individual, Subpopulation};
use crate::params::ParameterPath;
use crate::prototype::SetupContext;
use crate::rng::ThreadRandom;
use crate::{EcError, Result};

use std::cmp::Ordering;

const P_SIZE: &str = "size";
const P_PICK_WORST: &str = "pick-worst";

/// Picks the best (or worst) of `size` uniformly drawn individuals.
///
/// Parameters: `size` (at least 1, required) and `pick-worst`
/// (default false).
#[derive(Clone, Debug)]
pub struct TournamentSelection {
    size: usize,
    pick_worst: bool,
}

impl TournamentSelection {
    pub const NAME: &'static str = "select.tournament";

    pub fn new(size: usize, pick_worst: bool) -> TournamentSelection {
        TournamentSelection {
            size: size.max(1),
            pick_worst,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Default for TournamentSelection {
    fn default() -> Self {
        TournamentSelection::new(2, false)
    }
}

impl<I: Individual> SelectionMethod<I> for TournamentSelection {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn setup(&mut self, ctx: &SetupContext<'_, I>, base: &ParameterPath) -> Result<()> {
        let def = SelectionMethod::<I>::default_base(self);
        let size_path = base.push(P_SIZE);
        let size = ctx.params.get_int_min(&size_path, Some(&def.push(P_SIZE)), 1);
        if size < 1 {
            return Err(EcError::range(&size_path, "tournament size must be at least 1"));
        }
        self.size = size as usize;
        self.pick_worst =
            ctx.params
                .get_boolean(&base.push(P_PICK_WORST), Some(&def.push(P_PICK_WORST)), false);
        Ok(())
    }

    fn select_index(
        &mut self,
        subpop: &Subpopulation<I>,
        random: &mut ThreadRandom,
    ) -> Result<usize> {
        let individuals = subpop.individuals();
        let wanted = if self.pick_worst {
            Ordering::Less
        } else {
            Ordering::Greater
        };
        let mut best = random.next_index(individuals.len());
        for _ in 1..self.size {
            let candidate = random.next_index(individuals.len());
            if by_fitness::<I>(&individuals[candidate], &individuals[best]) == wanted {
                best = candidate;
            }
        }
        Ok(best)
    }
}
