use super::SelectionMethod;
use crate::individual::{Individual, Subpopulation};
use crate::rng::ThreadRandom;
use crate::{EcError, Result};

/// Roulette-wheel selection: picks each individual with probability
/// proportional to its fitness.
///
/// Fitnesses must be non-negative. If they are all zero the choice
/// is uniform. The wheel is rebuilt at the start of every production
/// bracket.
#[derive(Clone, Debug, Default)]
pub struct FitProportionateSelection {
    cumulative: Vec<f64>,
}

impl FitProportionateSelection {
    pub const NAME: &'static str = "select.fitprop";
}

impl<I: Individual> SelectionMethod<I> for FitProportionateSelection {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn prepare_to_produce(&mut self, subpop: &Subpopulation<I>) -> Result<()> {
        self.cumulative.clear();
        let mut total = 0.0;
        for (index, individual) in subpop.iter().enumerate() {
            let fitness = individual.fitness();
            if !(fitness >= 0.0) || !fitness.is_finite() {
                return Err(EcError::ContractViolation {
                    operator: Self::NAME,
                    message: format!("individual {} has fitness {}", index, fitness),
                });
            }
            total += fitness;
            self.cumulative.push(total);
        }
        Ok(())
    }

    fn select_index(
        &mut self,
        subpop: &Subpopulation<I>,
        random: &mut ThreadRandom,
    ) -> Result<usize> {
        if self.cumulative.len() != subpop.len() {
            return Err(EcError::ContractViolation {
                operator: Self::NAME,
                message: "selection outside a production bracket".to_string(),
            });
        }
        let total = self.cumulative.last().copied().unwrap_or(0.0);
        if total <= 0.0 {
            return Ok(random.next_index(subpop.len()));
        }
        let spin = random.next_double() * total;
        let index = self.cumulative.partition_point(|&c| c <= spin);
        Ok(index.min(subpop.len() - 1))
    }

    fn finish_producing(&mut self) -> Result<()> {
        self.cumulative.clear();
        Ok(())
    }
}
