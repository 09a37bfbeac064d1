//! The generational breeder: turns one population into the next
//! by running each subpopulation's breeding tree.
use crate::breeding::{BreedingState, Production};
use crate::individual::{Individual, Population, Subpopulation};
use crate::params::{ParameterDatabase, ParameterPath};
use crate::prototype::{SetupContext, Template};
use crate::rng::ThreadRandom;
use crate::{EcError, Result};

use log::{debug, info};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub const P_SUBPOPS: &str = "pop.subpops";
pub const P_SUBPOP: &str = "pop.subpop";
pub const P_SIZE: &str = "size";
pub const P_SPECIES_PIPE: &str = "species.pipe";
pub const P_ELITE: &str = "breed.elite";
pub const P_BREED_THREADS: &str = "breedthreads";
pub const P_SEED: &str = "seed.0";
/// Seed value asking for a clock-derived seed.
pub const V_SEED_TIME: &str = "time";

/// How one subpopulation is bred.
#[derive(Clone, Debug)]
struct Plan<I: Individual> {
    template: Template<I>,
    size: usize,
    elite: usize,
}

/// Breeds whole populations.
///
/// Each generation, the best `breed.elite.N` individuals of
/// subpopulation `N` are copied over unchanged; the rest of the
/// `pop.subpop.N.size` slots are split into `breedthreads` disjoint
/// slices, each filled by its own clone of the subpopulation's
/// breeding tree with its own random generator.
#[derive(Debug)]
pub struct Breeder<I: Individual> {
    plans: Vec<Plan<I>>,
    randoms: Vec<ThreadRandom>,
    seed: u64,
}

impl<I: Individual> Breeder<I> {
    /// Reads the population layout and builds every subpopulation's
    /// breeding tree.
    ///
    /// # Errors
    /// Missing or malformed `pop.subpops` / `pop.subpop.N.size`, out of
    /// range sizes, elite counts or thread counts, and any error setting
    /// up a tree.
    pub fn setup(ctx: &SetupContext<'_, I>) -> Result<Breeder<I>> {
        let params = ctx.params;
        let subpops_path = ParameterPath::new(P_SUBPOPS);
        let count = params.get_int(&subpops_path, None)?;
        if count < 1 {
            return Err(EcError::range(&subpops_path, "there must be at least one subpopulation"));
        }

        let mut plans = Vec::with_capacity(count as usize);
        for n in 0..count as usize {
            let base = ParameterPath::new(P_SUBPOP).push_index(n);
            let size_path = base.push(P_SIZE);
            let size = params.get_int(&size_path, None)?;
            if size < 1 {
                return Err(EcError::range(&size_path, "subpopulation size must be at least 1"));
            }
            let elite_path = ParameterPath::new(P_ELITE).push_index(n);
            let elite = params.get_int_with_default(&elite_path, None, 0);
            if elite < 0 || elite > size {
                return Err(EcError::range(
                    &elite_path,
                    format!("elite count must be between 0 and {}", size),
                ));
            }
            let template = Template::from_config(ctx, &base.push(P_SPECIES_PIPE), None)?;
            info!(
                "subpopulation {}: {} individuals ({} elite), bred by {}",
                n,
                size,
                elite,
                template.name()
            );
            plans.push(Plan {
                template,
                size: size as usize,
                elite: elite as usize,
            });
        }

        let threads_path = ParameterPath::new(P_BREED_THREADS);
        let threads = params.get_int_with_default(&threads_path, None, 1);
        if threads < 1 {
            return Err(EcError::range(&threads_path, "there must be at least one breeding thread"));
        }
        let seed = read_seed(params)?;
        debug!("breeding with {} threads, seed {}", threads, seed);

        Ok(Breeder {
            plans,
            randoms: (0..threads as usize)
                .map(|thread| ThreadRandom::seeded(seed, thread))
                .collect(),
            seed,
        })
    }

    pub fn threads(&self) -> usize {
        self.randoms.len()
    }

    /// The run seed, as read from `seed.0`.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn subpop_count(&self) -> usize {
        self.plans.len()
    }

    /// Configured size of subpopulation `index`.
    pub fn subpop_size(&self, index: usize) -> Option<usize> {
        self.plans.get(index).map(|p| p.size)
    }

    /// Breeds the generation that follows `population`.
    ///
    /// Nothing is returned unless every subpopulation and every
    /// thread succeeded.
    pub fn breed(&mut self, population: &Population<I>) -> Result<Population<I>> {
        if population.subpops().len() != self.plans.len() {
            return Err(EcError::ContractViolation {
                operator: "breeder",
                message: format!(
                    "configured for {} subpopulations, given {}",
                    self.plans.len(),
                    population.subpops().len()
                ),
            });
        }

        let mut next = Vec::with_capacity(self.plans.len());
        for (index, plan) in self.plans.iter().enumerate() {
            let subpop = population.subpop(index)?;
            let mut individuals: Vec<Arc<I>> = subpop
                .best_indices(plan.elite)
                .into_iter()
                .map(|i| Arc::new(I::clone(&subpop.individuals()[i])))
                .collect();

            let quotas = split(plan.size - individuals.len(), self.randoms.len());
            let slices = self
                .randoms
                .par_iter_mut()
                .zip(quotas)
                .enumerate()
                .map(|(thread, (random, quota))| {
                    produce_slice(&plan.template, population, index, thread, quota, random)
                })
                .collect::<Result<Vec<_>>>()?;
            for slice in slices {
                individuals.extend(slice);
            }
            next.push(Subpopulation::from_shared(individuals));
        }
        debug!("bred generation {}", population.generation() + 1);
        Ok(population.next_generation(next))
    }
}

fn produce_slice<I: Individual>(
    template: &Template<I>,
    population: &Population<I>,
    subpop: usize,
    thread: usize,
    quota: usize,
    random: &mut ThreadRandom,
) -> Result<Vec<Arc<I>>> {
    let mut output = Vec::with_capacity(quota);
    if quota == 0 {
        return Ok(output);
    }
    let mut source = template.instantiate();
    let mut state = BreedingState::new(population, thread, random);
    let mut production = Production::begin(source.as_mut(), subpop, &mut state)?;
    while output.len() < quota {
        let remaining = quota - output.len();
        production.produce(1, remaining, &mut output, None)?;
    }
    production.finish()?;
    Ok(output)
}

/// Splits `total` into `parts` near-equal shares, larger ones first.
fn split(total: usize, parts: usize) -> Vec<usize> {
    (0..parts)
        .map(|i| total / parts + usize::from(i < total % parts))
        .collect()
}

fn read_seed(params: &ParameterDatabase) -> Result<u64> {
    let path = ParameterPath::new(P_SEED);
    match params.get_string(&path, None) {
        Some(value) if value.eq_ignore_ascii_case(V_SEED_TIME) => Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64)),
        Some(_) => Ok(params.get_long(&path, None)? as u64),
        None => Ok(0),
    }
}
