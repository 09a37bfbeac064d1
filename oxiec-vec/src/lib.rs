//! # OxiEC-Vec
//! Fixed-length vector genomes for the `oxiec` crate's breeding pipelines.
//!
//! Provides [`VectorIndividual`], generic over bit (`bool`) and integer
//! (`i64`) genes, along with a chunk-wise [`VectorCrossover`] and a
//! per-gene [`VectorMutation`]. Calling [`register_operators`] makes them
//! available to parameter files as `vector.xover` and `vector.mutate`.
//!
//! Operator settings are read under the pipeline's own parameter base,
//! then its default base, then the species-wide `vector` base, so a
//! single `vector.mutation-prob = 0.05` configures every mutation
//! pipeline in a run.
//!
//! [`VectorIndividual`]: crate::genomics::VectorIndividual
//! [`VectorCrossover`]: crate::operators::VectorCrossover
//! [`VectorMutation`]: crate::operators::VectorMutation
//!
//! # Example usage: breeding bit vectors
//! ```
//! use oxiec::{
//!     Breeder, Individual, ParameterDatabase, Population, Registry, SetupContext, Subpopulation,
//! };
//! use oxiec::rng::ThreadRandom;
//! use oxiec_vec::genomics::{GeneBounds, VectorIndividual};
//!
//! let params = ParameterDatabase::from_source(
//!     "pop.subpops = 1\n\
//!      pop.subpop.0.size = 10\n\
//!      pop.subpop.0.species.pipe = vector.mutate\n\
//!      pop.subpop.0.species.pipe.source.0 = vector.xover\n\
//!      vector.xover.source.0 = select.tournament\n\
//!      vector.xover.source.1 = same\n\
//!      select.tournament.size = 2\n\
//!      vector.mutation-prob = 0.05\n\
//!      vector.crossover-type = two\n\
//!      seed.0 = 1\n",
//! );
//! let mut registry = Registry::with_core_operators();
//! oxiec_vec::register_operators::<bool>(&mut registry);
//! let mut breeder = Breeder::setup(&SetupContext::new(&params, &registry)).unwrap();
//!
//! let mut random = ThreadRandom::seeded(1, 0);
//! let individuals = (0..10)
//!     .map(|_| {
//!         let mut individual =
//!             VectorIndividual::<bool>::random(16, &GeneBounds::default(), &mut random);
//!         individual.set_fitness(individual.gene_sum());
//!         individual
//!     })
//!     .collect();
//! let next = breeder.breed(&Population::new(vec![Subpopulation::new(individuals)])).unwrap();
//!
//! assert_eq!(next.subpops()[0].len(), 10);
//! assert!(next.subpops()[0].iter().all(|i| i.len() == 16 && !i.is_evaluated()));
//! ```

pub mod genomics;
pub mod operators;

use genomics::{Gene, VectorIndividual};
use oxiec::breeding::pipeline::{CrossoverPipeline, MutationPipeline};
use oxiec::Registry;
use operators::{VectorCrossover, VectorMutation};

/// Species-wide parameter base for vector settings.
pub const P_VECTOR: &str = "vector";

/// Registers the vector crossover and mutation pipelines for genes of type `G`.
pub fn register_operators<G: Gene>(registry: &mut Registry<VectorIndividual<G>>) {
    registry.register(operators::XOVER_IDENTIFIER, || {
        Box::new(CrossoverPipeline::<VectorIndividual<G>, VectorCrossover>::new(
            VectorCrossover::default(),
        ))
    });
    registry.register(operators::MUTATE_IDENTIFIER, || {
        Box::new(MutationPipeline::<VectorIndividual<G>, VectorMutation>::new(
            VectorMutation::default(),
        ))
    });
}
