//! A parameter-driven evolutionary computation framework.
//!
//! A run is described entirely by hierarchical parameter files: the
//! population layout, and for each subpopulation a tree of breeding
//! operators (selection methods at the leaves, pipelines above them)
//! named by identifier strings. At startup the identifiers are turned
//! into operators through a [`Registry`], each tree is set up once
//! from the parameters, and every generation the [`Breeder`] clones
//! the configured trees and runs them, one clone per breeding thread.
//!
//! The crate is generic over the individual type through the
//! [`Individual`] trait. A vector representation, with its crossover
//! and mutation operators, lives in the `oxiec-vec` crate.
//!
//! # Example usage: a reproduction-only tree
//! ```
//! use oxiec::{
//!     Breeder, Individual, ParameterDatabase, Population, Registry, SetupContext, Subpopulation,
//! };
//!
//! #[derive(Clone, Debug)]
//! struct Score {
//!     value: f64,
//!     evaluated: bool,
//! }
//!
//! impl Individual for Score {
//!     fn is_evaluated(&self) -> bool {
//!         self.evaluated
//!     }
//!     fn set_evaluated(&mut self, evaluated: bool) {
//!         self.evaluated = evaluated;
//!     }
//!     fn fitness(&self) -> f64 {
//!         self.value
//!     }
//! }
//!
//! let params = ParameterDatabase::from_source(
//!     "pop.subpops = 1\n\
//!      pop.subpop.0.size = 6\n\
//!      pop.subpop.0.species.pipe = breed.reproduction\n\
//!      pop.subpop.0.species.pipe.source.0 = select.tournament\n\
//!      select.tournament.size = 2\n\
//!      breed.elite.0 = 1\n\
//!      breedthreads = 2\n\
//!      seed.0 = 4357\n",
//! );
//! let registry = Registry::with_core_operators();
//! let mut breeder = Breeder::setup(&SetupContext::new(&params, &registry)).unwrap();
//!
//! let population = Population::new(vec![Subpopulation::new(
//!     (0..6).map(|v| Score { value: v as f64, evaluated: true }).collect(),
//! )]);
//! let next = breeder.breed(&population).unwrap();
//!
//! assert_eq!(next.generation(), 1);
//! assert_eq!(next.subpops()[0].len(), 6);
//! // The elite comes first.
//! assert_eq!(next.subpops()[0].individuals()[0].fitness(), 5.0);
//! assert!(params.unaccessed_keys().is_empty());
//! ```

pub mod breeder;
pub mod breeding;
mod error;
pub mod individual;
pub mod logging;
pub mod params;
pub mod prototype;
pub mod rng;

pub use breeder::Breeder;
pub use error::{EcError, Result};
pub use individual::{Individual, Population, Subpopulation};
pub use params::{ParameterDatabase, ParameterPath};
pub use prototype::{Registry, SetupContext, Template};
