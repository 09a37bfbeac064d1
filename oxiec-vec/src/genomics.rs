//! Vector genomes and their genes.
mod genes;
mod individual;

pub use genes::{Gene, GeneBounds, MAX_WALK_STEPS, P_MAX_GENE, P_MIN_GENE};
pub use individual::VectorIndividual;
