//! Variation operators for vector genomes.
mod crossover;
mod mutation;

pub use crossover::{
    CrossoverType, VectorCrossover, IDENTIFIER as XOVER_IDENTIFIER, P_CHUNK_SIZE, P_CROSSOVER_PROB,
    P_CROSSOVER_TYPE,
};
pub use mutation::{
    MutationType, VectorMutation, IDENTIFIER as MUTATE_IDENTIFIER, P_MUTATION_PROB, P_MUTATION_TYPE,
    P_RANDOM_WALK_PROB,
};

use crate::P_VECTOR;
use oxiec::{ParameterDatabase, ParameterPath};

/// Paths for an operator setting `key`: its own base first, then its
/// default base if set there, else the species-wide `vector` base.
fn setting(
    params: &ParameterDatabase,
    base: &ParameterPath,
    default_base: &ParameterPath,
    key: &str,
) -> (ParameterPath, ParameterPath) {
    let fallback = default_base.push(key);
    if params.exists(&fallback, None) {
        (base.push(key), fallback)
    } else {
        (base.push(key), ParameterPath::new(P_VECTOR).push(key))
    }
}
