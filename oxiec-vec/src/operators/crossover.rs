use super::setting;
use crate::genomics::{Gene, VectorIndividual};
use oxiec::breeding::pipeline::Recombination;
use oxiec::rng::ThreadRandom;
use oxiec::{EcError, ParameterDatabase, ParameterPath, Result};

use std::ops::Range;
use std::str::FromStr;

use log::debug;

/// Identifier the vector crossover pipeline is registered under.
pub const IDENTIFIER: &str = "vector.xover";

pub const P_CROSSOVER_TYPE: &str = "crossover-type";
pub const P_CROSSOVER_PROB: &str = "crossover-prob";
pub const P_CHUNK_SIZE: &str = "chunk-size";

/// Where genomes are cut.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrossoverType {
    /// Swap everything before one random chunk boundary.
    One,
    /// Swap everything between two random chunk boundaries.
    Two,
    /// Swap each chunk independently with `crossover-prob`.
    Any,
}

impl FromStr for CrossoverType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "one" => Ok(CrossoverType::One),
            "two" => Ok(CrossoverType::Two),
            "any" => Ok(CrossoverType::Any),
            _ => Err(()),
        }
    }
}

/// Chunk-wise crossover between two equal-length vector genomes.
///
/// Parameters: `crossover-type` (`one`, `two` or `any`, default
/// `one`), `crossover-prob` (required for `any`, in `[0, 1]`) and
/// `chunk-size` (default 1). Cut points only fall on chunk
/// boundaries; a trailing partial chunk is never swapped.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorCrossover {
    kind: CrossoverType,
    probability: f64,
    chunk_size: usize,
}

impl VectorCrossover {
    /// # Examples
    /// ```
    /// use oxiec_vec::operators::{CrossoverType, VectorCrossover};
    ///
    /// let crossover = VectorCrossover::new(CrossoverType::Two, 0.0, 2);
    /// assert_eq!(crossover.kind(), CrossoverType::Two);
    /// ```
    pub fn new(kind: CrossoverType, probability: f64, chunk_size: usize) -> VectorCrossover {
        VectorCrossover {
            kind,
            probability,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn kind(&self) -> CrossoverType {
        self.kind
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn chunk(&self, from: usize, to: usize) -> Range<usize> {
        from * self.chunk_size..to * self.chunk_size
    }
}

impl Default for VectorCrossover {
    fn default() -> Self {
        VectorCrossover::new(CrossoverType::One, 0.0, 1)
    }
}

impl<G: Gene> Recombination<VectorIndividual<G>> for VectorCrossover {
    fn name(&self) -> &'static str {
        IDENTIFIER
    }

    fn setup(
        &mut self,
        params: &ParameterDatabase,
        base: &ParameterPath,
        default_base: &ParameterPath,
    ) -> Result<()> {
        let (path, def) = setting(params, base, default_base, P_CROSSOVER_TYPE);
        let kind = params.get_string_with_default(&path, Some(&def), "one");
        self.kind = kind.parse().map_err(|_| EcError::BadFormat {
            kind: "crossover type",
            value: kind,
            path: path.clone(),
        })?;

        if self.kind == CrossoverType::Any {
            let (path, def) = setting(params, base, default_base, P_CROSSOVER_PROB);
            self.probability = params.get_double_with_max(&path, Some(&def), 0.0, 1.0);
            if self.probability < 0.0 {
                return Err(EcError::range(
                    &path,
                    "crossover-prob must be between 0.0 and 1.0",
                ));
            }
        }

        let (path, def) = setting(params, base, default_base, P_CHUNK_SIZE);
        let chunk_size = params.get_int_with_default(&path, Some(&def), 1);
        if chunk_size < 1 {
            return Err(EcError::range(&path, "chunk-size must be at least 1"));
        }
        self.chunk_size = chunk_size as usize;
        debug!("{}: {:?} crossover, chunk size {}", base, self.kind, self.chunk_size);
        Ok(())
    }

    fn recombine(
        &self,
        first: &mut VectorIndividual<G>,
        second: &mut VectorIndividual<G>,
        random: &mut ThreadRandom,
    ) -> Result<()> {
        if first.len() != second.len() {
            return Err(EcError::StructuralMismatch {
                operator: IDENTIFIER,
                message: format!(
                    "genome lengths differ ({} and {})",
                    first.len(),
                    second.len()
                ),
            });
        }
        let (a, b) = (first.genome_mut(), second.genome_mut());
        let chunks = a.len() / self.chunk_size;
        match self.kind {
            CrossoverType::One => {
                let point = random.next_index(chunks + 1);
                let range = self.chunk(0, point);
                a[range.clone()].swap_with_slice(&mut b[range]);
            }
            CrossoverType::Two => {
                let p0 = random.next_index(chunks + 1);
                let p1 = random.next_index(chunks + 1);
                let range = self.chunk(p0.min(p1), p0.max(p1));
                a[range.clone()].swap_with_slice(&mut b[range]);
            }
            CrossoverType::Any => {
                for x in 0..chunks {
                    if random.next_bool(self.probability) {
                        let range = self.chunk(x, x + 1);
                        a[range.clone()].swap_with_slice(&mut b[range]);
                    }
                }
            }
        }
        Ok(())
    }
}
