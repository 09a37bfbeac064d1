use crate::individual::{Individual, Population};

use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllIndividuals,
    /// Clones the champion of each subpopulation.
    SubpopulationChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no individuals.
    NoIndividuals,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct Log<I> {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord<I>,
    pub subpopulation_sizes: Vec<usize>,
    /// Fitness statistics of each subpopulation.
    pub fitness: Vec<Stats>,
    /// Caller-defined statistics over the whole population.
    pub individual_stats: Vec<(String, Stats)>,
}

impl<I> fmt::Display for Log<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {{\n\
            \tgeneration_number: {:?}\n\
            \tsubpopulation_sizes: {:?}\n\
            {}{}}}",
            &self.generation_number,
            &self.subpopulation_sizes,
            self.fitness
                .iter()
                .enumerate()
                .map(|(i, stats)| format!("\tfitness.{}: {:?}\n", i, stats))
                .collect::<String>(),
            self.individual_stats
                .iter()
                .map(|(name, stats)| format!("\t{}: {:?}\n", name, stats))
                .collect::<String>()
        )
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// An empty sequence yields NaN everywhere.
    ///
    /// # Examples
    /// ```
    /// use oxiec::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f64>) -> Stats {
        let mut data: Vec<f64> = data.collect();
        if data.is_empty() {
            return Stats {
                maximum: f64::NAN,
                minimum: f64::NAN,
                mean: f64::NAN,
                median: f64::NAN,
            };
        }
        let (mut max, mut min, mut sum) = (f64::MIN, f64::MAX, 0.0);
        for d in &data {
            max = d.max(max);
            min = d.min(min);
            sum += d;
        }
        let mean = sum / data.len() as f64;
        data.sort_unstable_by(f64::total_cmp);
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Stats {
            maximum: max,
            minimum: min,
            mean,
            median,
        }
    }
}

/// A reporting-level dependant store
/// of individuals from a population.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord<I> {
    /// Every individual, by subpopulation.
    Subpopulations(Vec<Vec<I>>),
    /// The champion of each (non-empty) subpopulation.
    SubpopulationChampions(Vec<I>),
    /// Only population champion.
    PopulationChampion(I),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger<I> {
    reporting_level: ReportingLevel,
    logs: Vec<Log<I>>,
}

impl<I: Individual> EvolutionLogger<I> {
    /// Returns a logger with the appropiate reporting level.
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger<I> {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Stores a snapshot of a population and reports it through
    /// the `log` facade at `info` level.
    ///
    /// The `individual_stat_extractor` provides a way of
    /// obtaining arbitrary statistics on the population,
    /// where each statistic is named by `stat_names`.
    ///
    /// # Examples
    /// ```
    /// # use oxiec::individual::{Individual, Population, Subpopulation};
    /// # #[derive(Clone, Debug)]
    /// # struct Score(f64);
    /// # impl Individual for Score {
    /// #     fn is_evaluated(&self) -> bool { true }
    /// #     fn set_evaluated(&mut self, _: bool) {}
    /// #     fn fitness(&self) -> f64 { self.0 }
    /// # }
    /// use oxiec::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let population = Population::new(vec![Subpopulation::new(vec![Score(1.0), Score(3.0)])]);
    /// let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
    /// logger.log(&population, &|s: &Score| [s.0 * 2.0], ["double"]);
    ///
    /// let log = logger.last().unwrap();
    /// assert_eq!(log.fitness[0].mean, 2.0);
    /// assert_eq!(log.individual_stats[0].1.maximum, 6.0);
    /// ```
    pub fn log<ISE, const N: usize>(
        &mut self,
        population: &Population<I>,
        individual_stat_extractor: &ISE,
        stat_names: [&str; N],
    ) where
        ISE: Fn(&I) -> [f64; N],
    {
        let stats: Vec<[f64; N]> = population
            .subpops()
            .iter()
            .flat_map(|s| s.iter())
            .map(individual_stat_extractor)
            .collect();
        let individual_stats = stat_names
            .iter()
            .cloned()
            .map(String::from)
            .zip(unzip_n_vecs(stats.into_iter()))
            .map(|(name, data)| (name, Stats::from(data.into_iter())))
            .collect();
        let log = Log {
            generation_number: population.generation(),
            generation_sample: match self.reporting_level {
                ReportingLevel::AllIndividuals => GenerationMemberRecord::Subpopulations(
                    population
                        .subpops()
                        .iter()
                        .map(|s| s.iter().cloned().collect())
                        .collect(),
                ),
                ReportingLevel::SubpopulationChampions => {
                    GenerationMemberRecord::SubpopulationChampions(
                        population
                            .subpops()
                            .iter()
                            .filter_map(|s| s.champion().map(|c| I::clone(c)))
                            .collect(),
                    )
                }
                ReportingLevel::PopulationChampion => match population.champion() {
                    Some(champion) => {
                        GenerationMemberRecord::PopulationChampion(I::clone(champion))
                    }
                    None => GenerationMemberRecord::None,
                },
                ReportingLevel::NoIndividuals => GenerationMemberRecord::None,
            },
            subpopulation_sizes: population.subpops().iter().map(|s| s.len()).collect(),
            fitness: population
                .subpops()
                .iter()
                .map(|s| Stats::from(s.iter().map(|i| i.fitness())))
                .collect(),
            individual_stats,
        };
        info!("{}", log);
        self.logs.push(log)
    }

    /// Iterate over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log<I>> {
        self.logs.iter()
    }

    /// The most recent snapshot.
    pub fn last(&self) -> Option<&Log<I>> {
        self.logs.last()
    }
}

fn unzip_n_vecs<T: Clone, const N: usize>(iter: impl Iterator<Item = [T; N]>) -> Vec<Vec<T>> {
    let mut vecs = vec![Vec::default(); N];
    for items in iter {
        for (i, item) in items.into_iter().enumerate() {
            vecs[i].push(item);
        }
    }
    vecs
}
