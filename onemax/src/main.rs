use oxiec::logging::{EvolutionLogger, ReportingLevel};
use oxiec::rng::ThreadRandom;
use oxiec::{
    Breeder, EcError, Individual, ParameterDatabase, ParameterPath, Population, Registry,
    SetupContext, Subpopulation,
};
use oxiec_vec::genomics::{Gene, GeneBounds, VectorIndividual};
use oxiec_vec::P_VECTOR;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info, warn};
use rayon::prelude::*;

const P_GENERATIONS: &str = "generations";
const P_GENOME_SIZE: &str = "genome-size";
const P_GENE_TYPE: &str = "gene-type";
const P_PRINT_UNACCESSED: &str = "print-unaccessed-params";

const USAGE: &str = "usage: onemax -file <parameter file> [-p key=value]...";

/// Command line: one parameter file plus any number of overrides.
#[derive(Debug, PartialEq)]
struct Args {
    file: PathBuf,
    overrides: Vec<String>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
        let mut file: Option<PathBuf> = None;
        let mut overrides = vec![];
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-file" => file = Some(args.next().ok_or("-file needs a path")?.into()),
                "-p" => overrides.push(args.next().ok_or("-p needs key=value")?),
                other => return Err(format!("unexpected argument `{}`", other)),
            }
        }
        Ok(Args {
            file: file.ok_or("no parameter file given")?,
            overrides,
        })
    }
}

/// Sum of genes: the count of ones for bit genomes.
fn evaluate<G: Gene>(population: &mut Population<VectorIndividual<G>>) {
    population.subpops_mut().par_iter_mut().for_each(|subpop| {
        subpop
            .individuals_mut()
            .par_iter_mut()
            .filter(|individual| !individual.is_evaluated())
            .for_each(|individual| {
                let individual = Arc::make_mut(individual);
                individual.set_fitness(individual.gene_sum());
            })
    });
}

fn evolve<G: Gene>(
    params: &ParameterDatabase,
    genome_size: usize,
    bounds: &GeneBounds,
    optimum: f64,
) -> Result<(), Box<dyn Error>> {
    let mut registry = Registry::with_core_operators();
    oxiec_vec::register_operators::<G>(&mut registry);
    let mut breeder = Breeder::setup(&SetupContext::new(params, &registry))?;

    let generations_path = ParameterPath::new(P_GENERATIONS);
    let generations = params.get_int_with_default(&generations_path, None, 50);
    if generations < 1 {
        return Err(EcError::range(&generations_path, "at least one generation must run").into());
    }

    // Drawn from a stream no breeding thread uses.
    let mut random = ThreadRandom::seeded(breeder.seed(), breeder.threads());
    let subpops = (0..breeder.subpop_count())
        .map(|n| {
            let size = breeder.subpop_size(n).unwrap_or(0);
            Subpopulation::new(
                (0..size)
                    .map(|_| VectorIndividual::<G>::random(genome_size, bounds, &mut random))
                    .collect(),
            )
        })
        .collect();
    let mut population = Population::new(subpops);

    let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
    for generation in 0..generations {
        evaluate(&mut population);
        logger.log(
            &population,
            &|i: &VectorIndividual<G>| [i.gene_sum() / i.len() as f64],
            ["mean gene"],
        );
        let best = population.champion().map_or(f64::NAN, |c| c.fitness());
        if best >= optimum {
            info!("optimum {} reached in generation {}", optimum, generation);
            break;
        }
        if generation + 1 < generations {
            population = breeder.breed(&population)?;
        }
    }

    if let Some(champion) = population.champion() {
        println!("{}", ron::to_string(&**champion)?);
    }
    Ok(())
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let params = ParameterDatabase::load(&args.file, &args.overrides)?;
    let vector = ParameterPath::new(P_VECTOR);

    let size_path = vector.push(P_GENOME_SIZE);
    let genome_size = params.get_int(&size_path, None)?;
    if genome_size < 1 {
        return Err(EcError::range(&size_path, "genome-size must be at least 1").into());
    }
    let genome_size = genome_size as usize;

    let type_path = vector.push(P_GENE_TYPE);
    let gene_type = params.get_string_with_default(&type_path, None, "bit");
    match gene_type.as_str() {
        "bit" => evolve::<bool>(&params, genome_size, &GeneBounds::default(), genome_size as f64)?,
        "integer" => {
            let bounds = GeneBounds::setup(&params, &vector, &vector)?;
            let optimum = genome_size as f64 * bounds.max as f64;
            evolve::<i64>(&params, genome_size, &bounds, optimum)?
        }
        _ => {
            return Err(EcError::BadFormat {
                kind: "gene type",
                value: gene_type,
                path: type_path,
            }
            .into())
        }
    }

    if params.get_boolean(&ParameterPath::new(P_PRINT_UNACCESSED), None, false) {
        for key in params.unaccessed_keys() {
            warn!("unaccessed parameter: {}", key);
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };
    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Result<Args, String> {
        Args::parse(line.split_whitespace().map(String::from))
    }

    #[test]
    fn parses_file_and_overrides() {
        assert_eq!(
            args("-p generations=3 -file onemax.params -p seed.0=5").unwrap(),
            Args {
                file: "onemax.params".into(),
                overrides: vec!["generations=3".into(), "seed.0=5".into()],
            }
        );
    }

    #[test]
    fn rejects_bad_command_lines() {
        assert!(args("").is_err());
        assert!(args("-file").is_err());
        assert!(args("-file a.params -q").is_err());
    }

    #[test]
    fn bundled_parameters_run() {
        let file = concat!(env!("CARGO_MANIFEST_DIR"), "/params/onemax.params");
        let overrides = ["generations=3", "vector.genome-size=12", "breedthreads=2"];
        let params = ParameterDatabase::load(file, overrides).unwrap();
        assert!(evolve::<bool>(&params, 12, &GeneBounds::default(), 12.0).is_ok());
    }

    #[test]
    fn evaluation_scores_only_stale_individuals() {
        let mut fresh = VectorIndividual::new(vec![true, true, false]);
        fresh.set_fitness(-1.0);
        let stale = VectorIndividual::new(vec![true, false, false]);
        let mut population = Population::new(vec![Subpopulation::new(vec![fresh, stale])]);
        evaluate(&mut population);
        let fitness: Vec<f64> = population.subpops()[0].iter().map(|i| i.fitness()).collect();
        assert_eq!(fitness, vec![-1.0, 1.0]);
    }
}
