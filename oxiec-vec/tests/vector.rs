use oxiec::rng::ThreadRandom;
use oxiec::{
    Breeder, EcError, Individual, ParameterDatabase, Population, Registry, Result, SetupContext,
    Subpopulation,
};
use oxiec_vec::genomics::{Gene, GeneBounds, VectorIndividual};

fn registry<G: Gene>() -> Registry<VectorIndividual<G>> {
    let mut registry = Registry::with_core_operators();
    oxiec_vec::register_operators(&mut registry);
    registry
}

fn breeder<G: Gene>(source: &str) -> Result<Breeder<VectorIndividual<G>>> {
    let params = ParameterDatabase::from_source(source);
    Breeder::setup(&SetupContext::new(&params, &registry::<G>()))
}

fn evaluate<G: Gene>(population: &mut Population<VectorIndividual<G>>) {
    for subpop in population.subpops_mut() {
        for individual in subpop.individuals_mut() {
            let individual = std::sync::Arc::make_mut(individual);
            individual.set_fitness(individual.gene_sum());
        }
    }
}

const BITS: &str = "\
pop.subpops = 1
pop.subpop.0.size = 20
pop.subpop.0.species.pipe = vector.mutate
pop.subpop.0.species.pipe.source.0 = vector.xover
vector.xover.source.0 = select.tournament
vector.xover.source.1 = same
select.tournament.size = 2
breed.elite.0 = 1
breedthreads = 2
seed.0 = 17
vector.mutation-prob = 0.02
vector.crossover-type = any
vector.crossover-prob = 0.5
";

#[test]
fn operators_are_registered() {
    let registry = registry::<bool>();
    assert!(registry.contains("vector.xover"));
    assert!(registry.contains("vector.mutate"));
    assert!(registry.contains("select.tournament"));
}

#[test]
fn elitist_bit_run_never_loses_its_champion() {
    let mut breeder = breeder::<bool>(BITS).unwrap();
    let mut random = ThreadRandom::seeded(17, 0);
    let individuals = (0..20)
        .map(|_| VectorIndividual::<bool>::random(32, &GeneBounds::default(), &mut random))
        .collect();
    let mut population = Population::new(vec![Subpopulation::new(individuals)]);
    evaluate(&mut population);

    let mut best = population.champion().unwrap().fitness();
    for _ in 0..30 {
        population = breeder.breed(&population).unwrap();
        assert_eq!(population.subpops()[0].len(), 20);
        assert!(population.subpops()[0].iter().all(|i| i.len() == 32));
        evaluate(&mut population);
        let champion = population.champion().unwrap().fitness();
        assert!(champion >= best);
        best = champion;
    }
}

#[test]
fn integer_walks_stay_in_bounds() {
    let source = format!(
        "{}vector.mutation-type = random-walk\n\
         vector.random-walk-probability = 0.8\n\
         vector.mutation-prob = 0.5\n\
         vector.min-gene = -5\n\
         vector.max-gene = 5\n",
        BITS.replace("vector.mutation-prob = 0.02\n", "")
    );
    let mut breeder = breeder::<i64>(&source).unwrap();
    let bounds = GeneBounds::new(-5, 5).unwrap();
    let mut random = ThreadRandom::seeded(2, 0);
    let individuals = (0..20)
        .map(|_| VectorIndividual::<i64>::random(8, &bounds, &mut random))
        .collect();
    let mut population = Population::new(vec![Subpopulation::new(individuals)]);
    for _ in 0..10 {
        evaluate(&mut population);
        population = breeder.breed(&population).unwrap();
        assert!(population.subpops()[0]
            .iter()
            .all(|i| i.genome().iter().all(|&g| bounds.contains(g))));
    }
}

#[test]
fn mismatched_lengths_abort_the_generation() {
    let source = "\
pop.subpops = 1
pop.subpop.0.size = 4
pop.subpop.0.species.pipe = vector.xover
pop.subpop.0.species.pipe.source.0 = select.first
pop.subpop.0.species.pipe.source.1 = select.tournament
select.tournament.size = 50
";
    let mut breeder = breeder::<bool>(source).unwrap();
    let mut short = VectorIndividual::new(vec![false; 3]);
    short.set_fitness(0.0);
    let mut long = VectorIndividual::new(vec![true; 4]);
    long.set_fitness(4.0);
    let population = Population::new(vec![Subpopulation::new(vec![short, long])]);
    assert!(matches!(
        breeder.breed(&population),
        Err(EcError::StructuralMismatch { operator: "vector.xover", .. })
    ));
}
