use oxiec::breeding::pipeline::{CrossoverPipeline, Mutation, MutationPipeline, Recombination};
use oxiec::breeding::selection::{SelectionMethod, Selector};
use oxiec::breeding::{BreedingSource, BreedingState, Parentage, Production};
use oxiec::individual::{Individual, Population, Subpopulation};
use oxiec::params::{ParameterDatabase, ParameterPath};
use oxiec::prototype::{Registry, SetupContext, Template};
use oxiec::rng::ThreadRandom;
use oxiec::{EcError, Result};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
struct Num {
    genes: Vec<i32>,
    fitness: f64,
    evaluated: bool,
}

impl Num {
    fn new(genes: Vec<i32>, fitness: f64) -> Num {
        Num {
            genes,
            fitness,
            evaluated: true,
        }
    }
}

impl Individual for Num {
    fn is_evaluated(&self) -> bool {
        self.evaluated
    }
    fn set_evaluated(&mut self, evaluated: bool) {
        self.evaluated = evaluated;
    }
    fn fitness(&self) -> f64 {
        self.fitness
    }
}

/// Swaps the first genes of the parents.
#[derive(Clone, Debug)]
struct Swap;

impl Recombination<Num> for Swap {
    fn name(&self) -> &'static str {
        "test.xover"
    }

    fn recombine(&self, first: &mut Num, second: &mut Num, _: &mut ThreadRandom) -> Result<()> {
        if first.genes.len() != second.genes.len() {
            return Err(EcError::StructuralMismatch {
                operator: "test.xover",
                message: format!("{} genes vs {}", first.genes.len(), second.genes.len()),
            });
        }
        std::mem::swap(&mut first.genes[0], &mut second.genes[0]);
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct Bump;

impl Mutation<Num> for Bump {
    fn name(&self) -> &'static str {
        "test.mutate"
    }

    fn mutate(&self, individual: &mut Num, _: &mut ThreadRandom) -> Result<()> {
        individual.genes[0] += 100;
        Ok(())
    }
}

static SELECTIONS: AtomicUsize = AtomicUsize::new(0);

/// Uniform selection that counts how often it is asked.
#[derive(Clone, Debug, Default)]
struct Counting;

impl SelectionMethod<Num> for Counting {
    fn name(&self) -> &'static str {
        "test.count"
    }

    fn select_index(
        &mut self,
        subpop: &Subpopulation<Num>,
        random: &mut ThreadRandom,
    ) -> Result<usize> {
        SELECTIONS.fetch_add(1, Ordering::SeqCst);
        Ok(random.next_index(subpop.len()))
    }
}

/// Always returns one individual too many.
#[derive(Clone, Debug)]
struct Greedy;

impl BreedingSource<Num> for Greedy {
    fn name(&self) -> &'static str {
        "test.greedy"
    }
    fn num_sources(&self) -> usize {
        0
    }
    fn setup(&mut self, _: &SetupContext<'_, Num>, _: &ParameterPath) -> Result<()> {
        Ok(())
    }
    fn typical_inds_produced(&self) -> usize {
        1
    }
    fn produce(
        &mut self,
        _min: usize,
        max: usize,
        subpop: usize,
        output: &mut Vec<Arc<Num>>,
        state: &mut BreedingState<'_, Num>,
        _: Option<&mut Parentage>,
    ) -> Result<usize> {
        let first = &state.subpop(subpop)?.individuals()[0];
        for _ in 0..=max {
            output.push(Arc::clone(first));
        }
        Ok(max + 1)
    }
}

fn registry() -> Registry<Num> {
    let mut registry = Registry::with_core_operators();
    registry.register("test.xover", || Box::new(CrossoverPipeline::<Num, Swap>::new(Swap)));
    registry.register("test.mutate", || Box::new(MutationPipeline::<Num, Bump>::new(Bump)));
    registry.register("test.count", || Box::new(Selector::new(Counting)));
    registry.register("test.greedy", || Box::new(Greedy));
    registry
}

fn tree(source: &str) -> Result<Template<Num>> {
    let params = ParameterDatabase::from_source(source);
    let registry = registry();
    Template::from_config(
        &SetupContext::new(&params, &registry),
        &ParameterPath::new("pipe"),
        None,
    )
}

fn population() -> Population<Num> {
    Population::new(vec![Subpopulation::new(
        (0..5).map(|i| Num::new(vec![i, i], i as f64)).collect(),
    )])
}

fn run(
    template: &Template<Num>,
    population: &Population<Num>,
    min: usize,
    max: usize,
    parentage: Option<&mut Parentage>,
) -> Result<Vec<Arc<Num>>> {
    let mut random = ThreadRandom::seeded(1, 0);
    let mut state = BreedingState::new(population, 0, &mut random);
    let mut source = template.instantiate();
    let mut output = vec![];
    let mut production = Production::begin(source.as_mut(), 0, &mut state)?;
    production.produce(min, max, &mut output, parentage)?;
    production.finish()?;
    Ok(output)
}

#[test]
fn selection_aliases_population_slot() {
    let pop = population();
    let template = tree("pipe = select.first\n").unwrap();
    let output = run(&template, &pop, 1, 1, None).unwrap();
    assert_eq!(output.len(), 1);
    assert!(Arc::ptr_eq(&output[0], &pop.subpops()[0].individuals()[0]));
}

#[test]
fn selection_count_is_clamped() {
    let pop = population();
    let template = tree("pipe = select.random\n").unwrap();
    assert_eq!(run(&template, &pop, 0, 5, None).unwrap().len(), 1);
    assert_eq!(run(&template, &pop, 3, 5, None).unwrap().len(), 3);
    assert_eq!(run(&template, &pop, 0, 0, None).unwrap().len(), 0);
}

#[test]
fn pipeline_returns_distinct_copy() {
    let pop = population();
    let template = tree("pipe = breed.reproduction\npipe.source.0 = select.first\n").unwrap();
    let output = run(&template, &pop, 1, 1, None).unwrap();
    let original = &pop.subpops()[0].individuals()[0];
    assert!(!Arc::ptr_eq(&output[0], original));
    assert_eq!(*output[0], **original);
    assert!(output[0].is_evaluated());
}

#[test]
fn crossover_pair() {
    let pop = population();
    let template = tree(
        "pipe = test.xover\n\
         pipe.source.0 = select.tournament\n\
         pipe.source.1 = select.random\n\
         select.tournament.size = 2\n",
    )
    .unwrap();
    let output = run(&template, &pop, 2, 2, None).unwrap();
    assert_eq!(output.len(), 2);
    assert!(!Arc::ptr_eq(&output[0], &output[1]));
    for child in &output {
        assert!(!child.is_evaluated());
        assert!(pop.subpops()[0]
            .individuals()
            .iter()
            .all(|slot| !Arc::ptr_eq(slot, child)));
    }
    // Parents are untouched.
    for (i, slot) in pop.subpops()[0].individuals().iter().enumerate() {
        assert_eq!(slot.genes, vec![i as i32, i as i32]);
        assert!(slot.is_evaluated());
    }
}

#[test]
fn crossover_completes_pairs() {
    let pop = population();
    let plain =
        tree("pipe = test.xover\npipe.source.0 = test.count\npipe.source.1 = test.count\n")
            .unwrap();
    let tossing = tree(
        "pipe = test.xover\npipe.source.0 = test.count\npipe.source.1 = same\npipe.toss = true\n",
    )
    .unwrap();

    SELECTIONS.store(0, Ordering::SeqCst);
    assert_eq!(run(&plain, &pop, 3, 3, None).unwrap().len(), 3);
    assert_eq!(SELECTIONS.load(Ordering::SeqCst), 4);

    SELECTIONS.store(0, Ordering::SeqCst);
    assert_eq!(run(&tossing, &pop, 3, 3, None).unwrap().len(), 3);
    assert_eq!(SELECTIONS.load(Ordering::SeqCst), 6);

    // Unbounded requests yield the typical count.
    SELECTIONS.store(0, Ordering::SeqCst);
    assert_eq!(run(&tossing, &pop, 0, 10, None).unwrap().len(), 1);
    assert_eq!(SELECTIONS.load(Ordering::SeqCst), 2);
}

#[test]
fn same_source_shares_one_child() {
    let pop = population();
    let template =
        tree("pipe = test.xover\npipe.source.0 = select.first\npipe.source.1 = same\n").unwrap();
    let source = template.instantiate();
    assert_eq!(source.num_sources(), 2);
    let output = run(&template, &pop, 2, 2, None).unwrap();
    assert_eq!(output[0].genes, vec![0, 0]);
    assert!(!Arc::ptr_eq(&output[0], &output[1]));
}

#[test]
fn crossover_parentage_is_union() {
    let pop = population();
    let template = tree(
        "pipe = test.xover\n\
         pipe.source.0 = select.first\n\
         pipe.source.1 = select.tournament\n\
         pipe.source.1.size = 200\n",
    )
    .unwrap();
    let mut parentage = Parentage::new();
    let output = run(&template, &pop, 2, 2, Some(&mut parentage)).unwrap();
    assert_eq!(output.len(), 2);
    assert_eq!(parentage.parents_of(0), &[0, 4]);
    assert_eq!(parentage.parents_of(1), &[0, 4]);
}

#[test]
fn structural_mismatch_aborts() {
    let pop = Population::new(vec![Subpopulation::new(vec![
        Num::new(vec![1], 0.0),
        Num::new(vec![1, 2], 1.0),
    ])]);
    let template = tree(
        "pipe = test.xover\n\
         pipe.source.0 = select.first\n\
         pipe.source.1 = select.tournament\n\
         pipe.source.1.size = 200\n",
    )
    .unwrap();
    assert!(matches!(
        run(&template, &pop, 2, 2, None),
        Err(EcError::StructuralMismatch { .. })
    ));
}

#[test]
fn zero_likelihood_bypasses() {
    let pop = population();
    let template = tree(
        "pipe = test.xover\n\
         pipe.likelihood = 0.0\n\
         pipe.source.0 = select.first\n\
         pipe.source.1 = select.first\n",
    )
    .unwrap();
    let output = run(&template, &pop, 2, 2, None).unwrap();
    assert_eq!(output.len(), 2);
    for child in &output {
        assert_eq!(child.genes, vec![0, 0]);
        assert!(child.is_evaluated());
        assert!(!Arc::ptr_eq(child, &pop.subpops()[0].individuals()[0]));
    }
}

#[test]
fn likelihood_out_of_range() {
    let err = tree("pipe = test.mutate\npipe.source.0 = select.first\npipe.likelihood = 1.5\n");
    assert!(matches!(
        err,
        Err(EcError::RangeViolation { path, .. }) if path == ParameterPath::new("pipe.likelihood")
    ));
}

#[test]
fn mutation_of_crossover() {
    let pop = population();
    let template = tree(
        "pipe = test.mutate\n\
         pipe.source.0 = test.xover\n\
         pipe.source.0.source.0 = select.first\n\
         pipe.source.0.source.1 = select.first\n",
    )
    .unwrap();
    let output = run(&template, &pop, 1, 4, None).unwrap();
    assert_eq!(output.len(), 2);
    for child in &output {
        assert_eq!(child.genes, vec![100, 0]);
        assert!(!child.is_evaluated());
    }
    assert_eq!(pop.subpops()[0].individuals()[0].genes, vec![0, 0]);
}

#[test]
fn default_base_supplies_sources() {
    let pop = population();
    let template = tree(
        "pipe = breed.reproduction\n\
         breed.reproduction.source.0 = select.first\n",
    )
    .unwrap();
    assert_eq!(run(&template, &pop, 1, 1, None).unwrap()[0].genes, vec![0, 0]);
}

#[test]
fn missing_source_is_fatal() {
    assert!(matches!(
        tree("pipe = breed.reproduction\n"),
        Err(EcError::ParameterMissing { path }) if path == ParameterPath::new("pipe.source.0")
    ));
}

#[test]
fn contract_violations_detected() {
    let pop = population();
    let template = tree("pipe = breed.reproduction\npipe.source.0 = test.greedy\n").unwrap();
    assert!(matches!(
        run(&template, &pop, 1, 2, None),
        Err(EcError::ContractViolation { operator: "test.greedy", .. })
    ));

    let template = tree("pipe = select.first\n").unwrap();
    assert!(matches!(
        run(&template, &pop, 3, 2, None),
        Err(EcError::ContractViolation { .. })
    ));
}

#[test]
fn clones_are_independent() {
    let pop = population();
    let template = tree("pipe = select.fitprop\n").unwrap();
    let mut random = ThreadRandom::seeded(9, 0);
    let mut state = BreedingState::new(&pop, 0, &mut random);

    let mut first = template.instantiate();
    let mut production = Production::begin(first.as_mut(), 0, &mut state).unwrap();
    let mut output = vec![];
    production.produce(1, 1, &mut output, None).unwrap();
    production.finish().unwrap();

    // A fresh clone has not been prepared: its wheel is empty.
    let mut second = template.instantiate();
    assert!(second
        .produce(1, 1, 0, &mut output, &mut state, None)
        .is_err());
}
