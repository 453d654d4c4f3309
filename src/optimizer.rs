use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::alphabet::Alphabet;
use crate::decoder::{generic_decoder, Phenotype};
use crate::error::{GenoptError, Result};
use crate::genotype::Genotype;
use crate::operators;
use crate::selection;
use crate::statistics::GenerationStats;

/// User-supplied objective function: maps a decoded phenotype to a finite
/// non-negative fitness, higher is better. Must be safe for concurrent
/// invocation when parallel evaluation is enabled.
pub type ObjectiveFn = Box<dyn Fn(&Phenotype) -> f64 + Send + Sync>;

/// User-supplied decoder: maps a genotype to the phenotype the objective
/// function expects. Defaults to [`generic_decoder`].
pub type DecoderFn = Box<dyn Fn(&Genotype) -> Result<Phenotype> + Send + Sync>;

/// Fitness-scaling selection made at configuration time.
///
/// `Auto` resolves to 1.6 for standard discrete genomes and to disabled for
/// continuous, permutation, and character genomes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum FitnessScale {
    #[default]
    Auto,
    Off,
    Factor(f64),
}

/// Construction-time configuration. Fields left at `None` (and
/// `FitnessScale::Auto`) resolve to alphabet-dependent defaults once, at
/// construction; the resolved tuning knobs stay adjustable afterwards via
/// [`Tuning`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub number_chromosomes: usize,
    /// One length per chromosome; a single entry is replicated across all
    /// chromosomes.
    pub chromosome_lengths: Vec<usize>,
    pub population_size: usize,
    /// `None` selects the binary alphabet for haploid genomes and the
    /// triallelic alphabet for diploid genomes.
    pub alphabet: Option<Alphabet>,
    /// Chromosome sets per gene: 1 (haploid) or 2 (diploid).
    pub chromosome_sets: usize,
    pub p_crossover: Option<f64>,
    pub p_mutation: Option<f64>,
    pub p_inversion: Option<f64>,
    pub population_growth: f64,
    pub overpopulation: f64,
    pub fitness_scale: FitnessScale,
    pub monogamous: bool,
    /// Children per mating; must be even and nonzero.
    pub number_children: usize,
    /// Carry the fittest individual unchanged into the next generation.
    pub best_immortal: bool,
    pub float_sigma: f64,
    pub float_sigma_adapt: f64,
    /// Evaluate the offspring pool on the rayon thread pool.
    pub parallel: bool,
    /// Deterministic seed for all operator randomness; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            number_chromosomes: 1,
            chromosome_lengths: vec![32],
            population_size: 30,
            alphabet: None,
            chromosome_sets: 1,
            p_crossover: None,
            p_mutation: None,
            p_inversion: None,
            population_growth: 1.0,
            overpopulation: 1.3,
            fitness_scale: FitnessScale::Auto,
            monogamous: false,
            number_children: 2,
            best_immortal: true,
            float_sigma: 1.2,
            float_sigma_adapt: 0.85,
            parallel: false,
            seed: None,
        }
    }
}

/// The tuning knobs a progress hook (or the caller, between runs) may adjust
/// to implement adaptive strategies. Everything else about a running
/// optimizer is immutable from the outside.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub p_crossover: f64,
    pub p_mutation: f64,
    pub p_inversion: f64,
    pub population_growth: f64,
    pub overpopulation: f64,
    /// `None` disables fitness scaling.
    pub fitness_scale: Option<f64>,
    pub float_sigma: f64,
    pub float_sigma_adapt: f64,
}

/// Read-only view handed to the progress hook after every generation.
pub struct GenerationView<'a> {
    pub objective: &'a ObjectiveFn,
    pub decoder: &'a DecoderFn,
    pub statistics: &'a [GenerationStats],
    pub generation: usize,
    pub population: &'a [Genotype],
    pub pmx: bool,
    pub best_genotype: &'a Genotype,
    pub best_phenotype: Phenotype,
    pub best_fitness: f64,
}

/// Invoked once after each generation, including generation 0. May adjust
/// the tuning knobs; cannot touch population or statistics.
pub trait ProgressHook: Send {
    fn on_generation(&mut self, view: &GenerationView<'_>, tuning: &mut Tuning);
}

/// Genetic-algorithm optimizer for an arbitrary black-box objective
/// function.
///
/// Construction builds and evaluates a random initial population
/// (generation 0); [`Optimizer::run`] then advances generations until a
/// count or fitness bound is reached. Each generation over-produces
/// offspring through fitness-proportionate mating and the configured
/// reproduction operator, mutates and optionally inverts them, evaluates
/// and records statistics, rescales fitness, and finally lets only the
/// fittest survive.
pub struct Optimizer {
    objective: ObjectiveFn,
    decoder: DecoderFn,
    hook: Option<Box<dyn ProgressHook>>,
    tuning: Tuning,
    alphabet: Arc<Alphabet>,
    chromosome_lengths: Vec<usize>,
    chromosome_sets: usize,
    population_size: usize,
    monogamous: bool,
    number_children: usize,
    best_immortal: bool,
    parallel: bool,
    population: Vec<Genotype>,
    statistics: Vec<GenerationStats>,
    rng: StdRng,
    crossovers: usize,
    mutations: usize,
    inversions: usize,
    divorce_rate: f64,
}

impl Optimizer {
    /// Validate the configuration, resolve alphabet-dependent defaults,
    /// build and evaluate the initial population, and record generation 0.
    pub fn new(
        config: OptimizerConfig,
        objective: ObjectiveFn,
        decoder: Option<DecoderFn>,
        hook: Option<Box<dyn ProgressHook>>,
    ) -> Result<Self> {
        let chromosome_lengths = resolve_lengths(&config)?;
        let alphabet = resolve_alphabet(&config)?;
        validate(&config, &chromosome_lengths, &alphabet)?;
        let tuning = resolve_tuning(&config, &alphabet)?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let alphabet = Arc::new(alphabet);
        let mut population: Vec<Genotype> = (0..config.population_size)
            .map(|_| {
                Genotype::random(
                    &chromosome_lengths,
                    config.chromosome_sets,
                    &alphabet,
                    &mut rng,
                )
            })
            .collect();

        // fringe individuals: for plain discrete alphabets, guarantee every
        // allele value appears as a constant genome in generation 0
        if let Alphabet::Discrete(symbols) = alphabet.as_ref() {
            if !alphabet.is_character() && config.population_size > symbols.len() {
                for (k, &symbol) in symbols.iter().enumerate() {
                    population[k] = Genotype::constant(
                        &chromosome_lengths,
                        config.chromosome_sets,
                        &alphabet,
                        symbol,
                    );
                }
            }
        }

        let mut optimizer = Self {
            objective,
            decoder: decoder.unwrap_or_else(|| Box::new(generic_decoder)),
            hook,
            tuning,
            alphabet,
            chromosome_lengths,
            chromosome_sets: config.chromosome_sets,
            population_size: config.population_size,
            monogamous: config.monogamous,
            number_children: config.number_children,
            best_immortal: config.best_immortal,
            parallel: config.parallel,
            population: Vec::new(),
            statistics: Vec::new(),
            rng,
            crossovers: 0,
            mutations: 0,
            inversions: 0,
            divorce_rate: 0.0,
        };

        optimizer.evaluate(&mut population)?;
        optimizer.population = population;
        optimizer.record_statistics();
        info!(
            "initial population of {} evaluated, mean fitness {:.6}",
            optimizer.population.len(),
            optimizer.statistics[0].mean
        );
        optimizer.invoke_hook()?;

        Ok(optimizer)
    }

    /// Advance up to `generations` generations, stopping early once any
    /// individual's fitness reaches `max_fitness`.
    pub fn run(&mut self, generations: usize, max_fitness: Option<f64>) -> Result<()> {
        for _ in 0..generations {
            self.next_generation()?;
            if let Some(maxfit) = max_fitness {
                if self.best_fitness() >= maxfit {
                    info!(
                        "fitness bound {} reached in generation {}",
                        maxfit,
                        self.generation()
                    );
                    break;
                }
            }
            self.invoke_hook()?;
        }
        Ok(())
    }

    pub fn objective(&self) -> &ObjectiveFn {
        &self.objective
    }

    pub fn decoder(&self) -> &DecoderFn {
        &self.decoder
    }

    /// Statistics history, one record per generation; index 0 describes the
    /// initial population. Records are computed before survivor selection.
    pub fn statistics(&self) -> &[GenerationStats] {
        &self.statistics
    }

    /// Current generation number, 0 being the initial population.
    pub fn generation(&self) -> usize {
        self.statistics.len() - 1
    }

    pub fn population(&self) -> &[Genotype] {
        &self.population
    }

    pub fn pmx(&self) -> bool {
        self.alphabet.is_permutation()
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Adjust tuning knobs between runs.
    pub fn tuning_mut(&mut self) -> &mut Tuning {
        &mut self.tuning
    }

    /// Best performing individual of the current population as a
    /// (genotype, decoded phenotype, fitness) tuple.
    pub fn best_fit(&self) -> Result<(&Genotype, Phenotype, f64)> {
        let index = self.best_index();
        let phenotype = (self.decoder)(&self.population[index])?;
        Ok((
            &self.population[index],
            phenotype,
            self.population[index].fitness().unwrap_or(0.0),
        ))
    }

    fn best_index(&self) -> usize {
        let mut best = 0;
        let mut max_fitness = self.population[0].fitness().unwrap_or(0.0);
        for (i, individual) in self.population.iter().enumerate() {
            let fitness = individual.fitness().unwrap_or(0.0);
            if fitness > max_fitness {
                best = i;
                max_fitness = fitness;
            }
        }
        best
    }

    fn best_fitness(&self) -> f64 {
        self.population[self.best_index()].fitness().unwrap_or(0.0)
    }

    /// Decode and evaluate every individual, filling in raw fitness and
    /// seeding scaled fitness with the raw value.
    fn evaluate(&self, population: &mut [Genotype]) -> Result<()> {
        let objective = &self.objective;
        let decoder = &self.decoder;
        let fitness: Vec<f64> = if self.parallel {
            population
                .par_iter()
                .map(|individual| {
                    let phenotype = decoder(individual)?;
                    Ok(objective(&phenotype))
                })
                .collect::<Result<_>>()?
        } else {
            population
                .iter()
                .map(|individual| {
                    let phenotype = decoder(individual)?;
                    Ok(objective(&phenotype))
                })
                .collect::<Result<_>>()?
        };
        for (individual, value) in population.iter_mut().zip(fitness) {
            individual.set_fitness(value)?;
            individual.set_scaled_fitness(value)?;
        }
        Ok(())
    }

    /// One full evolution step: over-produce offspring through selective
    /// mating, mutate and invert them, evaluate, record statistics, scale
    /// fitness, and select the survivors.
    fn next_generation(&mut self) -> Result<()> {
        self.crossovers = 0;
        self.mutations = 0;
        self.inversions = 0;
        self.divorce_rate = if self.monogamous { 0.0 } else { 1.0 };

        let mut target = (self.tuning.overpopulation
            * self.population_size as f64
            * self.tuning.population_growth) as usize;
        if self.best_immortal {
            target = target.saturating_sub(1);
        }

        let mut newpop: Vec<Genotype> = Vec::with_capacity(target + 1);
        let mut consumed: Vec<usize> = Vec::new();

        while newpop.len() < target {
            // selective mating: find partners i and j
            let i = selection::select_mate(&self.population, &consumed, &mut self.rng);
            consumed.push(i);
            if consumed.len() >= self.population.len() {
                // out of partners, divorce everybody
                consumed.clear();
            }
            let j = selection::select_mate(&self.population, &consumed, &mut self.rng);

            let mut children = if self.alphabet.is_permutation() {
                let (children, crossovers) = operators::partially_matched_crossover(
                    &self.population[i],
                    &self.population[j],
                    self.tuning.p_crossover,
                    &mut self.rng,
                );
                self.crossovers += crossovers;
                children
            } else if self.chromosome_sets == 1 {
                let (children, crossovers) = operators::simple_crossover(
                    &self.population[i],
                    &self.population[j],
                    self.number_children,
                    self.tuning.p_crossover,
                    &mut self.rng,
                );
                self.crossovers += crossovers;
                children
            } else {
                // meiosis: each parent contributes recombined haploid
                // gametes, paired one-to-one into diploid children
                let (maternal0, maternal1) = operators::meiosis(&self.population[i]);
                let (paternal0, paternal1) = operators::meiosis(&self.population[j]);
                let (maternal_gametes, ci) = operators::simple_crossover(
                    &maternal0,
                    &maternal1,
                    self.number_children,
                    self.tuning.p_crossover,
                    &mut self.rng,
                );
                let (paternal_gametes, cj) = operators::simple_crossover(
                    &paternal0,
                    &paternal1,
                    self.number_children,
                    self.tuning.p_crossover,
                    &mut self.rng,
                );
                self.crossovers += ci + cj;
                operators::fertilize(&maternal_gametes, &paternal_gametes)
            };

            for child in &mut children {
                self.mutations += operators::mutate(
                    child,
                    self.tuning.p_mutation,
                    self.tuning.float_sigma,
                    &mut self.rng,
                )?;
                self.inversions +=
                    operators::invert(child, self.tuning.p_inversion, &mut self.rng);
            }

            if self.monogamous {
                consumed.push(j);
            } else {
                consumed.clear();
            }

            newpop.append(&mut children);
            if consumed.len() >= self.population.len() {
                self.divorce_rate = (self.population.len() - consumed.len()) as f64
                    / self.population.len() as f64;
                consumed.clear();
            }
        }

        if self.best_immortal {
            // keep the fittest individual of the last generation unchanged
            let best = self.best_index();
            newpop.push(self.population[best].clone());
        }

        self.evaluate(&mut newpop)?;

        self.population = newpop;
        self.record_statistics();

        if let Some(scale) = self.tuning.fitness_scale {
            let stats = self.statistics[self.statistics.len() - 1].clone();
            selection::scale_fitness(&mut self.population, &stats, scale)?;
        }

        // growth rounds ties to even: 20 individuals at 1.1 growth reach
        // exactly 132 after 20 generations
        self.population_size = (self.population_size as f64
            * self.tuning.population_growth)
            .round_ties_even() as usize;
        let overpopulated = std::mem::take(&mut self.population);
        self.population = selection::select_survivors(
            overpopulated,
            self.population_size,
            &mut self.rng,
        );

        // Rechenberg-style step control: every fifth generation, shrink the
        // mutation step when the mean fitness improved, grow it otherwise
        if self.alphabet.is_continuous() {
            let generation = self.generation();
            if generation > 0 && generation % 5 == 0 {
                let n = self.statistics.len();
                if self.statistics[n - 1].mean > self.statistics[n - 5].mean {
                    self.tuning.float_sigma *= self.tuning.float_sigma_adapt;
                } else {
                    self.tuning.float_sigma /= self.tuning.float_sigma_adapt;
                }
            }
        }

        let stats = &self.statistics[self.statistics.len() - 1];
        debug!(
            "generation {}: size {}, mean {:.6}, max {:.6}, {} crossovers, \
             {} mutations, {} inversions",
            self.generation(),
            self.population.len(),
            stats.mean,
            stats.max,
            stats.crossovers,
            stats.mutations,
            stats.inversions
        );

        Ok(())
    }

    fn record_statistics(&mut self) {
        self.statistics.push(GenerationStats::collect(
            &self.population,
            self.crossovers,
            self.mutations,
            self.inversions,
            self.monogamous.then_some(self.divorce_rate),
        ));
    }

    fn invoke_hook(&mut self) -> Result<()> {
        if self.hook.is_none() {
            return Ok(());
        }
        let best = self.best_index();
        let best_phenotype = (self.decoder)(&self.population[best])?;
        let view = GenerationView {
            objective: &self.objective,
            decoder: &self.decoder,
            statistics: &self.statistics,
            generation: self.statistics.len() - 1,
            population: &self.population,
            pmx: self.alphabet.is_permutation(),
            best_genotype: &self.population[best],
            best_phenotype,
            best_fitness: self.population[best].fitness().unwrap_or(0.0),
        };
        if let Some(hook) = self.hook.as_mut() {
            hook.on_generation(&view, &mut self.tuning);
        }
        Ok(())
    }
}

impl fmt::Display for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Problem-specific parameters:")?;
        writeln!(
            f,
            "chromosomes: {}, lengths: {:?}, sets: {}",
            self.chromosome_lengths.len(),
            self.chromosome_lengths,
            self.chromosome_sets
        )?;
        writeln!(f, "GA-specific parameters:")?;
        writeln!(
            f,
            "populationSize: {}, populationGrowth: {}, overpopulation: {}",
            self.population_size,
            self.tuning.population_growth,
            self.tuning.overpopulation
        )?;
        writeln!(
            f,
            "pCrossover: {}, pMutation: {}, pInversion: {}, fitnessScale: {:?}",
            self.tuning.p_crossover,
            self.tuning.p_mutation,
            self.tuning.p_inversion,
            self.tuning.fitness_scale
        )?;
        writeln!(
            f,
            "monogamous: {}, numberChildren: {}, parallel: {}",
            self.monogamous, self.number_children, self.parallel
        )?;
        if self.alphabet.is_continuous() {
            writeln!(
                f,
                "floatSigma: {}, floatSigmaAdapt: {}",
                self.tuning.float_sigma, self.tuning.float_sigma_adapt
            )?;
        }
        writeln!(f, "Generations computed: {}", self.generation())?;
        writeln!(f, "Current population:")?;
        for individual in &self.population {
            writeln!(
                f,
                "{}  (fitness: {:?})",
                individual,
                individual.fitness()
            )?;
        }
        write!(f, "Current statistics: {:?}", self.statistics.last())
    }
}

fn resolve_lengths(config: &OptimizerConfig) -> Result<Vec<usize>> {
    if config.chromosome_lengths.len() == config.number_chromosomes {
        Ok(config.chromosome_lengths.clone())
    } else if config.chromosome_lengths.len() == 1 {
        Ok(vec![config.chromosome_lengths[0]; config.number_chromosomes])
    } else {
        Err(GenoptError::Configuration(format!(
            "expected {} chromosome lengths, got {}",
            config.number_chromosomes,
            config.chromosome_lengths.len()
        )))
    }
}

fn resolve_alphabet(config: &OptimizerConfig) -> Result<Alphabet> {
    match &config.alphabet {
        Some(alphabet) => Ok(alphabet.clone()),
        None => match config.chromosome_sets {
            1 => Ok(Alphabet::binary()),
            _ => Ok(Alphabet::triallelic()),
        },
    }
}

fn validate(
    config: &OptimizerConfig,
    lengths: &[usize],
    alphabet: &Alphabet,
) -> Result<()> {
    if config.chromosome_sets != 1 && config.chromosome_sets != 2 {
        return Err(GenoptError::Configuration(
            "the number of chromosome sets can only be 1 or 2".into(),
        ));
    }
    if config.number_chromosomes == 0 || lengths.iter().any(|&l| l == 0) {
        return Err(GenoptError::Configuration(
            "chromosome count and lengths must be nonzero".into(),
        ));
    }
    if config.number_children == 0 || config.number_children % 2 != 0 {
        return Err(GenoptError::Configuration(
            "number of children must be a nonzero multiple of 2".into(),
        ));
    }
    match alphabet {
        Alphabet::Continuous => {
            if config.chromosome_sets == 2 {
                return Err(GenoptError::Configuration(
                    "the continuous alphabet only works with haploid genomes"
                        .into(),
                ));
            }
            if !config.float_sigma.is_finite() || config.float_sigma <= 0.0 {
                return Err(GenoptError::Configuration(
                    "float sigma must be positive and finite".into(),
                ));
            }
        }
        Alphabet::Permutation(symbols) => {
            if symbols.len() < 2 {
                return Err(GenoptError::Configuration(
                    "a permutation alphabet needs at least 2 symbols".into(),
                ));
            }
            if lengths.iter().any(|&l| l != symbols.len()) {
                return Err(GenoptError::Configuration(
                    "partially matched crossover requires every chromosome \
                     length to equal the alphabet length"
                        .into(),
                ));
            }
            if config.chromosome_sets != 1 {
                return Err(GenoptError::Configuration(
                    "partially matched crossover only works with haploid \
                     genomes"
                        .into(),
                ));
            }
            if config.number_children != 2 {
                return Err(GenoptError::Configuration(
                    "partially matched crossover always produces exactly two \
                     children"
                        .into(),
                ));
            }
        }
        Alphabet::Discrete(symbols) => {
            if symbols.len() < 2 {
                return Err(GenoptError::Configuration(
                    "a discrete alphabet needs at least 2 symbols".into(),
                ));
            }
        }
    }
    Ok(())
}

fn resolve_tuning(config: &OptimizerConfig, alphabet: &Alphabet) -> Result<Tuning> {
    let continuous = alphabet.is_continuous();
    let pmx = alphabet.is_permutation();

    let p_crossover = config.p_crossover.unwrap_or(if continuous {
        0.0
    } else if pmx {
        0.9
    } else {
        0.6
    });
    let p_mutation = config.p_mutation.unwrap_or(if continuous {
        0.3
    } else if pmx {
        0.4
    } else {
        0.0333
    });
    let p_inversion = config.p_inversion.unwrap_or(0.0);

    let fitness_scale = match config.fitness_scale {
        FitnessScale::Off => None,
        FitnessScale::Auto => {
            if continuous || pmx || alphabet.is_character() {
                None
            } else {
                Some(1.6)
            }
        }
        FitnessScale::Factor(scale) => {
            if scale <= 1.0 {
                return Err(GenoptError::Configuration(
                    "fitness scale must be greater than 1".into(),
                ));
            }
            Some(scale)
        }
    };

    Ok(Tuning {
        p_crossover,
        p_mutation,
        p_inversion,
        population_growth: config.population_growth,
        overpopulation: config.overpopulation,
        fitness_scale,
        float_sigma: config.float_sigma,
        float_sigma_adapt: config.float_sigma_adapt,
    })
}
