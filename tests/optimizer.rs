use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use genopt::{
    Alphabet, DecoderFn, GenerationView, GenoptError, ObjectiveFn, Optimizer,
    OptimizerConfig, Phenotype, ProgressHook, Tuning,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Unimodal-looking polynomial on [0, 1] from Goldberg-style GA exercises:
/// global maximum 1.0 at x = 0.15, secondary maximum 0.82 at x = 0.7.
fn polynomial(x: f64) -> f64 {
    const COEFFS: [f64; 6] = [
        70.4499739424963,
        -206.190728636476,
        214.767969260518,
        -95.9080356878612,
        16.8808211213239,
        0.0,
    ];
    let mut value = 0.0;
    let mut power = 1.0;
    for coeff in COEFFS.iter().rev() {
        value += coeff * power;
        power *= x;
    }
    value.max(0.0)
}

fn polynomial_objective() -> ObjectiveFn {
    Box::new(|phenotype| polynomial(phenotype.real().unwrap_or(0.0)))
}

fn binary_config(seed: u64) -> OptimizerConfig {
    OptimizerConfig {
        chromosome_lengths: vec![32],
        population_size: 30,
        seed: Some(seed),
        ..OptimizerConfig::default()
    }
}

#[test]
fn haploid_binary_converges_to_peak() {
    init_logging();
    let mut optimizer =
        Optimizer::new(binary_config(42), polynomial_objective(), None, None)
            .unwrap();
    optimizer.run(20, None).unwrap();

    let (_, phenotype, best_fitness) = optimizer.best_fit().unwrap();
    println!("best {:?} with fitness {:.5}", phenotype, best_fitness);
    assert!(best_fitness > 0.99);
    assert_eq!(optimizer.population().len(), 30);
    assert_eq!(optimizer.generation(), 20);
    assert!(!optimizer.pmx());
}

#[test]
fn early_exit_stops_at_fitness_bound() {
    init_logging();
    let mut optimizer =
        Optimizer::new(binary_config(7), polynomial_objective(), None, None)
            .unwrap();
    optimizer.run(20, Some(0.5)).unwrap();

    let (_, _, best_fitness) = optimizer.best_fit().unwrap();
    assert!(best_fitness >= 0.5);
    assert!(optimizer.generation() < 20);
    assert_eq!(optimizer.population().len(), 30);
}

#[test]
fn diploid_triallelic_converges_to_peak() {
    init_logging();
    let config = OptimizerConfig {
        chromosome_sets: 2,
        ..binary_config(42)
    };
    let mut optimizer =
        Optimizer::new(config, polynomial_objective(), None, None).unwrap();
    optimizer.run(20, None).unwrap();

    let (_, _, best_fitness) = optimizer.best_fit().unwrap();
    assert!(best_fitness > 0.99);
    assert_eq!(optimizer.population().len(), 30);
    assert_eq!(optimizer.generation(), 20);
}

fn circle_cities(n: usize) -> Vec<(f64, f64)> {
    (0..n)
        .map(|k| {
            let angle = 2.0 * std::f64::consts::PI * k as f64 / n as f64;
            (angle.cos(), angle.sin())
        })
        .collect()
}

fn tour_length(order: &[i64], cities: &[(f64, f64)]) -> f64 {
    let n = order.len();
    (0..n)
        .map(|i| {
            let a = cities[order[i] as usize];
            let b = cities[order[(i + 1) % n] as usize];
            ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
        })
        .sum()
}

#[test]
fn pmx_solves_five_city_tour() {
    init_logging();
    let cities = circle_cities(5);
    // cities sit on a circle, so the cyclic order is the optimal tour
    let optimal = 10.0 * (std::f64::consts::PI / 5.0).sin();

    let objective: ObjectiveFn = Box::new(move |phenotype| {
        let order = phenotype.sequence().unwrap_or(&[]);
        optimal / tour_length(order, &cities)
    });

    let config = OptimizerConfig {
        chromosome_lengths: vec![5],
        population_size: 60,
        alphabet: Some(Alphabet::index_permutation(5)),
        seed: Some(1234),
        ..OptimizerConfig::default()
    };
    let mut optimizer = Optimizer::new(config, objective, None, None).unwrap();
    assert!(optimizer.pmx());
    optimizer.run(30, None).unwrap();

    // every surviving genome must still be a permutation of {0..4}
    for individual in optimizer.population() {
        let mut order: Vec<i64> = individual.genome()[0]
            .column(0)
            .iter()
            .map(|a| a.as_i64().unwrap())
            .collect();
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    let (_, phenotype, best_fitness) = optimizer.best_fit().unwrap();
    println!("best tour {:?} with fitness {:.5}", phenotype, best_fitness);
    assert!(best_fitness > 0.999);
}

#[test]
fn population_growth_compounds_per_generation() {
    init_logging();
    let config = OptimizerConfig {
        population_size: 20,
        population_growth: 1.1,
        ..binary_config(99)
    };
    let mut optimizer =
        Optimizer::new(config, polynomial_objective(), None, None).unwrap();
    optimizer.run(20, None).unwrap();
    assert_eq!(optimizer.population().len(), 132);
}

#[test]
fn statistics_keep_ordering_invariant() {
    init_logging();
    let mut optimizer =
        Optimizer::new(binary_config(17), polynomial_objective(), None, None)
            .unwrap();
    optimizer.run(15, None).unwrap();

    assert_eq!(optimizer.statistics().len(), 16);
    for stats in optimizer.statistics() {
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
        assert!(stats.variance >= -1e-12);
        assert!(stats.divorce_rate.is_none());
    }
}

#[test]
fn immortal_best_never_regresses() {
    init_logging();
    let mut optimizer =
        Optimizer::new(binary_config(23), polynomial_objective(), None, None)
            .unwrap();
    optimizer.run(15, None).unwrap();

    let maxima: Vec<f64> =
        optimizer.statistics().iter().map(|s| s.max).collect();
    for pair in maxima.windows(2) {
        assert!(pair[1] >= pair[0] - 1e-12);
    }
}

#[test]
fn monogamous_mating_records_divorce_rate() {
    init_logging();
    let config = OptimizerConfig {
        monogamous: true,
        ..binary_config(31)
    };
    let mut optimizer =
        Optimizer::new(config, polynomial_objective(), None, None).unwrap();
    optimizer.run(5, None).unwrap();

    for stats in optimizer.statistics() {
        let rate = stats.divorce_rate.expect("monogamous runs record divorce");
        assert!((0.0..=1.0).contains(&rate));
    }
    assert_eq!(optimizer.population().len(), 30);
}

#[test]
fn four_children_per_mating() {
    init_logging();
    let config = OptimizerConfig {
        number_children: 4,
        ..binary_config(61)
    };
    let mut optimizer =
        Optimizer::new(config, polynomial_objective(), None, None).unwrap();
    optimizer.run(10, None).unwrap();
    assert_eq!(optimizer.population().len(), 30);
}

#[test]
fn continuous_alphabet_adapts_sigma() {
    init_logging();
    let objective: ObjectiveFn = Box::new(|phenotype| {
        let x = phenotype.real().unwrap_or(0.0);
        (1.0 - (x - 0.3).abs()).max(0.0)
    });
    let config = OptimizerConfig {
        chromosome_lengths: vec![1],
        population_size: 30,
        alphabet: Some(Alphabet::Continuous),
        float_sigma: 0.5,
        seed: Some(77),
        ..OptimizerConfig::default()
    };
    let mut optimizer = Optimizer::new(config, objective, None, None).unwrap();
    assert_eq!(optimizer.tuning().p_crossover, 0.0);
    assert_eq!(optimizer.tuning().p_mutation, 0.3);
    assert_eq!(optimizer.tuning().fitness_scale, None);

    optimizer.run(12, None).unwrap();
    assert!(optimizer.tuning().float_sigma > 0.0);
    // scaling is disabled, so scaled fitness tracks raw fitness exactly
    for individual in optimizer.population() {
        assert_eq!(individual.scaled_fitness(), individual.fitness());
    }
    let (_, _, best_fitness) = optimizer.best_fit().unwrap();
    assert!(best_fitness >= optimizer.statistics()[0].max - 1e-12);
}

#[test]
fn character_alphabet_guesses_password() {
    init_logging();
    let password = "GA";
    let objective: ObjectiveFn = Box::new(move |phenotype| {
        let guess = phenotype.text().unwrap_or("");
        let correct = password
            .chars()
            .zip(guess.chars())
            .filter(|(a, b)| a == b)
            .count();
        correct as f64 / password.len() as f64
    });
    let config = OptimizerConfig {
        chromosome_lengths: vec![password.len()],
        population_size: 30,
        alphabet: Some(Alphabet::alnum()),
        p_crossover: Some(0.2),
        p_mutation: Some(0.5),
        seed: Some(2024),
        ..OptimizerConfig::default()
    };
    let mut optimizer = Optimizer::new(config, objective, None, None).unwrap();
    assert_eq!(optimizer.tuning().fitness_scale, None);
    optimizer.run(60, Some(1.0)).unwrap();

    let (_, phenotype, best_fitness) = optimizer.best_fit().unwrap();
    println!("best guess {:?} with fitness {:.3}", phenotype, best_fitness);
    assert!(best_fitness >= optimizer.statistics()[0].max - 1e-12);
    assert!(phenotype.text().is_some());
}

#[test]
fn parallel_evaluation_matches_sequential() {
    init_logging();
    let sequential = {
        let mut optimizer = Optimizer::new(
            binary_config(5150),
            polynomial_objective(),
            None,
            None,
        )
        .unwrap();
        optimizer.run(8, None).unwrap();
        optimizer.statistics().to_vec()
    };
    let parallel = {
        let config = OptimizerConfig {
            parallel: true,
            ..binary_config(5150)
        };
        let mut optimizer =
            Optimizer::new(config, polynomial_objective(), None, None).unwrap();
        optimizer.run(8, None).unwrap();
        optimizer.statistics().to_vec()
    };
    // evaluation order never feeds back into the operator random stream
    assert_eq!(sequential, parallel);
}

struct CountingHook {
    calls: Arc<AtomicUsize>,
}

impl ProgressHook for CountingHook {
    fn on_generation(&mut self, view: &GenerationView<'_>, _tuning: &mut Tuning) {
        assert_eq!(view.generation + 1, view.statistics.len());
        assert!(view.best_fitness >= 0.0);
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn hook_runs_once_per_generation_including_zero() {
    init_logging();
    let calls = Arc::new(AtomicUsize::new(0));
    let hook = Box::new(CountingHook { calls: Arc::clone(&calls) });
    let mut optimizer = Optimizer::new(
        binary_config(3),
        polynomial_objective(),
        None,
        Some(hook),
    )
    .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    optimizer.run(6, None).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 7);
}

struct MutationSilencer;

impl ProgressHook for MutationSilencer {
    fn on_generation(&mut self, _view: &GenerationView<'_>, tuning: &mut Tuning) {
        tuning.p_mutation = 0.0;
    }
}

#[test]
fn hook_can_retune_the_optimizer() {
    init_logging();
    let mut optimizer = Optimizer::new(
        binary_config(13),
        polynomial_objective(),
        None,
        Some(Box::new(MutationSilencer)),
    )
    .unwrap();
    optimizer.run(5, None).unwrap();

    assert_eq!(optimizer.tuning().p_mutation, 0.0);
    for stats in &optimizer.statistics()[1..] {
        assert_eq!(stats.mutations, 0);
        assert!(stats.crossovers > 0);
    }
}

#[test]
fn unsupported_encoding_needs_custom_decoder() {
    init_logging();
    let config = OptimizerConfig {
        chromosome_lengths: vec![8],
        alphabet: Some(Alphabet::ints(&[0, 1, 2])),
        seed: Some(19),
        ..OptimizerConfig::default()
    };

    // the generic decoder cannot interpret a ternary numeric alphabet
    let objective: ObjectiveFn = Box::new(|_| 0.5);
    assert!(matches!(
        Optimizer::new(config.clone(), objective, None, None),
        Err(GenoptError::UnsupportedEncoding(_))
    ));

    // a custom decoder makes the same configuration viable
    let decoder: DecoderFn = Box::new(|genotype| {
        let sum: f64 = genotype.genome()[0]
            .column(0)
            .iter()
            .map(|a| a.as_f64())
            .sum();
        Ok(Phenotype::Real(sum / 16.0))
    });
    let objective: ObjectiveFn =
        Box::new(|phenotype| phenotype.real().unwrap_or(0.0));
    let mut optimizer =
        Optimizer::new(config, objective, Some(decoder), None).unwrap();
    optimizer.run(10, None).unwrap();
    let (_, _, best_fitness) = optimizer.best_fit().unwrap();
    assert!(best_fitness <= 1.0);
}

#[test]
fn statistics_history_serializes() {
    init_logging();
    let mut optimizer =
        Optimizer::new(binary_config(29), polynomial_objective(), None, None)
            .unwrap();
    optimizer.run(3, None).unwrap();

    let json = serde_json::to_string(optimizer.statistics()).unwrap();
    let back: Vec<genopt::GenerationStats> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.as_slice(), optimizer.statistics());
}
