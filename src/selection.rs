use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::genotype::Genotype;
use crate::statistics::GenerationStats;

/// Fitness-proportionate (roulette-wheel) mate selection over scaled
/// fitness, skipping indices in `consumed`.
///
/// A uniform threshold is drawn in [0, sum of eligible scaled fitness); the
/// population is walked accumulating scaled fitness until the running sum
/// reaches the threshold. If rounding keeps every partial sum below the
/// threshold, the highest-index eligible individual is selected.
pub fn select_mate(
    population: &[Genotype],
    consumed: &[usize],
    rng: &mut StdRng,
) -> usize {
    debug_assert!(consumed.len() < population.len());

    let mut fitness_sum = 0.0;
    for (i, individual) in population.iter().enumerate() {
        if !consumed.contains(&i) {
            fitness_sum += individual.scaled_fitness().unwrap_or(0.0);
        }
    }

    let limit = rng.gen::<f64>() * fitness_sum;
    let mut partsum = 0.0;
    let mut last_eligible = 0;
    for (j, individual) in population.iter().enumerate() {
        if consumed.contains(&j) {
            continue;
        }
        last_eligible = j;
        partsum += individual.scaled_fitness().unwrap_or(0.0);
        if partsum >= limit {
            return j;
        }
    }
    last_eligible
}

/// Linearly rescale the population's fitness to spread (or compress) the
/// selection pressure.
///
/// Maps raw fitness through `scaled = a * raw + b` so that the scaled
/// maximum approaches `scale` times the scaled mean when that keeps the
/// minimum non-negative, and otherwise scales as much as the non-negativity
/// constraint allows. Requires the statistics of the same population to have
/// been collected beforehand.
pub fn scale_fitness(
    population: &mut [Genotype],
    stats: &GenerationStats,
    scale: f64,
) -> crate::error::Result<()> {
    let (fmin, favg, fmax) = (stats.min, stats.mean, stats.max);

    if fmax == favg {
        // degenerate spread, nothing to scale
        for individual in population.iter_mut() {
            let raw = individual.fitness().unwrap_or(0.0);
            individual.set_scaled_fitness(raw)?;
        }
        return Ok(());
    }

    let a = if favg <= (fmax + fmin * (scale - 1.0)) / scale {
        favg * (scale - 1.0) / (fmax - favg)
    } else {
        favg / (favg - fmin)
    };
    let b = favg * (1.0 - a);

    for individual in population.iter_mut() {
        let raw = individual.fitness().unwrap_or(0.0);
        // clamp guards against round-off pushing the minimum negative
        individual.set_scaled_fitness((a * raw + b).max(0.0))?;
    }
    Ok(())
}

/// Reduce an over-populated generation to `target` survivors.
///
/// If the pool already matches the target it is kept as is; otherwise the
/// individuals are ranked by raw fitness and the fittest survive. The
/// survivors are shuffled so their rank order cannot bias subsequent mate
/// selection tie-breaks.
pub fn select_survivors(
    population: Vec<Genotype>,
    target: usize,
    rng: &mut StdRng,
) -> Vec<Genotype> {
    if population.len() == target {
        return population;
    }

    let mut ranked = population;
    ranked.sort_by(|a, b| {
        b.fitness()
            .partial_cmp(&a.fitness())
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(target);
    ranked.shuffle(rng);
    ranked
}
