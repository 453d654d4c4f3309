use serde::{Deserialize, Serialize};

use crate::genotype::Genotype;

/// Fitness statistics and operator counts for one generation, computed over
/// the over-populated offspring pool before survivor selection. Records are
/// appended in order and never modified; index 0 describes the initial
/// population.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub mean: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub crossovers: usize,
    pub mutations: usize,
    pub inversions: usize,
    /// Fraction of the population left unmatched when the exclusion set was
    /// last cleared; recorded only under monogamous mating.
    pub divorce_rate: Option<f64>,
}

impl GenerationStats {
    /// Collect raw-fitness statistics over an evaluated population.
    ///
    /// Every individual must carry a fitness value; evaluation happens
    /// strictly before statistics are recorded.
    pub fn collect(
        population: &[Genotype],
        crossovers: usize,
        mutations: usize,
        inversions: usize,
        divorce_rate: Option<f64>,
    ) -> Self {
        let mut sum = 0.0;
        let mut sum_squared = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for individual in population {
            let fitness = individual.fitness().unwrap_or(0.0);
            sum += fitness;
            sum_squared += fitness * fitness;
            min = min.min(fitness);
            max = max.max(fitness);
        }
        let n = population.len() as f64;
        let mean = sum / n;
        Self {
            mean,
            variance: sum_squared / n - mean * mean,
            min,
            max,
            crossovers,
            mutations,
            inversions,
            divorce_rate,
        }
    }
}
