use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::alphabet::{Allele, Alphabet};
use crate::error::{GenoptError, Result};

/// A fixed-length ordered sequence of genes, each holding one allele per
/// chromosome set (haploid: 1, diploid: 2). Stored as a length x sets matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Chromosome {
    genes: Vec<Allele>,
    sets: usize,
}

impl Chromosome {
    /// Constant chromosome with every gene of every set holding `fill`.
    pub fn filled(length: usize, sets: usize, fill: Allele) -> Self {
        Self { genes: vec![fill; length * sets], sets }
    }

    /// Haploid chromosome over the given gene column.
    pub fn from_column(column: &[Allele]) -> Self {
        Self { genes: column.to_vec(), sets: 1 }
    }

    /// Diploid chromosome pairing a maternal and a paternal gene column.
    pub fn from_columns(maternal: &[Allele], paternal: &[Allele]) -> Self {
        debug_assert_eq!(maternal.len(), paternal.len());
        let mut genes = Vec::with_capacity(maternal.len() * 2);
        for (m, p) in maternal.iter().zip(paternal) {
            genes.push(*m);
            genes.push(*p);
        }
        Self { genes, sets: 2 }
    }

    /// Number of genes (independent of the number of sets).
    pub fn len(&self) -> usize {
        self.genes.len() / self.sets
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn sets(&self) -> usize {
        self.sets
    }

    pub fn get(&self, gene: usize, set: usize) -> Allele {
        self.genes[gene * self.sets + set]
    }

    pub fn set(&mut self, gene: usize, set: usize, allele: Allele) {
        self.genes[gene * self.sets + set] = allele;
    }

    /// Swap the alleles at two gene positions within one set.
    pub fn swap_genes(&mut self, a: usize, b: usize, set: usize) {
        self.genes.swap(a * self.sets + set, b * self.sets + set);
    }

    /// Reverse the gene order over the inclusive range [lo, hi] in one set.
    pub fn reverse_range(&mut self, lo: usize, hi: usize, set: usize) {
        let (mut a, mut b) = (lo, hi);
        while a < b {
            self.swap_genes(a, b, set);
            a += 1;
            b -= 1;
        }
    }

    /// One full set as an owned gene column.
    pub fn column(&self, set: usize) -> Vec<Allele> {
        (0..self.len()).map(|j| self.get(j, set)).collect()
    }

    /// Position of `allele` within one set, if present.
    pub fn position_of(&self, allele: &Allele, set: usize) -> Option<usize> {
        (0..self.len()).find(|&j| self.get(j, set) == *allele)
    }
}

/// Full genetic encoding of one candidate solution: all chromosomes plus the
/// fitness of the corresponding phenotype in the environment provided by the
/// objective function.
///
/// Fitness fields start unset and are filled in once per generation by the
/// evaluation phase; the scaled fitness defaults to the raw fitness and is
/// overwritten when fitness scaling is enabled.
#[derive(Clone, Debug)]
pub struct Genotype {
    genome: Vec<Chromosome>,
    sets: usize,
    alphabet: Arc<Alphabet>,
    character_alphabet: bool,
    fitness: Option<f64>,
    scaled_fitness: Option<f64>,
}

impl Genotype {
    /// Draw a random genotype: independent uniform alleles for discrete
    /// alphabets, uniform unit-interval values for the continuous alphabet,
    /// and a uniformly random permutation of the full symbol set per
    /// chromosome for permutation alphabets.
    pub fn random(
        lengths: &[usize],
        sets: usize,
        alphabet: &Arc<Alphabet>,
        rng: &mut StdRng,
    ) -> Self {
        let genome = lengths
            .iter()
            .map(|&length| {
                let mut chromosome =
                    Chromosome::filled(length, sets, Allele::Real(0.0));
                match alphabet.as_ref() {
                    Alphabet::Continuous => {
                        for j in 0..length {
                            for k in 0..sets {
                                chromosome.set(j, k, Allele::Real(rng.gen()));
                            }
                        }
                    }
                    Alphabet::Permutation(symbols) => {
                        for k in 0..sets {
                            let mut shuffled = symbols.clone();
                            shuffled.shuffle(rng);
                            for (j, allele) in shuffled.into_iter().enumerate() {
                                chromosome.set(j, k, allele);
                            }
                        }
                    }
                    Alphabet::Discrete(symbols) => {
                        for j in 0..length {
                            for k in 0..sets {
                                let pick = rng.gen_range(0..symbols.len());
                                chromosome.set(j, k, symbols[pick]);
                            }
                        }
                    }
                }
                chromosome
            })
            .collect();
        Self::assemble(genome, sets, alphabet)
    }

    /// Build a genotype from explicit genome data. The chromosomes are
    /// copied, so offspring never alias parent storage.
    pub fn from_genome(
        genome: &[Chromosome],
        sets: usize,
        alphabet: &Arc<Alphabet>,
    ) -> Self {
        Self::assemble(genome.to_vec(), sets, alphabet)
    }

    /// Constant genotype with every gene of every chromosome set to `fill`.
    /// Used to seed fringe individuals into the initial population.
    pub fn constant(
        lengths: &[usize],
        sets: usize,
        alphabet: &Arc<Alphabet>,
        fill: Allele,
    ) -> Self {
        let genome = lengths
            .iter()
            .map(|&length| Chromosome::filled(length, sets, fill))
            .collect();
        Self::assemble(genome, sets, alphabet)
    }

    fn assemble(
        genome: Vec<Chromosome>,
        sets: usize,
        alphabet: &Arc<Alphabet>,
    ) -> Self {
        Self {
            genome,
            sets,
            character_alphabet: alphabet.is_character(),
            alphabet: Arc::clone(alphabet),
            fitness: None,
            scaled_fitness: None,
        }
    }

    pub fn chromosome_lengths(&self) -> Vec<usize> {
        self.genome.iter().map(Chromosome::len).collect()
    }

    pub fn haploid(&self) -> bool {
        self.sets == 1
    }

    pub fn diploid(&self) -> bool {
        self.sets == 2
    }

    pub fn chromosome_sets(&self) -> usize {
        self.sets
    }

    pub fn number_chromosomes(&self) -> usize {
        self.genome.len()
    }

    pub fn genome(&self) -> &[Chromosome] {
        &self.genome
    }

    pub(crate) fn genome_mut(&mut self) -> &mut [Chromosome] {
        &mut self.genome
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub(crate) fn alphabet_arc(&self) -> &Arc<Alphabet> {
        &self.alphabet
    }

    /// Number of symbols in the allele alphabet; `None` for the continuous
    /// alphabet, which is infinite.
    pub fn alphabet_len(&self) -> Option<usize> {
        self.alphabet.len()
    }

    pub fn character_alphabet(&self) -> bool {
        self.character_alphabet
    }

    pub fn pmx(&self) -> bool {
        self.alphabet.is_permutation()
    }

    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn scaled_fitness(&self) -> Option<f64> {
        self.scaled_fitness
    }

    /// Record the raw fitness returned by the objective function. Fitness
    /// must be a finite non-negative number.
    pub fn set_fitness(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(GenoptError::InvalidFitness(value));
        }
        self.fitness = Some(value);
        Ok(())
    }

    pub fn set_scaled_fitness(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(GenoptError::InvalidFitness(value));
        }
        self.scaled_fitness = Some(value);
        Ok(())
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(self.genome.len());
        for chromosome in &self.genome {
            if self.alphabet.is_continuous() || self.pmx() {
                let values: Vec<String> = (0..chromosome.len())
                    .map(|j| chromosome.get(j, 0).to_string())
                    .collect();
                parts.push(values.join(" "));
            } else if self.haploid() {
                let mut s = String::new();
                for j in 0..chromosome.len() {
                    s.push_str(&chromosome.get(j, 0).to_string());
                }
                parts.push(s);
            } else {
                let mut s = String::from("(");
                for j in 0..chromosome.len() {
                    s.push_str(&chromosome.get(j, 0).to_string());
                }
                s.push_str("),(");
                for j in 0..chromosome.len() {
                    s.push_str(&chromosome.get(j, 1).to_string());
                }
                s.push(')');
                parts.push(s);
            }
        }
        write!(f, "{}", parts.join(", "))
    }
}
