use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::alphabet::{Allele, Alphabet};
use crate::error::{GenoptError, Result};
use crate::genotype::{Chromosome, Genotype};

/// Simple crossover between two haploid genomes, producing
/// `number_children` offspring (always an even count).
///
/// For each offspring pair, one crossover point is drawn per chromosome with
/// probability `p_crossover` (no crossover leaves the point at the full
/// length); children splice the parent columns at that point with
/// alternating origin. Also used on gamete pairs during diploid meiosis.
///
/// Returns the offspring and the number of chromosomes actually split.
pub fn simple_crossover(
    parent1: &Genotype,
    parent2: &Genotype,
    number_children: usize,
    p_crossover: f64,
    rng: &mut StdRng,
) -> (Vec<Genotype>, usize) {
    debug_assert!(parent1.haploid() && parent2.haploid());

    let lengths = parent1.chromosome_lengths();
    let alphabet = parent1.alphabet_arc();
    let mut crossovers = 0;
    let mut children = Vec::with_capacity(number_children);

    for _ in (0..number_children).step_by(2) {
        let mut genome_a = Vec::with_capacity(lengths.len());
        let mut genome_b = Vec::with_capacity(lengths.len());
        for (i, &length) in lengths.iter().enumerate() {
            let point = if length > 1 && rng.gen::<f64>() <= p_crossover {
                crossovers += 1;
                rng.gen_range(1..length)
            } else {
                length
            };
            let col1 = parent1.genome()[i].column(0);
            let col2 = parent2.genome()[i].column(0);
            let mut a = col1[..point].to_vec();
            a.extend_from_slice(&col2[point..]);
            let mut b = col2[..point].to_vec();
            b.extend_from_slice(&col1[point..]);
            genome_a.push(Chromosome::from_column(&a));
            genome_b.push(Chromosome::from_column(&b));
        }
        children.push(Genotype::from_genome(&genome_a, 1, alphabet));
        children.push(Genotype::from_genome(&genome_b, 1, alphabet));
    }

    (children, crossovers)
}

/// Partially matched crossover for permutation genomes.
///
/// Children start as copies of the parents. Per chromosome, with probability
/// `p_crossover`, the parents' alleles are swapped over a random inclusive
/// range; each displaced duplicate is relocated to where the incoming allele
/// previously sat, so both children remain full permutations of the
/// alphabet.
///
/// Returns the two children and the number of chromosome segments swapped.
pub fn partially_matched_crossover(
    parent1: &Genotype,
    parent2: &Genotype,
    p_crossover: f64,
    rng: &mut StdRng,
) -> (Vec<Genotype>, usize) {
    let alphabet = parent1.alphabet_arc();
    let mut child0 = Genotype::from_genome(parent1.genome(), 1, alphabet);
    let mut child1 = Genotype::from_genome(parent2.genome(), 1, alphabet);
    let mut crossovers = 0;

    for i in 0..child0.number_chromosomes() {
        if rng.gen::<f64>() > p_crossover {
            continue;
        }
        let length = child0.genome()[i].len();
        let (mut lo, mut hi) = (rng.gen_range(0..length), rng.gen_range(0..length));
        if lo > hi {
            std::mem::swap(&mut lo, &mut hi);
        }
        for j in lo..=hi {
            let allele0 = child0.genome()[i].get(j, 0);
            let allele1 = child1.genome()[i].get(j, 0);
            if allele0 == allele1 {
                continue;
            }
            // where the incoming allele already sits in each child; both
            // lookups succeed as long as the chromosomes are permutations
            let (Some(j0), Some(j1)) = (
                child0.genome()[i].position_of(&allele1, 0),
                child1.genome()[i].position_of(&allele0, 0),
            ) else {
                continue;
            };
            // swap the section alleles, then relocate the displaced
            // duplicates to keep the alphabet complete
            child0.genome_mut()[i].set(j, 0, allele1);
            child1.genome_mut()[i].set(j, 0, allele0);
            child0.genome_mut()[i].set(j0, 0, allele0);
            child1.genome_mut()[i].set(j1, 0, allele1);
        }
        crossovers += 1;
    }

    (vec![child0, child1], crossovers)
}

/// Mutate the genes of a genotype in place.
///
/// `p_mutation` applies per gene position per chromosome set. Continuous
/// genes receive normally distributed noise clamped to the unit interval;
/// permutation genes swap with a second random position (probability halved,
/// each swap counted twice, since one event touches two positions); size-2
/// discrete alphabets flip to the other allele; larger alphabets draw
/// uniformly from the remaining symbols.
///
/// Returns the number of mutations applied.
pub fn mutate(
    genotype: &mut Genotype,
    p_mutation: f64,
    float_sigma: f64,
    rng: &mut StdRng,
) -> Result<usize> {
    if p_mutation == 0.0 {
        return Ok(0);
    }

    let pmx = genotype.pmx();
    let (threshold, increment) =
        if pmx { (p_mutation / 2.0, 2) } else { (p_mutation, 1) };

    let normal = if genotype.alphabet().is_continuous() {
        Some(Normal::new(0.0, float_sigma).map_err(|_| {
            GenoptError::Configuration(format!(
                "float sigma must be positive and finite, got {}",
                float_sigma
            ))
        })?)
    } else {
        None
    };

    let alphabet = genotype.alphabet().clone();
    let sets = genotype.chromosome_sets();
    let mut mutations = 0;

    for i in 0..genotype.number_chromosomes() {
        let length = genotype.genome()[i].len();
        for j in 0..length {
            for k in 0..sets {
                if rng.gen::<f64>() > threshold {
                    continue;
                }
                let chromosome = &mut genotype.genome_mut()[i];
                match &alphabet {
                    Alphabet::Permutation(_) => {
                        let j_alt = rng.gen_range(0..length);
                        chromosome.swap_genes(j, j_alt, k);
                    }
                    Alphabet::Continuous => {
                        let noise = normal
                            .as_ref()
                            .map(|n| n.sample(rng))
                            .unwrap_or(0.0);
                        let value = chromosome.get(j, k).as_f64() + noise;
                        chromosome.set(j, k, Allele::Real(value.clamp(0.0, 1.0)));
                    }
                    Alphabet::Discrete(symbols) => {
                        let current = chromosome.get(j, k);
                        let Some(exclude) = alphabet.position_of(&current) else {
                            continue;
                        };
                        if symbols.len() == 2 {
                            // binary genes always flip to the other allele
                            chromosome.set(j, k, symbols[1 - exclude]);
                        } else {
                            let mut r = rng.gen_range(0..symbols.len() - 1);
                            if r >= exclude {
                                r += 1;
                            }
                            chromosome.set(j, k, symbols[r]);
                        }
                    }
                }
                mutations += increment;
            }
        }
    }

    Ok(mutations)
}

/// Invert a random gene range of a genotype in place.
///
/// `p_inversion` applies per chromosome per chromosome set; the inclusive
/// range between two independently drawn positions is reversed.
///
/// Returns the number of inversions applied.
pub fn invert(genotype: &mut Genotype, p_inversion: f64, rng: &mut StdRng) -> usize {
    if p_inversion == 0.0 {
        return 0;
    }

    let sets = genotype.chromosome_sets();
    let mut inversions = 0;

    for i in 0..genotype.number_chromosomes() {
        let length = genotype.genome()[i].len();
        for k in 0..sets {
            if rng.gen::<f64>() > p_inversion {
                continue;
            }
            let (mut lo, mut hi) =
                (rng.gen_range(0..length), rng.gen_range(0..length));
            if lo > hi {
                std::mem::swap(&mut lo, &mut hi);
            }
            genotype.genome_mut()[i].reverse_range(lo, hi, k);
            inversions += 1;
        }
    }

    inversions
}

/// Split a diploid genotype into its two haploid gametes, one per
/// chromosome set.
pub fn meiosis(genotype: &Genotype) -> (Genotype, Genotype) {
    debug_assert!(genotype.diploid());

    let alphabet = genotype.alphabet_arc();
    let split = |set: usize| {
        let genome: Vec<Chromosome> = genotype
            .genome()
            .iter()
            .map(|c| Chromosome::from_column(&c.column(set)))
            .collect();
        Genotype::from_genome(&genome, 1, alphabet)
    };
    (split(0), split(1))
}

/// Fertilize maternal gametes with paternal gametes one-to-one, producing
/// as many diploid children as there were gametes per parent.
pub fn fertilize(maternal: &[Genotype], paternal: &[Genotype]) -> Vec<Genotype> {
    debug_assert_eq!(maternal.len(), paternal.len());

    maternal
        .iter()
        .zip(paternal)
        .map(|(m, p)| {
            let genome: Vec<Chromosome> = m
                .genome()
                .iter()
                .zip(p.genome())
                .map(|(mc, pc)| {
                    Chromosome::from_columns(&mc.column(0), &pc.column(0))
                })
                .collect();
            Genotype::from_genome(&genome, 2, m.alphabet_arc())
        })
        .collect()
}
