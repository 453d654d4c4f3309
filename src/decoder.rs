use crate::alphabet::{Allele, Alphabet};
use crate::error::{GenoptError, Result};
use crate::genotype::Genotype;

/// Decoded parameter values handed to the objective function.
///
/// Single-chromosome and single-gene genomes collapse to the scalar and
/// single-vector forms so simple objective functions stay simple.
#[derive(Clone, Debug, PartialEq)]
pub enum Phenotype {
    Real(f64),
    RealVector(Vec<f64>),
    RealVectors(Vec<Vec<f64>>),
    Sequence(Vec<i64>),
    Sequences(Vec<Vec<i64>>),
    Text(String),
    Texts(Vec<String>),
}

impl Phenotype {
    pub fn real(&self) -> Option<f64> {
        match self {
            Phenotype::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn reals(&self) -> Option<&[f64]> {
        match self {
            Phenotype::RealVector(v) => Some(v),
            _ => None,
        }
    }

    pub fn sequence(&self) -> Option<&[i64]> {
        match self {
            Phenotype::Sequence(v) => Some(v),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Phenotype::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Map a genotype to the phenotype consumed by the objective function.
///
/// Covers the common encodings: continuous and permutation genomes pass
/// through as value arrays, character genomes become strings, biallelic
/// haploid and triallelic diploid genomes map each chromosome onto a single
/// real in [0, 1] by treating its genes as bits of a big-endian binary
/// fraction. Anything else needs a user-supplied decoder.
pub fn generic_decoder(genotype: &Genotype) -> Result<Phenotype> {
    match genotype.alphabet() {
        Alphabet::Continuous => {
            if genotype.diploid() {
                return Err(GenoptError::UnsupportedEncoding(
                    "continuous genomes decode as haploid only".into(),
                ));
            }
            let mut vectors: Vec<Vec<f64>> = Vec::new();
            for chromosome in genotype.genome() {
                vectors.push(
                    chromosome.column(0).iter().map(Allele::as_f64).collect(),
                );
            }
            if vectors.len() > 1 {
                Ok(Phenotype::RealVectors(vectors))
            } else if vectors[0].len() > 1 {
                Ok(Phenotype::RealVector(vectors.remove(0)))
            } else {
                Ok(Phenotype::Real(vectors[0][0]))
            }
        }
        Alphabet::Permutation(_) => {
            if genotype.diploid() {
                return Err(GenoptError::UnsupportedEncoding(
                    "permutation genomes decode as haploid only".into(),
                ));
            }
            let mut sequences: Vec<Vec<i64>> = Vec::new();
            for chromosome in genotype.genome() {
                let sequence: Option<Vec<i64>> =
                    chromosome.column(0).iter().map(Allele::as_i64).collect();
                sequences.push(sequence.ok_or_else(|| {
                    GenoptError::UnsupportedEncoding(
                        "permutation genomes decode as integer sequences only"
                            .into(),
                    )
                })?);
            }
            if sequences.len() > 1 {
                Ok(Phenotype::Sequences(sequences))
            } else {
                Ok(Phenotype::Sequence(sequences.remove(0)))
            }
        }
        Alphabet::Discrete(symbols) => {
            if genotype.character_alphabet() {
                if genotype.diploid() {
                    return Err(GenoptError::UnsupportedEncoding(
                        "character genomes decode as haploid only".into(),
                    ));
                }
                let mut texts: Vec<String> = Vec::new();
                for chromosome in genotype.genome() {
                    texts.push(
                        chromosome.column(0).iter().map(|a| a.to_string()).collect(),
                    );
                }
                if texts.len() > 1 {
                    Ok(Phenotype::Texts(texts))
                } else {
                    Ok(Phenotype::Text(texts.remove(0)))
                }
            } else if genotype.haploid() {
                if symbols != &[Allele::Int(0), Allele::Int(1)] {
                    return Err(GenoptError::UnsupportedEncoding(
                        "haploid genomes decode generically only over the \
                         alphabet [0, 1]"
                            .into(),
                    ));
                }
                binary_fraction(genotype, |c, j| c.get(j, 0).as_f64())
            } else {
                if symbols != &[Allele::Int(-1), Allele::Int(0), Allele::Int(1)] {
                    return Err(GenoptError::UnsupportedEncoding(
                        "diploid genomes decode generically only over the \
                         alphabet [-1, 0, 1]"
                            .into(),
                    ));
                }
                // the alphabet [-1,0,1] is chosen such that the maximum of a
                // gene pair expresses dominant and recessive alleles
                binary_fraction(genotype, |c, j| {
                    let expressed = c.get(j, 0).as_f64().max(c.get(j, 1).as_f64());
                    expressed.abs()
                })
            }
        }
    }
}

/// Interpret each chromosome's expressed genes as bits of a big-endian
/// binary fraction, yielding one real in [0, 1] per chromosome.
fn binary_fraction<F>(genotype: &Genotype, express: F) -> Result<Phenotype>
where
    F: Fn(&crate::genotype::Chromosome, usize) -> f64,
{
    let mut values = Vec::with_capacity(genotype.number_chromosomes());
    for chromosome in genotype.genome() {
        let length = chromosome.len() as i32;
        let mut accu = 0.0;
        let mut power2 = 2f64.powi(length - 1);
        for j in 0..chromosome.len() {
            accu += express(chromosome, j) * power2;
            power2 /= 2.0;
        }
        values.push(accu / (2f64.powi(length) - 1.0));
    }
    if values.len() > 1 {
        Ok(Phenotype::RealVector(values))
    } else {
        Ok(Phenotype::Real(values[0]))
    }
}
