//! Genetic-algorithm optimizer for arbitrary black-box objective functions.
//!
//! Candidate solutions are encoded as genotypes: chromosomes of genes whose
//! alleles are drawn from a configurable alphabet (a discrete symbol set,
//! the continuous unit interval, or a permutation of a symbol set). The
//! optimizer evolves a population through fitness-proportionate mating,
//! crossover (simple or partially matched), mutation, inversion, diploid
//! meiosis, fitness scaling, and survival of the fittest. No gradients are
//! used; the objective function is an opaque callable.
//!
//! ```no_run
//! use genopt::{Optimizer, OptimizerConfig};
//!
//! // maximize the decoded value of a 32-bit binary chromosome
//! let config = OptimizerConfig {
//!     chromosome_lengths: vec![32],
//!     population_size: 30,
//!     seed: Some(42),
//!     ..OptimizerConfig::default()
//! };
//! let mut optimizer = Optimizer::new(
//!     config,
//!     Box::new(|phenotype| phenotype.real().unwrap_or(0.0)),
//!     None,
//!     None,
//! )?;
//! optimizer.run(20, None)?;
//! let (_genotype, phenotype, fitness) = optimizer.best_fit()?;
//! # Ok::<(), genopt::GenoptError>(())
//! ```

pub mod alphabet;
pub mod decoder;
pub mod error;
pub mod genotype;
pub mod operators;
pub mod optimizer;
pub mod selection;
pub mod statistics;

pub use alphabet::{Allele, Alphabet};
pub use decoder::{generic_decoder, Phenotype};
pub use error::{GenoptError, Result};
pub use genotype::{Chromosome, Genotype};
pub use optimizer::{
    DecoderFn, FitnessScale, GenerationView, ObjectiveFn, Optimizer,
    OptimizerConfig, ProgressHook, Tuning,
};
pub use statistics::GenerationStats;
