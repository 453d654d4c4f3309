use std::fmt;

use serde::{Deserialize, Serialize};

/// A concrete symbol value a gene may hold.
///
/// Discrete alphabets hold alleles of a single variant kind; `Real` alleles
/// only occur in genomes drawn from the continuous unit interval.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Allele {
    Int(i64),
    Chr(char),
    Real(f64),
}

impl Allele {
    /// Numeric view of the allele; characters map to their code point.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Allele::Int(v) => v as f64,
            Allele::Chr(c) => c as u32 as f64,
            Allele::Real(v) => v,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Allele::Int(v) => Some(v),
            _ => None,
        }
    }

    fn is_printable_char(&self) -> bool {
        matches!(*self, Allele::Chr(c) if !c.is_control())
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Allele::Int(v) => write!(f, "{}", v),
            Allele::Chr(c) => write!(f, "{}", c),
            Allele::Real(v) => write!(f, "{}", v),
        }
    }
}

/// The set of values genes draw their alleles from.
///
/// Every genetic operator dispatches on this tag: `Discrete` genomes draw
/// independent symbols, `Permutation` genomes are reorderings of the full
/// symbol set (recombined with partially matched crossover), and `Continuous`
/// genomes hold real values in the unit interval.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Alphabet {
    Discrete(Vec<Allele>),
    Permutation(Vec<Allele>),
    Continuous,
}

impl Alphabet {
    /// The biallelic alphabet {0, 1}, the haploid default.
    pub fn binary() -> Self {
        Alphabet::ints(&[0, 1])
    }

    /// The triallelic alphabet {-1, 0, 1}, the diploid default; -1 encodes a
    /// recessive 1, 0 a 0, and 1 a dominant 1.
    pub fn triallelic() -> Self {
        Alphabet::ints(&[-1, 0, 1])
    }

    /// A blank and the ASCII letters.
    pub fn alpha() -> Self {
        Alphabet::chars(" ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz")
    }

    /// `alpha` plus decimal digits.
    pub fn alnum() -> Self {
        Alphabet::chars(
            " ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789",
        )
    }

    /// All characters found on a US keyboard.
    pub fn characters() -> Self {
        Alphabet::chars(
            " ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789\
             ~`!@#$%^&*()-_=+[{]}\\|;:'\",<.>/?",
        )
    }

    /// Discrete alphabet over the given integers.
    pub fn ints(values: &[i64]) -> Self {
        Alphabet::Discrete(values.iter().map(|&v| Allele::Int(v)).collect())
    }

    /// Discrete alphabet over the characters of `symbols`.
    pub fn chars(symbols: &str) -> Self {
        Alphabet::Discrete(symbols.chars().map(Allele::Chr).collect())
    }

    /// Permutation alphabet over the indices 0..n, the conventional encoding
    /// for tour and ordering problems.
    pub fn index_permutation(n: usize) -> Self {
        Alphabet::Permutation((0..n as i64).map(Allele::Int).collect())
    }

    /// Number of symbols; `None` for the continuous alphabet, which is
    /// infinite.
    pub fn len(&self) -> Option<usize> {
        match self {
            Alphabet::Discrete(symbols) | Alphabet::Permutation(symbols) => {
                Some(symbols.len())
            }
            Alphabet::Continuous => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    pub fn symbols(&self) -> Option<&[Allele]> {
        match self {
            Alphabet::Discrete(symbols) | Alphabet::Permutation(symbols) => {
                Some(symbols)
            }
            Alphabet::Continuous => None,
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, Alphabet::Continuous)
    }

    pub fn is_permutation(&self) -> bool {
        matches!(self, Alphabet::Permutation(_))
    }

    /// True when every symbol is a printable character, in which case
    /// genomes render and decode as strings.
    pub fn is_character(&self) -> bool {
        match self.symbols() {
            Some(symbols) => {
                !symbols.is_empty() && symbols.iter().all(Allele::is_printable_char)
            }
            None => false,
        }
    }

    /// Index of `allele` within the symbol set.
    pub fn position_of(&self, allele: &Allele) -> Option<usize> {
        self.symbols()?.iter().position(|s| s == allele)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_alphabets() {
        assert_eq!(Alphabet::binary().len(), Some(2));
        assert_eq!(Alphabet::triallelic().len(), Some(3));
        assert_eq!(Alphabet::alpha().len(), Some(53));
        assert_eq!(Alphabet::alnum().len(), Some(63));
        assert_eq!(Alphabet::Continuous.len(), None);
    }

    #[test]
    fn character_detection() {
        assert!(Alphabet::alpha().is_character());
        assert!(Alphabet::characters().is_character());
        assert!(!Alphabet::binary().is_character());
        assert!(!Alphabet::Continuous.is_character());
    }

    #[test]
    fn position_lookup() {
        let alphabet = Alphabet::triallelic();
        assert_eq!(alphabet.position_of(&Allele::Int(-1)), Some(0));
        assert_eq!(alphabet.position_of(&Allele::Int(1)), Some(2));
        assert_eq!(alphabet.position_of(&Allele::Int(7)), None);
    }

    #[test]
    fn index_permutation_symbols() {
        let alphabet = Alphabet::index_permutation(5);
        assert!(alphabet.is_permutation());
        assert_eq!(
            alphabet.symbols().unwrap(),
            &[
                Allele::Int(0),
                Allele::Int(1),
                Allele::Int(2),
                Allele::Int(3),
                Allele::Int(4)
            ]
        );
    }
}
