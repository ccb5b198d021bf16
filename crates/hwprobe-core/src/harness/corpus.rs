//! Random text samples for the subject.

use crate::error::Error;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// The 62 symbols a sample is drawn from: ASCII letters then digits.
pub const ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// One generated input for the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample(String);

impl Sample {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters in the sample.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Sample {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl From<String> for Sample {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl AsRef<str> for Sample {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Produces samples from an injected random source.
pub struct CorpusGenerator<R> {
    rng: R,
}

impl CorpusGenerator<StdRng> {
    /// Generator seeded from `seed`, or from OS entropy when `None`.
    #[must_use]
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(rng)
    }
}

impl<R: Rng> CorpusGenerator<R> {
    #[must_use]
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draw `length` characters uniformly and independently from [`ALPHABET`].
    pub fn generate(&mut self, length: usize) -> Result<Sample, Error> {
        if length == 0 {
            return Err(Error::invalid_argument("sample length must be positive"));
        }

        let text: String = (0..length)
            .map(|_| char::from(ALPHABET[self.rng.gen_range(0..ALPHABET.len())]))
            .collect();
        Ok(Sample(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_alphabet_is_62_distinct_alphanumerics() {
        let distinct: HashSet<u8> = ALPHABET.iter().copied().collect();
        assert_eq!(distinct.len(), 62);
        assert!(ALPHABET.iter().all(u8::is_ascii_alphanumeric));
    }

    #[test]
    fn test_generate_exact_length_from_alphabet() {
        let mut generator = CorpusGenerator::from_seed(Some(7));
        for length in [1, 2, 17, 10_000] {
            let sample = generator.generate(length).unwrap();
            assert_eq!(sample.len(), length);
            assert!(sample
                .as_str()
                .bytes()
                .all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_generate_zero_length_is_invalid() {
        let mut generator = CorpusGenerator::from_seed(Some(7));
        assert!(matches!(
            generator.generate(0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_same_seed_same_corpus() {
        let mut a = CorpusGenerator::from_seed(Some(0xC0FFEE));
        let mut b = CorpusGenerator::from_seed(Some(0xC0FFEE));
        for _ in 0..5 {
            assert_eq!(a.generate(64).unwrap(), b.generate(64).unwrap());
        }
    }

    #[test]
    fn test_large_sample_touches_most_of_alphabet() {
        let mut generator = CorpusGenerator::from_seed(Some(1));
        let sample = generator.generate(10_000).unwrap();
        let seen: HashSet<u8> = sample.as_str().bytes().collect();
        // 10k uniform draws over 62 symbols miss a symbol with negligible probability.
        assert_eq!(seen.len(), 62);
    }
}
