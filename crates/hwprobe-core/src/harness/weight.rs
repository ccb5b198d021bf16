//! Hamming weight of a text sample.

/// Total number of set bits across the code points of every character.
///
/// Counts all 32 bits of each Unicode scalar value, so characters outside
/// ASCII contribute their full weight.
#[must_use]
pub fn weight(text: &str) -> u64 {
    text.chars().map(|c| u64::from(u32::from(c).count_ones())).sum()
}

/// Upper bound for [`weight`] over ASCII samples of `length` characters.
#[must_use]
pub fn ascii_weight_bound(length: usize) -> u64 {
    length as u64 * 7
}
