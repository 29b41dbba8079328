//! Stable string hashing for bucket assignment
//!
//! FNV-1a-style 32-bit hash with a shift-add mix, reduced mod 100. The same
//! input always lands in the same bucket, so assignment is reproducible
//! without stored randomness.

/// Hash `input` into a bucket in `[0, 100)`
pub fn hash_to_bucket(input: &str) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    for c in input.chars() {
        hash ^= c as u32;
        let mix = (hash << 1)
            .wrapping_add(hash << 4)
            .wrapping_add(hash << 7)
            .wrapping_add(hash << 8)
            .wrapping_add(hash << 24);
        hash = hash.wrapping_add(mix);
    }
    hash % 100
}

/// Hash input for a (seed, placement, experiment) triple
pub(crate) fn bucket_input(seed_key: &str, placement: &str, experiment_id: &str) -> String {
    format!("{seed_key}::{placement}::{experiment_id}")
}
