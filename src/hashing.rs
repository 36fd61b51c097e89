use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// A stable hash of a string, used to derive per-stream seeds from the stream name.
pub(crate) fn hash_str(data: &str) -> u64 {
    let mut hasher = FxHasher::default();
    data.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_distinguishes_names() {
        assert_eq!(hash_str("TransmissionRng"), hash_str("TransmissionRng"));
        assert_ne!(hash_str("TransmissionRng"), hash_str("ProgressionRng"));
    }
}
