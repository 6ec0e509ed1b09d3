//! Champion name keys.
//!
//! Every lookup by champion name goes through [`canonical_key`], so "Kai'Sa",
//! "kaisa" and "KAI SA" all resolve to the same record.

/// Lowercase ASCII alphanumerics only; apostrophes, spaces, dots and other
/// punctuation are dropped.
pub fn canonical_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
