//! # Catalog Limits
//!
//! Fixed limits applied by validation. Compiled in, immutable at runtime.

/// Maximum length for names (configurations, reading groups, users).
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum length for free-text descriptions.
pub const MAX_DESCRIPTION_LENGTH: usize = 4096;

/// Maximum length for range comments.
pub const MAX_COMMENTS_LENGTH: usize = 1024;

/// Maximum length for reading labels.
pub const MAX_LABEL_LENGTH: usize = 128;

/// Weight given to a metric configuration built from a blank form.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Metadata key prefix for per-table id sequences.
pub const SEQUENCE_PREFIX: &str = "next_id:";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weight_is_positive() {
        assert!(DEFAULT_WEIGHT > 0.0);
    }

    #[test]
    fn sequence_prefix_ends_with_separator() {
        assert!(SEQUENCE_PREFIX.ends_with(':'));
    }
}
