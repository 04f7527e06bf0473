//! Token counting for prompt budget enforcement.
//!
//! The primary strategy is an exact cl100k BPE count. When the
//! tokenizer cannot be constructed, a byte-length approximation takes
//! over for the rest of the run; it is an approximation, not a precise
//! count. The strategy is chosen once, at construction time.

use tiktoken_rs::{CoreBPE, cl100k_base};
use tracing::warn;

/// Approximation ratio used by the fallback strategy: one token per
/// four bytes of text, rounded down.
pub const APPROX_BYTES_PER_TOKEN: usize = 4;

pub enum TokenCounter {
    Exact(CoreBPE),
    Approximate,
}

impl TokenCounter {
    pub fn new() -> Self {
        match cl100k_base() {
            Ok(bpe) => Self::Exact(bpe),
            Err(e) => {
                warn!("could not initialize cl100k tokenizer, using byte-length approximation: {e}");
                Self::Approximate
            }
        }
    }

    /// Forces the byte-length approximation. Useful in tests where
    /// counts must be arithmetic.
    pub fn approximate() -> Self {
        Self::Approximate
    }

    pub fn count(&self, text: &str) -> usize {
        match self {
            Self::Exact(bpe) => bpe.encode_with_special_tokens(text).len(),
            Self::Approximate => text.len() / APPROX_BYTES_PER_TOKEN,
        }
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_counts_are_positive() {
        let counter = TokenCounter::new();
        let text = "resource \"aws_vpc\" \"this\" { cidr_block = var.cidr }";
        let tokens = counter.count(text);
        assert!(tokens > 0);
        assert!(tokens < text.len());
    }

    #[test]
    fn test_empty_text_is_zero() {
        assert_eq!(TokenCounter::new().count(""), 0);
        assert_eq!(TokenCounter::approximate().count(""), 0);
    }

    #[test]
    fn test_approximate_is_bytes_over_four() {
        let counter = TokenCounter::approximate();
        assert_eq!(counter.count("abcdefgh"), 2);
        // Rounded down, not up.
        assert_eq!(counter.count("abcdefghij"), 2);
        assert_eq!(counter.count("abc"), 0);
    }
}
