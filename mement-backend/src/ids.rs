//! Short, URL-safe random identifiers (lowercase alphanumeric).

use rand::Rng;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Suffix length appended to derived agent subdomains.
pub const AGENT_SUFFIX_LEN: usize = 4;

/// Length of externally shareable chat ids.
pub const CHAT_ID_LEN: usize = 10;

pub fn short_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Lowercase slug of a display name: whitespace runs become single dashes.
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_shape() {
        let id = short_id(CHAT_ID_LEN);
        assert_eq!(id.len(), CHAT_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_short_ids_are_distinct() {
        let a = short_id(CHAT_ID_LEN);
        let b = short_id(CHAT_ID_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Mement  Oracle "), "mement-oracle");
        assert_eq!(slugify("AI Guide"), "ai-guide");
    }
}
