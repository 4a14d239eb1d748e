//! Deterministic content hashing for chunk identity.

use sha2::{Digest, Sha256};

/// Lowercase + collapse internal whitespace; the normalization used for both
/// `chunk_id` derivation and cache key normalization.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.extend(ch.to_lowercase());
            last_was_space = false;
        }
    }
    out
}

/// 16-hex-char content hash over `(parent_doc_id, section_path, start_char,
/// end_char, normalized_text)`, deterministic across runs.
pub fn chunk_id(
    parent_doc_id: &str,
    section_path: &str,
    start_char: usize,
    end_char: usize,
    text: &str,
) -> String {
    let normalized = normalize_text(text);
    let mut hasher = Sha256::new();
    hasher.update(parent_doc_id.as_bytes());
    hasher.update(b"\0");
    hasher.update(section_path.as_bytes());
    hasher.update(b"\0");
    hasher.update(start_char.to_le_bytes());
    hasher.update(end_char.to_le_bytes());
    hasher.update(normalized.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8]) // 8 bytes -> 16 hex chars
}
