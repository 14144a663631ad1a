//! Hashing and token generation helpers.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Prefix of every group join token.
pub const JOIN_TOKEN_PREFIX: &str = "group_";

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a join token: `group_` followed by 8 lowercase hex characters.
pub fn generate_join_token() -> String {
    let bytes: [u8; 4] = rand::thread_rng().gen();
    format!("{}{}", JOIN_TOKEN_PREFIX, hex::encode(bytes))
}

/// Returns true when `token` has the shape produced by [`generate_join_token`].
pub fn is_join_token(token: &str) -> bool {
    token
        .strip_prefix(JOIN_TOKEN_PREFIX)
        .map(|rest| {
            rest.len() == 8
                && rest
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        })
        .unwrap_or(false)
}
