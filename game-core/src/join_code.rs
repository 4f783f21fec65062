//! Join codes for duels.
//!
//! Codes are short strings over Crockford's Base32 alphabet, drawn from the
//! thread-local CSPRNG, and compared case-insensitively.

use rand::Rng;

const CROCKFORD: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ"; // no I, L, O, U

pub const JOIN_CODE_LENGTH: usize = 6;

pub fn generate_join_code() -> String {
    let mut rng = rand::rng();
    (0..JOIN_CODE_LENGTH)
        .map(|_| CROCKFORD[rng.random_range(0..CROCKFORD.len())] as char)
        .collect()
}

/// Canonical stored form of a code typed by a player.
pub fn normalize_join_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
