//! Utility functions for the lobby service

use chrono::{DateTime, Utc};
use rand::RngCore;

/// Number of random bytes behind a lobby code (two hex characters each)
pub const LOBBY_CODE_BYTES: usize = 3;

/// Generate a short lobby code of six lowercase hex characters
///
/// Codes carry 24 bits of randomness, so collisions are possible; the store
/// checks for them and regenerates.
pub fn generate_lobby_code() -> String {
    let mut bytes = [0u8; LOBBY_CODE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lobby_code_shape() {
        let code = generate_lobby_code();
        assert_eq!(code.len(), LOBBY_CODE_BYTES * 2);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    proptest! {
        #[test]
        fn prop_lobby_codes_are_lowercase_hex(_seed in 0u32..256) {
            let code = generate_lobby_code();
            prop_assert_eq!(code.len(), 6);
            prop_assert!(u32::from_str_radix(&code, 16).is_ok());
            prop_assert_eq!(code.to_lowercase(), code);
        }
    }
}
