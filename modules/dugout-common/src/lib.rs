pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::DugoutError;

use sha2::{Digest, Sha256};

/// Hash a session key (IP + user agent, or a client-stored token) into the
/// identity hash used to re-identify anonymous guests. Not an account system —
/// the same browser without a stored token simply becomes a new guest.
pub fn hash_session_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_hash_is_stable() {
        assert_eq!(hash_session_key("10.0.0.1|ua"), hash_session_key("10.0.0.1|ua"));
        assert_ne!(hash_session_key("10.0.0.1|ua"), hash_session_key("10.0.0.2|ua"));
    }

    #[test]
    fn session_hash_is_hex_sha256() {
        let h = hash_session_key("key");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
