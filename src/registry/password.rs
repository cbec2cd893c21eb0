//! Salted, iterated SHA-256 password hashes stored as
//! `rounds$salt_hex$digest_hex`.

use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const SALT_LEN: usize = 16;
const HASH_ROUNDS: u32 = 20_000;

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = stretch(&salt, password, HASH_ROUNDS);
    format!("{HASH_ROUNDS}${}${}", hex::encode(salt), hex::encode(digest))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(rounds), Some(salt_hex), Some(digest_hex)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    if rounds == 0 || rounds > HASH_ROUNDS {
        return false;
    }
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        return false;
    };
    let actual = stretch(&salt, password, rounds);
    constant_time_eq(&actual, &expected)
}

/// Opaque bearer token for a fresh session.
pub fn new_session_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn stretch(salt: &[u8], password: &str, rounds: u32) -> [u8; 32] {
    let mut digest: [u8; 32] = Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize()
        .into();
    for _ in 1..rounds {
        digest = Sha256::new()
            .chain_update(salt)
            .chain_update(digest)
            .finalize()
            .into();
    }
    digest
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let stored = hash_password("hunter22");
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("x", "no-separator"));
        assert!(!verify_password("x", "zz$zz"));
        assert!(!verify_password("x", "abc$00$00"));
    }

    #[test]
    fn hashes_record_their_round_count() {
        let stored = hash_password("hunter22");
        let (rounds, rest) = stored.split_once('$').unwrap();
        assert_eq!(rounds, HASH_ROUNDS.to_string());

        // a single unstretched digest of the same salt is not accepted
        let (salt_hex, _) = rest.split_once('$').unwrap();
        let salt = hex::decode(salt_hex).unwrap();
        let single = hex::encode(stretch(&salt, "hunter22", 1));
        assert!(!verify_password("hunter22", &format!("{HASH_ROUNDS}${salt_hex}${single}")));
        assert!(!verify_password("hunter22", &format!("0${salt_hex}${single}")));
    }

    #[test]
    fn session_tokens_are_unique() {
        assert_ne!(new_session_token(), new_session_token());
    }
}
