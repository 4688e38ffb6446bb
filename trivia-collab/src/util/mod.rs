mod id;

pub use id::*;

use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// The symbols a session code is made of, ambiguous ones like 0/O and 1/I are left out
pub const SESSION_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const SESSION_CODE_LENGTH: usize = 6;

pub fn random_string(length: usize) -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}

/// Generates a random session code
pub fn session_code() -> String {
    let mut rng = thread_rng();

    (0..SESSION_CODE_LENGTH)
        .map(|_| SESSION_CODE_ALPHABET[rng.gen_range(0..SESSION_CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_code_shape() {
        for _ in 0..100 {
            let code = session_code();

            assert_eq!(code.len(), SESSION_CODE_LENGTH, "code has fixed length");
            assert!(
                code.bytes().all(|b| SESSION_CODE_ALPHABET.contains(&b)),
                "code only uses the alphabet, got {code}"
            );
        }
    }

    #[test]
    fn test_random_string_length() {
        assert_eq!(random_string(32).len(), 32);
    }
}
