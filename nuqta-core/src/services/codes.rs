//! Random code generation for redemption codes and QR hashes.
//!
//! Uniqueness is enforced by database constraints, not here; callers retry
//! with a fresh code on a unique violation.

use rand::Rng;

/// Unambiguous uppercase alphabet: no 0/O, 1/I/L.
const CHARSET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

pub(crate) fn random_code(prefix: &str, len: usize) -> String {
    let mut rng = rand::rng();
    let mut code = String::with_capacity(prefix.len() + len);
    code.push_str(prefix);
    for _ in 0..len {
        let idx = rng.random_range(0..CHARSET.len());
        code.push(CHARSET[idx] as char);
    }
    code
}
