//! Customer id generation.

use rand::Rng;

/// URL-safe alphabet, so ids can be embedded in card links unescaped.
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Length of generated customer ids.
pub const CUSTOMER_ID_LEN: usize = 10;

/// Generate an opaque short customer id.
pub fn generate_customer_id() -> String {
    let mut rng = rand::rng();
    (0..CUSTOMER_ID_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
