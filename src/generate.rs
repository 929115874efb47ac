//! Account number generation for testing.
//!
//! Generated numbers carry a valid check digit for the requested prefix. They
//! are not tied to real accounts and should only be used as test data.
//!
//! # Example
//!
//! ```
//! use norwegian_banks::generate::{generate_account_deterministic, AccountGenerator};
//! use norwegian_banks::passes_checksum;
//!
//! let account = generate_account_deterministic("1594").unwrap();
//! assert!(account.starts_with("1594"));
//! assert!(passes_checksum(&account));
//!
//! let formatted = AccountGenerator::new("6105").delimiter(".").generate_deterministic();
//! assert_eq!(formatted.as_deref().map(str::len), Some(13));
//! ```

use crate::account::{ACCOUNT_DIGITS, PREFIX_DIGITS};
use crate::bank::parser::is_prefix;
use crate::format::format_with_delimiter;
use crate::mod11::{self, PAYLOAD_DIGITS};

#[cfg(feature = "generate")]
use rand::Rng;

fn prefix_digits(prefix: &str) -> Option<[u8; PREFIX_DIGITS]> {
    if !is_prefix(prefix) {
        return None;
    }
    let mut digits = [0u8; PREFIX_DIGITS];
    for (d, b) in digits.iter_mut().zip(prefix.bytes()) {
        *d = b - b'0';
    }
    Some(digits)
}

/// Appends the check digit, or `None` for payloads with remainder 1.
fn complete(payload: [u8; PAYLOAD_DIGITS]) -> Option<String> {
    let check = mod11::check_digit(&payload)?;
    let mut number = String::with_capacity(ACCOUNT_DIGITS);
    number.extend(payload.iter().map(|&d| char::from(b'0' + d)));
    number.push(char::from(b'0' + check));
    Some(number)
}

/// Generates the lowest valid account number for a prefix.
///
/// The account group and serial start at zero; the serial is bumped until a
/// check digit exists. Returns `None` unless `prefix` is 4 digits.
///
/// ```
/// use norwegian_banks::generate::generate_account_deterministic;
///
/// assert_eq!(generate_account_deterministic("1594").as_deref(), Some("15940000006"));
/// assert_eq!(generate_account_deterministic("15a4"), None);
/// ```
pub fn generate_account_deterministic(prefix: &str) -> Option<String> {
    let head = prefix_digits(prefix)?;
    let mut payload = [0u8; PAYLOAD_DIGITS];
    payload[..PREFIX_DIGITS].copy_from_slice(&head);

    // Remainder 1 for serial n means serial n + 1 has a different remainder.
    for serial in 0..10 {
        payload[PAYLOAD_DIGITS - 1] = serial;
        if let Some(number) = complete(payload) {
            return Some(number);
        }
    }
    None
}

/// Generates a random valid account number for a prefix.
///
/// Requires the `generate` feature.
///
/// ```
/// use norwegian_banks::generate::generate_account;
///
/// let account = generate_account("3000").unwrap();
/// assert!(norwegian_banks::passes_checksum(&account));
/// ```
#[cfg(feature = "generate")]
pub fn generate_account(prefix: &str) -> Option<String> {
    generate_account_with_rng(prefix, &mut rand::thread_rng())
}

/// Generates a valid account number using a provided RNG.
///
/// Requires the `generate` feature.
#[cfg(feature = "generate")]
pub fn generate_account_with_rng<R: Rng>(prefix: &str, rng: &mut R) -> Option<String> {
    let head = prefix_digits(prefix)?;
    let mut payload = [0u8; PAYLOAD_DIGITS];
    payload[..PREFIX_DIGITS].copy_from_slice(&head);

    loop {
        for d in &mut payload[PREFIX_DIGITS..] {
            *d = rng.gen_range(0..10);
        }
        if let Some(number) = complete(payload) {
            return Some(number);
        }
    }
}

/// Generates `count` random valid account numbers for a prefix.
///
/// Requires the `generate` feature.
#[cfg(feature = "generate")]
pub fn generate_accounts(prefix: &str, count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..count)
        .filter_map(|_| generate_account_with_rng(prefix, &mut rng))
        .collect()
}

/// Builder for generated account numbers.
#[derive(Debug, Clone)]
pub struct AccountGenerator {
    prefix: String,
    delimiter: Option<String>,
}

impl AccountGenerator {
    /// Creates a generator for the given bank prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            delimiter: None,
        }
    }

    /// Formats generated numbers with the given delimiter.
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    fn finish(&self, number: String) -> String {
        match &self.delimiter {
            Some(d) => format_with_delimiter(&number, d),
            None => number,
        }
    }

    /// Generates the lowest valid number for the prefix.
    pub fn generate_deterministic(&self) -> Option<String> {
        generate_account_deterministic(&self.prefix).map(|n| self.finish(n))
    }

    /// Generates a random valid number.
    #[cfg(feature = "generate")]
    pub fn generate(&self) -> Option<String> {
        generate_account(&self.prefix).map(|n| self.finish(n))
    }

    /// Generates several random valid numbers.
    #[cfg(feature = "generate")]
    pub fn generate_many(&self, count: usize) -> Vec<String> {
        generate_accounts(&self.prefix, count)
            .into_iter()
            .map(|n| self.finish(n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::passes_checksum;

    #[test]
    fn test_deterministic_is_valid_and_stable() {
        for prefix in ["1594", "6105", "3000", "0000", "9999"] {
            let account = generate_account_deterministic(prefix).unwrap();
            assert!(account.starts_with(prefix));
            assert_eq!(account.len(), 11);
            assert!(passes_checksum(&account), "{}", account);
            assert_eq!(Some(account), generate_account_deterministic(prefix));
        }
    }

    #[test]
    fn test_deterministic_skips_remainder_one() {
        // 0006000000 has remainder 1, so the serial is bumped
        let account = generate_account_deterministic("0006").unwrap();
        assert_eq!(account, "00060000018");
    }

    #[test]
    fn test_rejects_bad_prefix() {
        assert_eq!(generate_account_deterministic("159"), None);
        assert_eq!(generate_account_deterministic("15945"), None);
        assert!(AccountGenerator::new("abcd").generate_deterministic().is_none());
    }

    #[test]
    fn test_generator_with_delimiter() {
        let account = AccountGenerator::new("1594")
            .delimiter(" ")
            .generate_deterministic()
            .unwrap();
        assert_eq!(account, "1594 00 00006");
    }

    #[cfg(feature = "generate")]
    mod random_tests {
        use super::*;
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        #[test]
        fn test_generate_account() {
            let account = generate_account("6105").unwrap();
            assert!(account.starts_with("6105"));
            assert!(passes_checksum(&account));
        }

        #[test]
        fn test_seeded_rng_is_reproducible() {
            let a = generate_account_with_rng("3000", &mut StdRng::seed_from_u64(7));
            let b = generate_account_with_rng("3000", &mut StdRng::seed_from_u64(7));
            assert_eq!(a, b);
        }

        #[test]
        fn test_generate_many() {
            let accounts = AccountGenerator::new("1594").delimiter(".").generate_many(50);
            assert_eq!(accounts.len(), 50);
            for account in &accounts {
                assert!(account.starts_with("1594."));
                assert!(passes_checksum(account));
            }
            let unique: std::collections::HashSet<_> = accounts.iter().collect();
            assert!(unique.len() >= 45);
        }
    }
}
