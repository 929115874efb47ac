//! Modulus 11 check digit used by Norwegian bank account numbers.
//!
//! An account number has 11 digits: 10 payload digits followed by a check
//! digit. The payload is multiplied position by position with the weights
//! `5 4 3 2 7 6 5 4 3 2`, summed, and reduced modulo 11. The check digit is
//! `11 - remainder`, except that remainder 0 gives check digit 0 and
//! remainder 1 gives no valid check digit at all.
//!
//! The fixed weight row is the generic modulus 11 scheme (weights `2..=7`
//! repeating from the right) applied to exactly 10 digits. Both forms are
//! provided; [`ChecksumAlgorithm`] selects between them.

/// Weights applied to the 10 payload digits, most significant first.
pub const WEIGHTS: [u32; 10] = [5, 4, 3, 2, 7, 6, 5, 4, 3, 2];

/// Number of payload digits in an account number.
pub const PAYLOAD_DIGITS: usize = 10;

const MODULUS: u32 = 11;

/// Computes the weighted sum of the 10 payload digits.
#[inline]
pub fn weighted_sum(payload: &[u8; PAYLOAD_DIGITS]) -> u32 {
    let mut sum = 0u32;
    let mut i = 0;
    while i < PAYLOAD_DIGITS {
        sum += payload[i] as u32 * WEIGHTS[i];
        i += 1;
    }
    sum
}

/// Maps a modulus 11 remainder to its check digit.
///
/// Returns `None` for remainder 1, which would require check digit 10.
#[inline]
pub const fn check_digit_for_remainder(remainder: u32) -> Option<u8> {
    match remainder {
        0 => Some(0),
        1 => None,
        r => Some((MODULUS - r) as u8),
    }
}

/// Computes the check digit for 10 payload digits using the fixed weights.
///
/// # Example
///
/// ```
/// use norwegian_banks::mod11::check_digit;
///
/// assert_eq!(check_digit(&[1, 5, 9, 4, 2, 2, 8, 7, 2, 4]), Some(8));
/// // Remainder 1 has no check digit
/// assert_eq!(check_digit(&[1, 5, 9, 4, 0, 0, 0, 0, 0, 9]), None);
/// ```
#[inline]
pub fn check_digit(payload: &[u8; PAYLOAD_DIGITS]) -> Option<u8> {
    check_digit_for_remainder(weighted_sum(payload) % MODULUS)
}

/// Computes a modulus 11 check digit for a payload of any length.
///
/// Weights run `2, 3, 4, 5, 6, 7` from the rightmost payload digit and
/// repeat. Returns `None` for an empty payload or remainder 1.
///
/// # Example
///
/// ```
/// use norwegian_banks::mod11::generic_check_digit;
///
/// assert_eq!(generic_check_digit(&[6, 1, 0, 5, 0, 6, 5, 9, 2, 7]), Some(4));
/// ```
pub fn generic_check_digit(payload: &[u8]) -> Option<u8> {
    if payload.is_empty() {
        return None;
    }

    let sum: u32 = payload
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| d as u32 * (2 + (i as u32 % 6)))
        .sum();

    check_digit_for_remainder(sum % MODULUS)
}

/// Validates a full 11-digit account number with the fixed weights.
///
/// # Example
///
/// ```
/// use norwegian_banks::mod11::validate;
///
/// assert!(validate(&[1, 5, 9, 4, 2, 2, 8, 7, 2, 4, 8]));
/// assert!(!validate(&[1, 5, 9, 4, 2, 2, 8, 7, 2, 4, 9]));
/// ```
#[inline]
pub fn validate(digits: &[u8; PAYLOAD_DIGITS + 1]) -> bool {
    let mut payload = [0u8; PAYLOAD_DIGITS];
    payload.copy_from_slice(&digits[..PAYLOAD_DIGITS]);
    check_digit(&payload) == Some(digits[PAYLOAD_DIGITS])
}

/// Check digit algorithm used by an account validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChecksumAlgorithm {
    /// Fixed weight row over exactly 10 payload digits.
    #[default]
    Weighted,
    /// Generic modulus 11 with cycling `2..=7` weights.
    Modulus11,
}

impl ChecksumAlgorithm {
    /// Computes the expected check digit for the given payload.
    ///
    /// `Weighted` only accepts 10 payload digits; other lengths yield `None`.
    pub fn expected_check_digit(&self, payload: &[u8]) -> Option<u8> {
        match self {
            Self::Weighted => {
                let fixed: &[u8; PAYLOAD_DIGITS] = payload.try_into().ok()?;
                check_digit(fixed)
            }
            Self::Modulus11 => generic_check_digit(payload),
        }
    }
}
