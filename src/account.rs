//! Parsed Norwegian account numbers.
//!
//! An [`AccountNumber`] is only constructed from 11 digits whose check digit
//! has already been verified, so holding one means the checksum passed.

use std::fmt;

/// Number of digits in a Norwegian bank account number.
pub const ACCOUNT_DIGITS: usize = 11;

/// Number of leading digits identifying the bank.
pub const PREFIX_DIGITS: usize = 4;

/// An account number whose check digit has been verified.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountNumber {
    digits: [u8; ACCOUNT_DIGITS],
}

impl AccountNumber {
    pub(crate) fn new(digits: [u8; ACCOUNT_DIGITS]) -> Self {
        Self { digits }
    }

    /// Returns the digits as values 0-9.
    #[inline]
    pub fn digits(&self) -> &[u8; ACCOUNT_DIGITS] {
        &self.digits
    }

    /// Returns the 4-digit bank prefix.
    pub fn prefix(&self) -> String {
        Self::render(&self.digits[..PREFIX_DIGITS])
    }

    /// Returns the 2-digit account group following the prefix.
    pub fn account_group(&self) -> String {
        Self::render(&self.digits[PREFIX_DIGITS..PREFIX_DIGITS + 2])
    }

    /// Returns the check digit (last digit).
    #[inline]
    pub fn check_digit(&self) -> u8 {
        self.digits[ACCOUNT_DIGITS - 1]
    }

    /// Returns the unformatted 11-digit number.
    pub fn number(&self) -> String {
        Self::render(&self.digits)
    }

    /// Returns the number grouped 4-2-5 with the given delimiter.
    ///
    /// # Example
    ///
    /// ```
    /// use norwegian_banks::validate_checksum;
    ///
    /// let account = validate_checksum("15942287248").unwrap();
    /// assert_eq!(account.formatted(" "), "1594 22 87248");
    /// ```
    pub fn formatted(&self, delimiter: &str) -> String {
        crate::format::format_with_delimiter(&self.number(), delimiter)
    }

    fn render(digits: &[u8]) -> String {
        digits.iter().map(|&d| char::from(b'0' + d)).collect()
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted("."))
    }
}

impl fmt::Debug for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccountNumber").field(&self.number()).finish()
    }
}
