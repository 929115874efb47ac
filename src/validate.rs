//! Account number validation.
//!
//! Validation happens in two layers. [`validate_checksum`] only needs the
//! digits: it strips separators, checks the length and verifies the modulus 11
//! check digit. [`AccountValidator`] adds the optional bank prefix check
//! against any [`BankLookup`].
//!
//! The input is never rejected for the separators it uses. `1594.22.87248`,
//! `1594 22 87248` and `15942287248` all validate the same way.

use crate::account::{AccountNumber, ACCOUNT_DIGITS};
use crate::bank::BankLookup;
use crate::error::ValidationError;
use crate::mod11::{ChecksumAlgorithm, PAYLOAD_DIGITS};

/// Validates the checksum of an account number.
///
/// Every non-digit character is discarded before checking, so any
/// separator style is accepted.
///
/// # Example
///
/// ```
/// use norwegian_banks::{validate_checksum, ValidationError};
///
/// let account = validate_checksum("1594.22.87248").unwrap();
/// assert_eq!(account.prefix(), "1594");
///
/// assert_eq!(
///     validate_checksum("1594.22.87249").unwrap_err(),
///     ValidationError::InvalidChecksum { expected: 8, found: 9 }
/// );
/// ```
pub fn validate_checksum(input: &str) -> Result<AccountNumber, ValidationError> {
    check_digits(input, ChecksumAlgorithm::Weighted)
}

/// Returns true if the input has 11 digits and a valid check digit.
///
/// Does not consult any bank table.
///
/// # Example
///
/// ```
/// use norwegian_banks::passes_checksum;
///
/// assert!(passes_checksum("6105.06.59274"));
/// assert!(!passes_checksum("6105.06.59275"));
/// ```
#[inline]
pub fn passes_checksum(input: &str) -> bool {
    validate_checksum(input).is_ok()
}

fn check_digits(input: &str, algorithm: ChecksumAlgorithm) -> Result<AccountNumber, ValidationError> {
    if input.is_empty() {
        return Err(ValidationError::Empty);
    }

    let mut digits = [0u8; ACCOUNT_DIGITS];
    let mut count = 0usize;

    for b in input.bytes().filter(u8::is_ascii_digit) {
        if count < ACCOUNT_DIGITS {
            digits[count] = b - b'0';
        }
        count += 1;
    }

    if count == 0 {
        return Err(ValidationError::NoDigits);
    }

    if count != ACCOUNT_DIGITS {
        return Err(ValidationError::WrongLength {
            length: count,
            expected: ACCOUNT_DIGITS,
        });
    }

    let expected = algorithm
        .expected_check_digit(&digits[..PAYLOAD_DIGITS])
        .ok_or(ValidationError::NoValidCheckDigit)?;
    let found = digits[PAYLOAD_DIGITS];

    if expected != found {
        return Err(ValidationError::InvalidChecksum { expected, found });
    }

    Ok(AccountNumber::new(digits))
}

/// Configurable account validator.
///
/// # Example
///
/// ```
/// use norwegian_banks::bank::BankTable;
/// use norwegian_banks::AccountValidator;
///
/// let mut banks = BankTable::new();
/// banks.insert("1594", "DNBANOKK", "DNB Bank ASA");
///
/// let validator = AccountValidator::new();
/// assert!(validator.validate("1594.22.87248", &banks));
/// // Valid checksum, unknown prefix
/// assert!(!validator.validate("1234.56.78903", &banks));
/// assert!(validator.check_bank_prefix(false).validate("1234.56.78903", &banks));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountValidator {
    algorithm: ChecksumAlgorithm,
    check_bank_prefix: bool,
}

impl Default for AccountValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountValidator {
    /// Creates a validator using the weighted checksum and the prefix check.
    pub fn new() -> Self {
        Self {
            algorithm: ChecksumAlgorithm::Weighted,
            check_bank_prefix: true,
        }
    }

    /// Builder method to set the checksum algorithm.
    pub fn algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Builder method to enable or disable the bank prefix check.
    pub fn check_bank_prefix(mut self, check: bool) -> Self {
        self.check_bank_prefix = check;
        self
    }

    /// Returns the configured checksum algorithm.
    pub fn checksum_algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// Returns whether the prefix check is enabled.
    pub fn checks_bank_prefix(&self) -> bool {
        self.check_bank_prefix
    }

    /// Validates an account number, reporting why it failed.
    ///
    /// The checksum is verified first; the prefix is only looked up for
    /// numbers that pass it.
    pub fn check<L>(&self, account: &str, banks: &L) -> Result<AccountNumber, ValidationError>
    where
        L: BankLookup + ?Sized,
    {
        let parsed = check_digits(account, self.algorithm)?;

        if self.check_bank_prefix {
            let prefix = parsed.prefix();
            if banks.bank_code_for_prefix(&prefix).is_none() {
                return Err(ValidationError::UnknownBankPrefix { prefix });
            }
        }

        Ok(parsed)
    }

    /// Returns true if the account number is valid.
    #[inline]
    pub fn validate<L>(&self, account: &str, banks: &L) -> bool
    where
        L: BankLookup + ?Sized,
    {
        self.check(account, banks).is_ok()
    }
}
