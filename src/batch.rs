//! Batch validation of account numbers.
//!
//! A [`BatchValidator`] pairs an [`AccountValidator`] with a bank lookup so a
//! list of numbers can be checked against the same table. Parallel variants
//! using rayon are available with the `parallel` feature.

use crate::account::AccountNumber;
use crate::bank::BankLookup;
use crate::error::ValidationError;
use crate::validate::AccountValidator;

/// Validates many account numbers against one bank table.
///
/// # Example
///
/// ```
/// use norwegian_banks::bank::BankTable;
/// use norwegian_banks::BatchValidator;
///
/// let mut banks = BankTable::new();
/// banks.insert("1594", "DNBANOKK", "DNB Bank ASA");
///
/// let batch = BatchValidator::new(&banks);
/// let accounts = ["1594.22.87248", "1594.22.87249", "12345678903"];
/// let results = batch.validate_all(&accounts);
///
/// assert!(results[0].is_ok());
/// assert!(results[1].is_err());
/// assert!(results[2].is_err());
/// ```
#[derive(Debug)]
pub struct BatchValidator<'a, L: ?Sized> {
    banks: &'a L,
    validator: AccountValidator,
}

impl<'a, L: BankLookup + ?Sized> BatchValidator<'a, L> {
    /// Creates a batch validator with the default [`AccountValidator`].
    pub fn new(banks: &'a L) -> Self {
        Self::with_validator(banks, AccountValidator::new())
    }

    /// Creates a batch validator with a custom validator.
    pub fn with_validator(banks: &'a L, validator: AccountValidator) -> Self {
        Self { banks, validator }
    }

    /// Validates every account, returning results in input order.
    pub fn validate_all<S: AsRef<str>>(
        &self,
        accounts: &[S],
    ) -> Vec<Result<AccountNumber, ValidationError>> {
        accounts
            .iter()
            .map(|a| self.validator.check(a.as_ref(), self.banks))
            .collect()
    }

    /// Returns only the accounts that pass validation.
    pub fn valid_only<S: AsRef<str>>(&self, accounts: &[S]) -> Vec<AccountNumber> {
        accounts
            .iter()
            .filter_map(|a| self.validator.check(a.as_ref(), self.banks).ok())
            .collect()
    }

    /// Splits accounts into valid numbers and `(index, error)` pairs.
    pub fn partitioned<S: AsRef<str>>(
        &self,
        accounts: &[S],
    ) -> (Vec<AccountNumber>, Vec<(usize, ValidationError)>) {
        let mut valid = Vec::new();
        let mut invalid = Vec::new();

        for (i, account) in accounts.iter().enumerate() {
            match self.validator.check(account.as_ref(), self.banks) {
                Ok(a) => valid.push(a),
                Err(e) => invalid.push((i, e)),
            }
        }

        (valid, invalid)
    }

    /// Counts valid and invalid accounts without collecting results.
    pub fn count_valid<S: AsRef<str>>(&self, accounts: &[S]) -> (usize, usize) {
        let valid = accounts
            .iter()
            .filter(|a| self.validator.validate(a.as_ref(), self.banks))
            .count();
        (valid, accounts.len() - valid)
    }

    /// Validates accounts in parallel using rayon.
    ///
    /// Requires the `parallel` feature.
    #[cfg(feature = "parallel")]
    pub fn validate_parallel<S: AsRef<str> + Sync>(
        &self,
        accounts: &[S],
    ) -> Vec<Result<AccountNumber, ValidationError>> {
        use rayon::prelude::*;
        accounts
            .par_iter()
            .map(|a| self.validator.check(a.as_ref(), self.banks))
            .collect()
    }

    /// Counts valid and invalid accounts in parallel.
    ///
    /// Requires the `parallel` feature.
    #[cfg(feature = "parallel")]
    pub fn count_valid_parallel<S: AsRef<str> + Sync>(&self, accounts: &[S]) -> (usize, usize) {
        use rayon::prelude::*;
        let valid = accounts
            .par_iter()
            .filter(|a| self.validator.validate(a.as_ref(), self.banks))
            .count();
        (valid, accounts.len() - valid)
    }
}

/// Validates a slice of accounts against `banks` with default settings.
#[inline]
pub fn validate_batch<L, S>(banks: &L, accounts: &[S]) -> Vec<Result<AccountNumber, ValidationError>>
where
    L: BankLookup + ?Sized,
    S: AsRef<str>,
{
    BatchValidator::new(banks).validate_all(accounts)
}

/// Counts `(valid, invalid)` accounts against `banks` with default settings.
///
/// ```
/// use norwegian_banks::batch::count_valid;
/// use norwegian_banks::bank::BankTable;
///
/// let mut banks = BankTable::new();
/// banks.insert("6105", "NDEANOKK", "Nordea Bank Abp, filial i Norge");
///
/// assert_eq!(count_valid(&banks, &["61050659274", "6105", "61050659275"]), (1, 2));
/// ```
#[inline]
pub fn count_valid<L, S>(banks: &L, accounts: &[S]) -> (usize, usize)
where
    L: BankLookup + ?Sized,
    S: AsRef<str>,
{
    BatchValidator::new(banks).count_valid(accounts)
}
