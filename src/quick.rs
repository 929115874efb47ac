//! One-shot helpers that build a registry per call.
//!
//! Every function except [`format_account_number`] constructs a
//! [`BankRegistry`] with the default configuration, answers the question and
//! drops it. Construction stats the local table, may hit the network once the
//! local copy is older than a day and reads the parse cache from disk. That is
//! fine for scripts and one-off checks. Anything validating more than a
//! handful of numbers should build a [`BankRegistry`] once and reuse it.
//!
//! Requires the `http` feature.
//!
//! ```no_run
//! use norwegian_banks::quick;
//!
//! if quick::validate("1594.22.87248")? {
//!     let bank = quick::bank_for_account_number("1594.22.87248")?;
//!     println!("{:?}", bank.map(|b| b.bank_name));
//! }
//! # Ok::<(), norwegian_banks::RegistryError>(())
//! ```

use crate::bank::BankRecord;
use crate::error::RegistryError;
use crate::registry::BankRegistry;

/// Returns the bank code owning a 4-digit prefix.
///
/// # Errors
///
/// Fails if the registry cannot be built.
pub fn bank_code_for_prefix(prefix: &str) -> Result<Option<String>, RegistryError> {
    let registry = BankRegistry::open()?;
    Ok(registry.bank_code_for_prefix(prefix).map(str::to_string))
}

/// Returns the bank owning an account number.
///
/// # Errors
///
/// Fails if the registry cannot be built.
pub fn bank_for_account_number(account: &str) -> Result<Option<BankRecord>, RegistryError> {
    let registry = BankRegistry::open()?;
    Ok(registry.bank_for_account_number(account).cloned())
}

/// Validates an account number, checksum and bank prefix.
///
/// # Errors
///
/// Fails if the registry cannot be built. An invalid number is `Ok(false)`.
pub fn validate(account: &str) -> Result<bool, RegistryError> {
    Ok(BankRegistry::open()?.validate(account))
}

/// Returns every known prefix.
///
/// # Errors
///
/// Fails if the registry cannot be built.
pub fn all_prefixes() -> Result<Vec<String>, RegistryError> {
    let registry = BankRegistry::open()?;
    Ok(registry
        .all_prefixes()
        .into_iter()
        .map(str::to_string)
        .collect())
}

/// Returns every known bank.
///
/// # Errors
///
/// Fails if the registry cannot be built.
pub fn all_banks() -> Result<Vec<BankRecord>, RegistryError> {
    Ok(BankRegistry::open()?.all_banks().to_vec())
}

/// Formats an account number as `XXXX.XX.XXXXX`. Performs no I/O.
///
/// ```
/// assert_eq!(
///     norwegian_banks::quick::format_account_number("12345678903"),
///     "1234.56.78903"
/// );
/// ```
pub fn format_account_number(account: &str) -> String {
    crate::format::format_account_number(account)
}
