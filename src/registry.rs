//! The query-facing bank registry.
//!
//! Building a [`BankRegistry`] refreshes the local copy of the bank table if
//! it is older than its TTL, then loads the parsed table from the persistent
//! cache or parses the file. Once built, the registry is an immutable snapshot
//! and can be shared between threads without locking. Refreshing means
//! building a new registry.
//!
//! # Example
//!
//! ```
//! use norwegian_banks::bank::BankTable;
//! use norwegian_banks::{BankRegistry, RegistryConfig};
//!
//! let mut table = BankTable::new();
//! table.insert("1594", "DNBANOKK", "DNB Bank ASA");
//! let registry = BankRegistry::from_table(table, RegistryConfig::default());
//!
//! assert_eq!(registry.bank_code_for_prefix("1594"), Some("DNBANOKK"));
//! assert!(registry.validate("1594 22 87248"));
//! assert_eq!(registry.format_account_number("15942287248"), "1594.22.87248");
//! ```

use crate::account::AccountNumber;
use crate::bank::cache::cache_key;
use crate::bank::{BankLookup, BankRecord, BankTable, SourceFetcher, Transport};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, ValidationError};
use crate::format::format_with_delimiter;
use crate::validate::AccountValidator;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{debug, info, warn};

type LockMap = Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

static CONSTRUCTION_LOCKS: OnceLock<LockMap> = OnceLock::new();

/// Returns the lock serializing registry construction for a source file.
fn construction_lock(source: &Path) -> Arc<Mutex<()>> {
    let locks = CONSTRUCTION_LOCKS.get_or_init(LockMap::default);
    let mut locks = locks.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(source.to_path_buf()).or_default())
}

/// Bank table snapshot with lookup and validation operations.
#[derive(Debug, Clone)]
pub struct BankRegistry {
    table: BankTable,
    config: RegistryConfig,
}

impl BankRegistry {
    /// Builds a registry with the default configuration over HTTP.
    ///
    /// Requires the `http` feature.
    ///
    /// # Errors
    ///
    /// See [`BankRegistry::with_transport`].
    #[cfg(feature = "http")]
    pub fn open() -> Result<Self, RegistryError> {
        Self::with_config(RegistryConfig::default())
    }

    /// Builds a registry with the given configuration over HTTP.
    ///
    /// Requires the `http` feature.
    ///
    /// # Errors
    ///
    /// See [`BankRegistry::with_transport`].
    #[cfg(feature = "http")]
    pub fn with_config(config: RegistryConfig) -> Result<Self, RegistryError> {
        let transport =
            crate::bank::HttpTransport::new(config.request_timeout, config.max_body_bytes);
        Self::with_transport(config, &transport)
    }

    /// Builds a registry, fetching the table through `transport`.
    ///
    /// A downloaded table must parse before it replaces the local copy. A
    /// failed refresh is logged and ignored when a local copy of the table
    /// exists, even a stale one. Construction for the same source file is
    /// serialized within the process.
    ///
    /// # Errors
    ///
    /// - `Network` if the table cannot be fetched and there is no local copy
    /// - `Io` if the local copy cannot be inspected
    /// - `Parse` if the table cannot be decoded or holds no rows
    pub fn with_transport(
        config: RegistryConfig,
        transport: &dyn Transport,
    ) -> Result<Self, RegistryError> {
        let source = config.source_path();
        let lock = construction_lock(&source);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let parser = config.parser();
        let parses = |body: &[u8]| parser.parse_bytes(body.to_vec()).map(drop);

        match SourceFetcher::new(transport).with_check(&parses).ensure_fresh(
            &source,
            &config.source_url,
            config.source_ttl,
        ) {
            Ok(outcome) => debug!(?outcome, path = %source.display(), "bank table source checked"),
            Err(e) if source.is_file() => {
                warn!(error = %e, path = %source.display(), "refresh failed, using local bank table");
            }
            Err(e) => return Err(e),
        }

        let modified = fs::metadata(&source)
            .and_then(|meta| meta.modified())
            .map_err(|e| RegistryError::io(&source, e))?;

        let table = config
            .cache()
            .get_or_build(cache_key(modified), config.cache_ttl, || {
                parser.parse(&source)
            })?;

        info!(
            prefixes = table.len(),
            banks = table.bank_count(),
            "bank registry ready"
        );
        Ok(Self { table, config })
    }

    /// Wraps an already parsed table. Performs no I/O.
    pub fn from_table(table: BankTable, config: RegistryConfig) -> Self {
        Self { table, config }
    }

    /// Returns the configuration this registry was built with.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Returns the underlying table.
    pub fn table(&self) -> &BankTable {
        &self.table
    }

    /// Returns the bank code owning an exact 4-digit prefix.
    pub fn bank_code_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.table.bank_code_for_prefix(prefix)
    }

    /// Returns the bank owning an account number.
    ///
    /// Separators are stripped before the prefix is taken.
    pub fn bank_for_account_number(&self, account: &str) -> Option<&BankRecord> {
        self.table.bank_for_account_number(account)
    }

    /// Returns the record for a bank code.
    pub fn bank(&self, bank_code: &str) -> Option<&BankRecord> {
        self.table.bank(bank_code)
    }

    /// Returns every known prefix in table order.
    pub fn all_prefixes(&self) -> Vec<&str> {
        self.table.prefixes().collect()
    }

    /// Returns all banks in table order.
    pub fn all_banks(&self) -> &[BankRecord] {
        self.table.banks()
    }

    /// Returns all banks keyed by bank code.
    pub fn banks_by_code(&self) -> HashMap<&str, &BankRecord> {
        self.table
            .banks()
            .iter()
            .map(|bank| (bank.bank_code.as_str(), bank))
            .collect()
    }

    /// Returns the validator configured for this registry.
    pub fn validator(&self) -> AccountValidator {
        AccountValidator::new()
            .algorithm(self.config.checksum)
            .check_bank_prefix(self.config.check_bank_prefix)
    }

    /// Validates an account number using the configured prefix check.
    ///
    /// `Profile::Current` requires the prefix to belong to a known bank.
    pub fn validate(&self, account: &str) -> bool {
        self.validator().validate(account, &self.table)
    }

    /// Validates an account number with an explicit prefix check setting.
    pub fn validate_with(&self, account: &str, check_bank_prefix: bool) -> bool {
        self.validator()
            .check_bank_prefix(check_bank_prefix)
            .validate(account, &self.table)
    }

    /// Validates an account number, reporting why it failed.
    pub fn check(&self, account: &str) -> Result<AccountNumber, ValidationError> {
        self.validator().check(account, &self.table)
    }

    /// Formats an account number as `XXXX.XX.XXXXX`.
    ///
    /// Does not consult the table.
    pub fn format_account_number(&self, account: &str) -> String {
        crate::format::format_account_number(account)
    }

    /// Formats an account number with a custom delimiter.
    pub fn format_account_number_with(&self, account: &str, delimiter: &str) -> String {
        format_with_delimiter(account, delimiter)
    }
}

impl BankLookup for BankRegistry {
    fn bank_code_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.table.bank_code_for_prefix(prefix)
    }

    fn bank(&self, bank_code: &str) -> Option<&BankRecord> {
        self.table.bank(bank_code)
    }

    fn len(&self) -> usize {
        self.table.len()
    }
}
