//! Bank table: which bank owns which account number prefix.
//!
//! The table is published as a spreadsheet with one row per 4-digit prefix,
//! giving the bank's BIC and name. [`parser`] turns it into a [`BankTable`],
//! [`cache`] persists parsed tables keyed by the source file's modification
//! time, and [`fetch`] keeps the local copy of the spreadsheet fresh.
//!
//! # Example
//!
//! ```
//! use norwegian_banks::bank::{BankLookup, BankTable};
//!
//! let mut table = BankTable::new();
//! table.insert("1594", "DNBANOKK", "DNB Bank ASA");
//! table.insert("1503", "DNBANOKK", "DNB Bank ASA");
//!
//! assert_eq!(table.bank_code_for_prefix("1594"), Some("DNBANOKK"));
//! let bank = table.bank_for_account_number("1503.12.34567").unwrap();
//! assert_eq!(bank.prefixes, vec!["1594", "1503"]);
//! ```

pub mod cache;
pub mod fetch;
pub mod parser;

pub use cache::{CacheEntry, RegistryCache};
pub use fetch::{BodyCheck, FetchOutcome, SourceFetcher, Transport, TransportResponse};
pub use parser::{HeaderRow, MissingBankCode, ParsePolicy, RawRow, SourceFormat, TableParser};

#[cfg(feature = "http")]
pub use fetch::HttpTransport;

use crate::account::PREFIX_DIGITS;
use crate::format::strip_formatting;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Anything that can resolve account prefixes to banks.
///
/// Implemented by [`BankTable`] and [`crate::BankRegistry`]. Misses are
/// `None`, never errors.
pub trait BankLookup: Send + Sync {
    /// Returns the bank code owning an exact 4-digit prefix.
    fn bank_code_for_prefix(&self, prefix: &str) -> Option<&str>;

    /// Returns the bank record for a bank code.
    fn bank(&self, bank_code: &str) -> Option<&BankRecord>;

    /// Returns the number of known prefixes.
    fn len(&self) -> usize;

    /// Returns true if no prefixes are known.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bank owning an exact 4-digit prefix.
    fn bank_for_prefix(&self, prefix: &str) -> Option<&BankRecord> {
        self.bank(self.bank_code_for_prefix(prefix)?)
    }

    /// Returns the bank owning an account number.
    ///
    /// Separators are stripped before the first 4 digits are taken, so
    /// `1594 22 87248` and `1594.22.87248` resolve the same way.
    fn bank_for_account_number(&self, account: &str) -> Option<&BankRecord> {
        let digits = strip_formatting(account);
        let prefix = digits.get(..PREFIX_DIGITS)?;
        self.bank_for_prefix(prefix)
    }
}

/// A bank and the prefixes assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankRecord {
    /// Bank identifier, normally the 8-character BIC.
    pub bank_code: String,
    /// Bank name as published in the table.
    pub bank_name: String,
    /// Prefixes owned by this bank, in table order.
    pub prefixes: Vec<String>,
}

impl BankRecord {
    /// Creates a record with no prefixes.
    pub fn new(bank_code: impl Into<String>, bank_name: impl Into<String>) -> Self {
        Self {
            bank_code: bank_code.into(),
            bank_name: bank_name.into(),
            prefixes: Vec::new(),
        }
    }

    /// Builder method to append a prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }
}

/// Parsed bank table: bank records plus the prefix index.
///
/// Banks are kept in the order they first appear in the source table, and
/// each bank's prefixes in row order. Every prefix in the index appears in
/// exactly one record's `prefixes`, and that record's code is the one the
/// index maps it to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankTable {
    banks: Vec<BankRecord>,
    bank_index: HashMap<String, usize>,
    prefix_index: HashMap<String, String>,
    prefix_order: Vec<String>,
}

impl BankTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `prefix` belongs to `bank_code`.
    ///
    /// The first row seen for a bank code creates its record and fixes its
    /// name. If the prefix was already assigned to another bank, the later
    /// row wins and the prefix moves to the new bank's record.
    pub fn insert(&mut self, prefix: &str, bank_code: &str, bank_name: &str) {
        match self.prefix_index.get(prefix) {
            Some(previous) if previous == bank_code => return,
            Some(previous) => {
                warn!(
                    prefix,
                    previous = previous.as_str(),
                    bank_code,
                    "prefix listed for two banks, keeping the later row"
                );
                if let Some(&idx) = self.bank_index.get(previous) {
                    self.banks[idx].prefixes.retain(|p| p != prefix);
                }
            }
            None => self.prefix_order.push(prefix.to_string()),
        }

        self.prefix_index
            .insert(prefix.to_string(), bank_code.to_string());

        match self.bank_index.get(bank_code) {
            Some(&idx) => self.banks[idx].prefixes.push(prefix.to_string()),
            None => {
                self.bank_index
                    .insert(bank_code.to_string(), self.banks.len());
                self.banks
                    .push(BankRecord::new(bank_code, bank_name).prefix(prefix));
            }
        }
    }

    /// Rebuilds a table from its persisted parts.
    ///
    /// Fails if the prefix pairs and the records disagree.
    pub fn from_parts(
        banks: Vec<BankRecord>,
        prefix_to_bank_code: Vec<(String, String)>,
    ) -> Result<Self, String> {
        let mut bank_index = HashMap::with_capacity(banks.len());
        for (i, bank) in banks.iter().enumerate() {
            if bank_index.insert(bank.bank_code.clone(), i).is_some() {
                return Err(format!("duplicate bank code {}", bank.bank_code));
            }
        }

        let listed: usize = banks.iter().map(|b| b.prefixes.len()).sum();
        if listed != prefix_to_bank_code.len() {
            return Err(format!(
                "{} prefixes listed on banks but {} in the index",
                listed,
                prefix_to_bank_code.len()
            ));
        }

        let mut prefix_index = HashMap::with_capacity(prefix_to_bank_code.len());
        let mut prefix_order = Vec::with_capacity(prefix_to_bank_code.len());
        for (prefix, code) in prefix_to_bank_code {
            let owns = bank_index
                .get(&code)
                .is_some_and(|&i| banks[i].prefixes.contains(&prefix));
            if !owns {
                return Err(format!("prefix {} not listed on bank {}", prefix, code));
            }
            if prefix_index.insert(prefix.clone(), code).is_some() {
                return Err(format!("duplicate prefix {}", prefix));
            }
            prefix_order.push(prefix);
        }

        Ok(Self {
            banks,
            bank_index,
            prefix_index,
            prefix_order,
        })
    }

    /// Returns the prefix index as ordered `(prefix, bank_code)` pairs.
    pub fn prefix_pairs(&self) -> Vec<(String, String)> {
        self.prefix_order
            .iter()
            .map(|p| (p.clone(), self.prefix_index[p].clone()))
            .collect()
    }

    /// Returns all bank records in table order.
    pub fn banks(&self) -> &[BankRecord] {
        &self.banks
    }

    /// Returns every known prefix in first-seen order.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> + '_ {
        self.prefix_order.iter().map(String::as_str)
    }

    /// Returns the number of distinct banks.
    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }
}

impl BankLookup for BankTable {
    fn bank_code_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.prefix_index.get(prefix).map(String::as_str)
    }

    fn bank(&self, bank_code: &str) -> Option<&BankRecord> {
        self.bank_index.get(bank_code).map(|&i| &self.banks[i])
    }

    fn len(&self) -> usize {
        self.prefix_index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> BankTable {
        let mut table = BankTable::new();
        table.insert("1200", "DNBANOKK", "DNB Bank ASA");
        table.insert("6105", "NDEANOKK", "Nordea Bank Abp, filial i Norge");
        table.insert("1594", "DNBANOKK", "DNB Bank ASA");
        table.insert("3000", "SPSONO22", "SpareBank 1 Sørøst-Norge");
        table
    }

    #[test]
    fn test_prefix_lookup() {
        let table = sample_table();
        assert_eq!(table.bank_code_for_prefix("1594"), Some("DNBANOKK"));
        assert_eq!(table.bank_code_for_prefix("0000"), None);
        assert_eq!(table.bank_code_for_prefix("159"), None);
    }

    #[test]
    fn test_bank_order_follows_rows() {
        let table = sample_table();
        let codes: Vec<_> = table.banks().iter().map(|b| b.bank_code.as_str()).collect();
        assert_eq!(codes, vec!["DNBANOKK", "NDEANOKK", "SPSONO22"]);
        assert_eq!(table.bank("DNBANOKK").unwrap().prefixes, vec!["1200", "1594"]);
    }

    #[test]
    fn test_prefix_order_follows_rows() {
        let table = sample_table();
        let prefixes: Vec<_> = table.prefixes().collect();
        assert_eq!(prefixes, vec!["1200", "6105", "1594", "3000"]);
    }

    #[test]
    fn test_bank_for_account_number_strips_separators() {
        let table = sample_table();
        assert_eq!(
            table.bank_for_account_number("1594 22 87248").unwrap().bank_code,
            "DNBANOKK"
        );
        assert_eq!(
            table.bank_for_account_number("3000.27.79419").unwrap().bank_code,
            "SPSONO22"
        );
        assert!(table.bank_for_account_number("12").is_none());
        assert!(table.bank_for_account_number("1234.56.78903").is_none());
    }

    #[test]
    fn test_duplicate_prefix_same_bank() {
        let mut table = sample_table();
        table.insert("1594", "DNBANOKK", "DNB Bank ASA");
        assert_eq!(table.bank("DNBANOKK").unwrap().prefixes, vec!["1200", "1594"]);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_duplicate_prefix_moves_to_later_bank() {
        let mut table = sample_table();
        table.insert("1594", "NDEANOKK", "Nordea Bank Abp, filial i Norge");

        assert_eq!(table.bank_code_for_prefix("1594"), Some("NDEANOKK"));
        assert_eq!(table.bank("DNBANOKK").unwrap().prefixes, vec!["1200"]);
        assert_eq!(table.bank("NDEANOKK").unwrap().prefixes, vec!["6105", "1594"]);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_round_trip_prefixes() {
        let table = sample_table();
        for bank in table.banks() {
            for prefix in &bank.prefixes {
                assert_eq!(table.bank_code_for_prefix(prefix), Some(bank.bank_code.as_str()));
            }
        }
    }

    #[test]
    fn test_from_parts_round_trip() {
        let table = sample_table();
        let rebuilt = BankTable::from_parts(table.banks().to_vec(), table.prefix_pairs()).unwrap();
        assert_eq!(rebuilt, table);
    }

    #[test]
    fn test_from_parts_rejects_inconsistent_index() {
        let table = sample_table();
        let mut pairs = table.prefix_pairs();
        pairs[0].1 = "NDEANOKK".to_string();
        assert!(BankTable::from_parts(table.banks().to_vec(), pairs).is_err());

        let mut pairs = table.prefix_pairs();
        pairs.pop();
        assert!(BankTable::from_parts(table.banks().to_vec(), pairs).is_err());
    }

    #[test]
    fn test_bank_record_builder() {
        let record = BankRecord::new("DNBANOKK", "DNB Bank ASA").prefix("1594");
        assert_eq!(record.prefixes, vec!["1594"]);
    }

    #[test]
    fn test_empty_table() {
        let table = BankTable::new();
        assert!(table.is_empty());
        assert_eq!(table.bank_count(), 0);
    }
}
