//! # norwegian_banks
//!
//! Resolve Norwegian bank account numbers to their banks and validate their
//! check digits.
//!
//! ## Features
//!
//! - Modulus 11 check digit validation, with the Norwegian zero remainder rule
//! - Bank lookup by 4-digit account prefix
//! - Bank table downloaded from the published IBAN/BIC spreadsheet, refreshed
//!   with conditional requests and cached on disk between runs
//! - Account number formatting (`XXXX.XX.XXXXX`)
//! - Batch validation and test number generation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use norwegian_banks::BankRegistry;
//!
//! let registry = BankRegistry::open()?;
//!
//! assert!(registry.validate("1594.22.87248"));
//! let bank = registry.bank_for_account_number("1594 22 87248").unwrap();
//! assert_eq!(bank.bank_code, "DNBANOKK");
//! assert_eq!(registry.format_account_number("15942287248"), "1594.22.87248");
//! # Ok::<(), norwegian_banks::RegistryError>(())
//! ```
//!
//! ## Checksum Only
//!
//! No bank table is needed to check the digits themselves:
//!
//! ```rust
//! use norwegian_banks::{format, passes_checksum, validate_checksum, ValidationError};
//!
//! assert!(passes_checksum("6105.06.59274"));
//!
//! let account = validate_checksum("3000 27 79419").unwrap();
//! assert_eq!(account.prefix(), "3000");
//! assert_eq!(account.to_string(), "3000.27.79419");
//!
//! assert_eq!(
//!     validate_checksum("3000.27.7941"),
//!     Err(ValidationError::WrongLength { length: 10, expected: 11 })
//! );
//!
//! assert_eq!(format::format_with_delimiter("12345678903", " "), "1234 56 78903");
//! ```
//!
//! ## Configuration
//!
//! ```rust,no_run
//! use norwegian_banks::{BankRegistry, Profile, RegistryConfig};
//! use std::time::Duration;
//!
//! let config = RegistryConfig::default()
//!     .with_cache_dir("/var/cache/myapp")
//!     .with_source_ttl(Duration::from_secs(6 * 3600))
//!     .with_check_bank_prefix(false);
//! let registry = BankRegistry::with_config(config)?;
//!
//! // Older XLS table variant
//! let legacy = BankRegistry::with_config(Profile::Legacy.config())?;
//! # Ok::<(), norwegian_banks::RegistryError>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `http` | Download the table with `ureq` (default) |
//! | `source-csv` | Read the table from CSV |
//! | `parallel` | Rayon-based batch validation |
//! | `generate` | Random test number generation |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod account;
pub mod bank;
pub mod batch;
pub mod config;
pub mod error;
pub mod format;
pub mod generate;
pub mod mod11;
#[cfg(feature = "http")]
pub mod quick;
pub mod registry;
pub mod validate;

// Re-export main types at crate root
pub use account::AccountNumber;
pub use bank::{BankLookup, BankRecord, BankTable};
pub use batch::BatchValidator;
pub use config::{Profile, RegistryConfig};
pub use error::{ErrorKind, RegistryError, ValidationError};
pub use format::{format_account_number, format_with_delimiter};
pub use mod11::ChecksumAlgorithm;
pub use registry::BankRegistry;
pub use validate::{passes_checksum, validate_checksum, AccountValidator};
