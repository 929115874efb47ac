//! Registry configuration and the published table variants.
//!
//! Two variants of the upstream table exist. They differ in file format,
//! in how rows without a bank code are treated, and in which checksum routine
//! their consumers used. [`Profile`] names them; [`RegistryConfig`] holds the
//! resolved settings and can be adjusted field by field.
//!
//! # Example
//!
//! ```
//! use norwegian_banks::{Profile, RegistryConfig};
//! use std::time::Duration;
//!
//! let config = RegistryConfig::default()
//!     .with_cache_dir("/var/cache/myapp")
//!     .with_source_ttl(Duration::from_secs(3600));
//! assert_eq!(config.profile, Profile::Current);
//! assert!(config.source_path().ends_with(".cache-norwegianbanks-norwegian-iban-bic-table.xlsx"));
//! ```

use crate::bank::cache::cache_key;
use crate::bank::{MissingBankCode, ParsePolicy, RegistryCache, SourceFormat, TableParser};
use crate::mod11::ChecksumAlgorithm;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// Where the bank table is published.
pub const DEFAULT_SOURCE_URL: &str = "https://www.bits.no/document/iban/";

/// Default timeout for downloading the bank table.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default cap on the downloaded table size.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

const DAY: Duration = Duration::from_secs(86_400);
const LEGACY_TTL: Duration = Duration::from_secs(1_440);

/// Named presets for the known table variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Profile {
    /// XLSX table; rows without a BIC are kept under `n/a`; inline weighted
    /// checksum; daily refresh.
    #[default]
    Current,
    /// XLS table; rows without a BIC are dropped; generic modulus 11
    /// checksum; 24 minute refresh.
    Legacy,
}

impl Profile {
    /// Returns the configuration for this profile.
    pub fn config(self) -> RegistryConfig {
        let base = RegistryConfig {
            profile: self,
            cache_dir: std::env::temp_dir(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            source_file_name: String::new(),
            source_ttl: DAY,
            cache_ttl: DAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            parse_policy: ParsePolicy::default(),
            source_format: SourceFormat::Spreadsheet,
            checksum: ChecksumAlgorithm::Weighted,
            check_bank_prefix: true,
        };

        match self {
            Self::Current => RegistryConfig {
                source_file_name: ".cache-norwegianbanks-norwegian-iban-bic-table.xlsx".to_string(),
                ..base
            },
            Self::Legacy => RegistryConfig {
                source_file_name: ".cache-norwegianbanks-norwegian-iban-bic-table.xls".to_string(),
                source_ttl: LEGACY_TTL,
                cache_ttl: LEGACY_TTL,
                parse_policy: ParsePolicy::default().missing_bank_code(MissingBankCode::Skip),
                checksum: ChecksumAlgorithm::Modulus11,
                ..base
            },
        }
    }
}

/// Settings for building a [`crate::BankRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Preset these settings started from.
    pub profile: Profile,
    /// Directory holding the downloaded table and the parse cache.
    pub cache_dir: PathBuf,
    /// URL of the published table.
    pub source_url: String,
    /// File name of the local copy inside `cache_dir`.
    pub source_file_name: String,
    /// Age after which the local copy is revalidated.
    pub source_ttl: Duration,
    /// Lifetime of parse cache entries.
    pub cache_ttl: Duration,
    /// Timeout for the whole download.
    pub request_timeout: Duration,
    /// Largest accepted download.
    pub max_body_bytes: u64,
    /// Header and missing bank code handling.
    pub parse_policy: ParsePolicy,
    /// Encoding of the table file.
    pub source_format: SourceFormat,
    /// Check digit routine.
    pub checksum: ChecksumAlgorithm,
    /// Whether validation also requires a known bank prefix by default.
    pub check_bank_prefix: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Profile::Current.config()
    }
}

impl RegistryConfig {
    /// Path of the local copy of the table.
    pub fn source_path(&self) -> PathBuf {
        self.cache_dir.join(&self.source_file_name)
    }

    /// Parse cache rooted in `cache_dir`, namespaced by the source file name.
    pub fn cache(&self) -> RegistryCache {
        let name = self.source_file_name.trim_start_matches('.');
        let name = name.strip_prefix("cache-norwegianbanks-").unwrap_or(name);
        RegistryCache::new(&self.cache_dir, name)
    }

    /// Cache directory used for a source file modified at `modified`.
    pub fn cache_dir_for(&self, modified: SystemTime) -> PathBuf {
        self.cache().dir_for(cache_key(modified))
    }

    /// Parser configured with this policy and format.
    pub fn parser(&self) -> TableParser {
        TableParser::new(self.parse_policy.clone()).with_format(self.source_format)
    }

    /// Builder method to set the cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Builder method to set the source URL.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    /// Builder method to set the local file name.
    pub fn with_source_file_name(mut self, name: impl Into<String>) -> Self {
        self.source_file_name = name.into();
        self
    }

    /// Builder method to set the refresh interval of the local copy.
    pub fn with_source_ttl(mut self, ttl: Duration) -> Self {
        self.source_ttl = ttl;
        self
    }

    /// Builder method to set the parse cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Builder method to set the download timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builder method to set the parse policy.
    pub fn with_parse_policy(mut self, policy: ParsePolicy) -> Self {
        self.parse_policy = policy;
        self
    }

    /// Builder method to set the table file format.
    pub fn with_source_format(mut self, format: SourceFormat) -> Self {
        self.source_format = format;
        self
    }

    /// Builder method to set the checksum algorithm.
    pub fn with_checksum(mut self, checksum: ChecksumAlgorithm) -> Self {
        self.checksum = checksum;
        self
    }

    /// Builder method to set the default bank prefix check.
    pub fn with_check_bank_prefix(mut self, check: bool) -> Self {
        self.check_bank_prefix = check;
        self
    }
}
